//! Player preferences
//!
//! Stored as one JSON blob in LocalStorage next to the best score. Unknown or
//! missing fields fall back to defaults. Native builds have no audio, so they
//! run on the defaults.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// 0.0 - 1.0
    pub volume: f32,
    pub muted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            volume: 0.8,
            muted: false,
        }
    }
}

impl Settings {
    pub const STORAGE_KEY: &'static str = "wacky_mole_settings";

    /// Gain applied to every cue
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume.clamp(0.0, 1.0)
        }
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    /// Parse a stored blob; garbage yields `None`
    pub fn from_json(json: &str) -> Option<Self> {
        match serde_json::from_str(json) {
            Ok(settings) => Some(settings),
            Err(e) => {
                log::warn!("Discarding stored settings: {e}");
                None
            }
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window().and_then(|w| w.local_storage().ok().flatten())
    }

    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let stored = Self::storage()
            .and_then(|s| s.get_item(Self::STORAGE_KEY).ok().flatten())
            .and_then(|json| Self::from_json(&json));
        stored.unwrap_or_default()
    }

    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let Some(storage) = Self::storage() else {
            log::warn!("LocalStorage unavailable, settings not saved");
            return;
        };
        match serde_json::to_string(self) {
            Ok(json) => {
                if storage.set_item(Self::STORAGE_KEY, &json).is_err() {
                    log::warn!("Settings write rejected");
                }
            }
            Err(e) => log::warn!("Failed to encode settings: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_volume() {
        let mut settings = Settings::default();
        assert!((settings.effective_volume() - 0.8).abs() < 1e-6);
        settings.volume = 3.0;
        assert_eq!(settings.effective_volume(), 1.0);
        settings.toggle_mute();
        assert_eq!(settings.effective_volume(), 0.0);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings = Settings::from_json(r#"{ "muted": true }"#).expect("json");
        assert!(settings.muted);
        assert_eq!(settings.volume, 0.8);
        assert_eq!(Settings::from_json("nope"), None);
    }
}
