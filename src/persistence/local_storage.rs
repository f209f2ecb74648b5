//! Browser LocalStorage backend (wasm32 only)

use super::{BEST_SCORE_KEY, ScoreStore, StorageError, parse_score};

/// Best score kept under [`BEST_SCORE_KEY`] as a decimal string
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorageStore;

impl LocalStorageStore {
    pub fn new() -> Self {
        Self
    }

    fn storage() -> Result<web_sys::Storage, StorageError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or(StorageError::Unavailable)
    }
}

impl ScoreStore for LocalStorageStore {
    fn load_best_score(&mut self) -> Result<Option<u64>, StorageError> {
        let storage = Self::storage()?;
        let raw = storage
            .get_item(BEST_SCORE_KEY)
            .map_err(|_| StorageError::Unavailable)?;
        let score = raw.as_deref().and_then(parse_score);
        if let Some(score) = score {
            log::info!("Loaded best score {score}");
        }
        Ok(score)
    }

    fn save_best_score(&mut self, score: u64) -> Result<(), StorageError> {
        let storage = Self::storage()?;
        storage
            .set_item(BEST_SCORE_KEY, &score.to_string())
            .map_err(|e| StorageError::Rejected(format!("{e:?}")))
    }
}
