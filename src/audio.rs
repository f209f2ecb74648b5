//! Audio system using Web Audio API
//!
//! Procedurally generated cues - no external files needed!

use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use crate::platform::{AudioCues, hit_pitch_rate};
use crate::settings::Settings;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SoundEffect {
    /// Target hit; pitch follows the combo
    Hit { rate: f32 },
    /// Life lost (mistake or harm target)
    LifeLost,
    /// Life gained (heal target, continue, new run)
    LifeGained,
}

/// Audio manager for the game
pub struct AudioManager {
    ctx: Option<AudioContext>,
    volume: f32,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl AudioManager {
    pub fn new(settings: &Settings) -> Self {
        Self {
            ctx: None,
            volume: settings.effective_volume(),
        }
    }

    /// Pick up volume/mute changes
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.volume = settings.effective_volume();
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    /// Play a sound effect
    pub fn play(&self, effect: SoundEffect) {
        let vol = self.volume;
        if vol <= 0.0 {
            return;
        }

        let Some(ctx) = &self.ctx else { return };

        // Resume context if suspended (browsers require user gesture)
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        match effect {
            SoundEffect::Hit { rate } => self.play_hit(ctx, vol, rate),
            SoundEffect::LifeLost => self.play_life_lost(ctx, vol),
            SoundEffect::LifeGained => self.play_life_gained(ctx, vol),
        }
    }

    // === Sound generators ===

    /// Create an oscillator with gain envelope
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// Hit - short bonk, pitched up by the combo
    fn play_hit(&self, ctx: &AudioContext, vol: f32, rate: f32) {
        let base = 330.0 * rate;
        let Some((osc, gain)) = self.create_osc(ctx, base, OscillatorType::Triangle) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.5, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.12)
            .ok();
        osc.frequency().set_value_at_time(base * 1.5, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(base, t + 0.05)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.15).ok();
    }

    /// Life lost - falling buzz
    fn play_life_lost(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 220.0, OscillatorType::Sawtooth) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.3, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.35)
            .ok();
        osc.frequency().set_value_at_time(220.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(70.0, t + 0.3)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.4).ok();
    }

    /// Life gained - rising two-note chime
    fn play_life_gained(&self, ctx: &AudioContext, vol: f32) {
        let t = ctx.current_time();
        for (i, freq) in [523.25_f32, 783.99].into_iter().enumerate() {
            let Some((osc, gain)) = self.create_osc(ctx, freq, OscillatorType::Sine) else {
                continue;
            };
            let start = t + i as f64 * 0.09;
            gain.gain().set_value_at_time(0.0, t).ok();
            gain.gain().set_value_at_time(vol * 0.4, start).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, start + 0.25)
                .ok();
            osc.start_with_when(start).ok();
            osc.stop_with_when(start + 0.3).ok();
        }
    }
}

impl AudioCues for AudioManager {
    fn init(&mut self) {
        // Try to create audio context (may fail if not in secure context)
        self.ctx = AudioContext::new().ok();
        if self.ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
    }

    fn teardown(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            let _ = ctx.close();
        }
    }

    fn on_hit(&mut self, combo_hits: u32) {
        self.play(SoundEffect::Hit {
            rate: hit_pitch_rate(combo_hits),
        });
    }

    fn on_life_lost(&mut self) {
        self.play(SoundEffect::LifeLost);
    }

    fn on_life_gained(&mut self) {
        self.play(SoundEffect::LifeGained);
    }
}
