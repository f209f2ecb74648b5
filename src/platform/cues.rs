//! Audio cue seam

/// Sound notifications; return values are never consumed
pub trait AudioCues {
    fn init(&mut self) {}
    fn teardown(&mut self) {}
    fn on_hit(&mut self, combo_hits: u32);
    fn on_life_lost(&mut self);
    fn on_life_gained(&mut self);
}

/// Playback rate for the hit sound: 0.8x at no combo up to 1.5x at ten hits
pub fn hit_pitch_rate(combo_hits: u32) -> f32 {
    0.8 + (combo_hits.min(10) as f32 / 10.0) * 0.7
}

/// Headless builds
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAudio;

impl AudioCues for SilentAudio {
    fn on_hit(&mut self, _combo_hits: u32) {}
    fn on_life_lost(&mut self) {}
    fn on_life_gained(&mut self) {}
}
