//! Difficulty schedule: score to beat duration

use crate::tuning::BeatStep;

/// Beat duration in milliseconds for `score`.
///
/// Picks the first step containing the score, falling back to the last step
/// if the table has a hole.
pub fn beat_duration(score: u64, schedule: &[BeatStep]) -> u32 {
    schedule
        .iter()
        .find(|step| step.contains(score))
        .or_else(|| schedule.last())
        .map(|step| step.beat_ms)
        .unwrap_or(crate::consts::FALLBACK_BEAT_MS)
}
