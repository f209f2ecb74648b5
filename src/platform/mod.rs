//! Platform abstraction layer
//!
//! Services the core talks to through one-way signals:
//! - Ads (continue reward, game-over interstitial)
//! - Audio cues
//!
//! Each service has an explicit `init`/`teardown` lifecycle owned by the
//! [`Game`](crate::game::Game) facade; nothing here is process-global.

pub mod ads;
pub mod cues;

pub use ads::{AdService, NoAds, RewardStatus};
pub use cues::{AudioCues, SilentAudio, hit_pitch_rate};

use thiserror::Error;

/// Failure reported by an external signal service
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignalError {
    #[error("service not initialized")]
    NotInitialized,
    #[error("no ad available")]
    NoFill,
    #[error("service failed: {0}")]
    Failed(String),
}
