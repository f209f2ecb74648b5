//! Ad service seam

use super::SignalError;

/// Answer to a continue-reward request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardStatus {
    /// Reward earned; apply the continue now
    Granted,
    /// Player closed the ad early or declined
    Denied,
    /// The host will call `Game::resolve_continue_reward` later
    Pending,
}

/// Rewarded continues and game-over interstitials
pub trait AdService {
    fn init(&mut self) {}
    fn teardown(&mut self) {}
    fn request_continue_reward(&mut self) -> Result<RewardStatus, SignalError>;
    /// Fire-and-forget; called on every Nth game over
    fn notify_game_over_milestone(&mut self) -> Result<(), SignalError>;
}

/// Ad-free build: continues are never rewarded
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAds;

impl AdService for NoAds {
    fn request_continue_reward(&mut self) -> Result<RewardStatus, SignalError> {
        log::info!("Continue requested, but ads are disabled");
        Ok(RewardStatus::Denied)
    }

    fn notify_game_over_milestone(&mut self) -> Result<(), SignalError> {
        log::debug!("Interstitial milestone reached (ads disabled)");
        Ok(())
    }
}
