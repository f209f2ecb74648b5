//! Game facade
//!
//! Owns the simulation and the external services. Hosts feed it a clock and
//! taps; it drains simulation events into audio, storage and ad signals.
//! External failures are logged and dropped here, never propagated into the
//! round cycle.

use serde::{Deserialize, Serialize};

use crate::consts::SLOT_COUNT;
use crate::persistence::ScoreStore;
use crate::platform::{AdService, AudioCues, RewardStatus};
use crate::sim::{
    DriverPhase, GameEvent, GameState, Outcome, SessionState, SlotView, TimerQueue, driver, input,
};
use crate::tuning::{Tuning, TuningError};

/// Host-side delayed notices (kept apart from the driver's cycle timers)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Notice {
    Interstitial,
}

/// What happened to a continue request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContinueResult {
    /// Lives restored and the cycle resumed
    Resumed,
    /// Waiting on the host to call `resolve_continue_reward`
    AwaitingReward,
    /// Reward denied or the ad failed; nothing changed
    Declined,
    /// Not at game over, or out of continues for this run
    Unavailable,
}

/// Read-only view for HUD rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub session: SessionState,
    pub phase: DriverPhase,
    pub slots: [SlotView; SLOT_COUNT],
    pub combo_multiplier: u64,
    pub combo_fraction: f32,
    pub continues_left: u32,
}

/// The playable game: simulation plus injected services
pub struct Game<S: ScoreStore, A: AdService, C: AudioCues> {
    state: GameState,
    store: S,
    ads: A,
    audio: C,
    notices: TimerQueue<Notice>,
    continue_pending: bool,
    services_up: bool,
    now_ms: u64,
}

impl<S: ScoreStore, A: AdService, C: AudioCues> Game<S, A, C> {
    /// Validate tuning, bring services up and load the best score
    pub fn new(
        tuning: Tuning,
        seed: u64,
        store: S,
        ads: A,
        audio: C,
    ) -> Result<Self, TuningError> {
        tuning.validate()?;
        let mut game = Self {
            state: GameState::new(tuning, seed),
            store,
            ads,
            audio,
            notices: TimerQueue::new(),
            continue_pending: false,
            services_up: true,
            now_ms: 0,
        };
        game.ads.init();
        game.audio.init();
        game.load_best_score();
        Ok(game)
    }

    fn load_best_score(&mut self) {
        match self.store.load_best_score() {
            Ok(Some(score)) => self.state.session.load_best_score(score),
            Ok(None) => log::info!("No best score stored yet"),
            Err(e) => log::warn!("Failed to load best score: {e}"),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn session(&self) -> &SessionState {
        &self.state.session
    }

    pub fn tuning(&self) -> &Tuning {
        &self.state.tuning
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ads(&self) -> &A {
        &self.ads
    }

    pub fn audio(&self) -> &C {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut C {
        &mut self.audio
    }

    /// Earliest pending deadline, for hosts that sleep between ticks
    pub fn next_deadline(&self) -> Option<u64> {
        match (self.state.timers.next_due(), self.notices.next_due()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Start a fresh run (also used for "play again")
    pub fn start(&mut self, now_ms: u64) -> bool {
        self.advance(now_ms);
        driver::stop(&mut self.state);
        self.state.round.reset();
        self.state.session.begin_run(&self.state.tuning);
        self.continue_pending = false;
        self.state.push_event(GameEvent::RunStarted);
        // Start cue, also proves audio is unlocked
        self.state.push_event(GameEvent::LifeGained);
        let started = driver::start(&mut self.state, now_ms);
        log::info!(
            "Run started at {}ms (best {}, games played {})",
            now_ms,
            self.state.session.best_score,
            self.state.session.games_played
        );
        self.dispatch_events();
        started
    }

    /// Fire everything due at or before `now_ms`
    pub fn advance(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
        driver::advance(&mut self.state, now_ms);
        while let Some((_, notice)) = self.notices.pop_due(now_ms) {
            match notice {
                Notice::Interstitial => {
                    if let Err(e) = self.ads.notify_game_over_milestone() {
                        log::warn!("Interstitial failed: {e}");
                    }
                }
            }
        }
        self.dispatch_events();
    }

    /// Tap entry point. Timers are brought up to `now_ms` first so the tap
    /// sees the latest completed beat.
    pub fn tap(&mut self, slot: u8, now_ms: u64) -> Outcome {
        self.advance(now_ms);
        let outcome = input::resolve_tap(&mut self.state, slot, now_ms);
        self.dispatch_events();
        outcome
    }

    /// Player chose to continue after game over
    pub fn request_continue(&mut self, now_ms: u64) -> ContinueResult {
        self.advance(now_ms);
        if self.continue_pending || !self.state.session.can_continue(&self.state.tuning) {
            return ContinueResult::Unavailable;
        }
        match self.ads.request_continue_reward() {
            Ok(RewardStatus::Granted) => {
                self.apply_continue(now_ms);
                ContinueResult::Resumed
            }
            Ok(RewardStatus::Pending) => {
                self.continue_pending = true;
                ContinueResult::AwaitingReward
            }
            Ok(RewardStatus::Denied) => ContinueResult::Declined,
            Err(e) => {
                log::warn!("Continue reward failed: {e}");
                ContinueResult::Declined
            }
        }
    }

    /// Deferred answer to a `Pending` reward request
    pub fn resolve_continue_reward(&mut self, granted: bool, now_ms: u64) -> ContinueResult {
        self.advance(now_ms);
        if !self.continue_pending {
            return ContinueResult::Unavailable;
        }
        self.continue_pending = false;
        if !granted {
            return ContinueResult::Declined;
        }
        if !self.state.session.can_continue(&self.state.tuning) {
            return ContinueResult::Unavailable;
        }
        self.apply_continue(now_ms);
        ContinueResult::Resumed
    }

    fn apply_continue(&mut self, now_ms: u64) {
        self.state.session.apply_continue();
        self.state.push_event(GameEvent::ContinueGranted);
        self.state.push_event(GameEvent::LifeGained);
        driver::start(&mut self.state, now_ms);
        log::info!(
            "Continue {} of {} granted at score {}",
            self.state.session.continues_used,
            self.state.tuning.max_continues,
            self.state.session.score
        );
        self.dispatch_events();
    }

    /// Stop the cycle (e.g. the page is going away). Services stay up.
    pub fn stop(&mut self) {
        driver::stop(&mut self.state);
        self.continue_pending = false;
        self.dispatch_events();
    }

    /// Stop everything and release the services
    pub fn shutdown(&mut self) {
        self.stop();
        self.notices.cancel_all();
        self.teardown_services();
    }

    fn teardown_services(&mut self) {
        if self.services_up {
            self.services_up = false;
            self.ads.teardown();
            self.audio.teardown();
        }
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let session = self.state.session.clone();
        let tuning = &self.state.tuning;
        GameSnapshot {
            combo_multiplier: tuning.combo_multiplier(session.combo_hits),
            combo_fraction: session.combo_fraction(tuning),
            continues_left: tuning.max_continues.saturating_sub(session.continues_used),
            phase: self.state.phase,
            slots: self.state.slot_views(),
            session,
        }
    }

    fn dispatch_events(&mut self) {
        for event in self.state.drain_events() {
            match event {
                GameEvent::Hit { combo } => self.audio.on_hit(combo),
                GameEvent::LifeLost => self.audio.on_life_lost(),
                GameEvent::LifeGained => self.audio.on_life_gained(),
                GameEvent::BestScoreRaised { score } => {
                    if let Err(e) = self.store.save_best_score(score) {
                        log::warn!("Failed to save best score {score}: {e}");
                    }
                }
                GameEvent::InterstitialMilestone => {
                    let due = self.now_ms + self.state.tuning.interstitial_delay_ms;
                    self.notices.schedule(due, Notice::Interstitial);
                }
                GameEvent::GameOver { games_played } => {
                    log::debug!("Game over event (games played {games_played})");
                }
                GameEvent::BeatEnded { missed } if missed > 0 => {
                    log::trace!("Beat ended with {missed} missed");
                }
                _ => {}
            }
        }
    }
}

impl<S: ScoreStore, A: AdService, C: AudioCues> Drop for Game<S, A, C> {
    fn drop(&mut self) {
        self.teardown_services();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::persistence::MemoryStore;
    use crate::platform::{NoAds, SignalError, SilentAudio};
    use crate::sim::{ActiveTarget, TargetKind};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Call {
        AdsInit,
        AdsTeardown,
        RewardRequested,
        Interstitial,
        AudioInit,
        AudioTeardown,
        Hit(u32),
        LifeLost,
        LifeGained,
    }

    type Log = Rc<RefCell<Vec<Call>>>;

    struct RecordingAds {
        log: Log,
        reward: Result<RewardStatus, SignalError>,
    }

    impl AdService for RecordingAds {
        fn init(&mut self) {
            self.log.borrow_mut().push(Call::AdsInit);
        }

        fn teardown(&mut self) {
            self.log.borrow_mut().push(Call::AdsTeardown);
        }

        fn request_continue_reward(&mut self) -> Result<RewardStatus, SignalError> {
            self.log.borrow_mut().push(Call::RewardRequested);
            self.reward.clone()
        }

        fn notify_game_over_milestone(&mut self) -> Result<(), SignalError> {
            self.log.borrow_mut().push(Call::Interstitial);
            Ok(())
        }
    }

    struct RecordingAudio {
        log: Log,
    }

    impl AudioCues for RecordingAudio {
        fn init(&mut self) {
            self.log.borrow_mut().push(Call::AudioInit);
        }

        fn teardown(&mut self) {
            self.log.borrow_mut().push(Call::AudioTeardown);
        }

        fn on_hit(&mut self, combo_hits: u32) {
            self.log.borrow_mut().push(Call::Hit(combo_hits));
        }

        fn on_life_lost(&mut self) {
            self.log.borrow_mut().push(Call::LifeLost);
        }

        fn on_life_gained(&mut self) {
            self.log.borrow_mut().push(Call::LifeGained);
        }
    }

    type TestGame = Game<MemoryStore, RecordingAds, RecordingAudio>;

    fn game_with(
        store: MemoryStore,
        reward: Result<RewardStatus, SignalError>,
    ) -> (TestGame, Log) {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let ads = RecordingAds {
            log: log.clone(),
            reward,
        };
        let audio = RecordingAudio { log: log.clone() };
        let game =
            Game::new(Tuning::default(), 3, store, ads, audio).expect("default tuning");
        (game, log)
    }

    fn count(log: &Log, call: Call) -> usize {
        log.borrow().iter().filter(|c| **c == call).count()
    }

    fn plant(game: &mut TestGame, targets: &[(u8, TargetKind, bool)]) {
        game.state.round.targets = targets
            .iter()
            .map(|&(slot, kind, safe_to_hit)| ActiveTarget {
                slot,
                kind,
                safe_to_hit,
                spawned_at_ms: 0,
            })
            .collect();
        game.state.round.consumed.clear();
    }

    fn empty_slot(game: &TestGame) -> u8 {
        (0..SLOT_COUNT as u8)
            .find(|&s| game.state.round.target(s).is_none())
            .expect("grid has a free slot")
    }

    /// Tap empty slots at `now_ms` until the run is over
    fn lose_run(game: &mut TestGame, now_ms: u64) {
        for _ in 0..10 {
            if game.session().game_over {
                return;
            }
            let slot = empty_slot(game);
            assert!(game.tap(slot, now_ms).is_mistake());
        }
        assert!(game.session().game_over);
    }

    #[test]
    fn test_new_inits_services_and_loads_best() {
        let (game, log) = game_with(MemoryStore::with_score(40), Ok(RewardStatus::Denied));
        assert_eq!(game.session().best_score, 40);
        assert_eq!(*log.borrow(), vec![Call::AdsInit, Call::AudioInit]);
    }

    #[test]
    fn test_invalid_tuning_is_rejected() {
        let tuning = Tuning {
            starting_lives: 0,
            ..Tuning::default()
        };
        let result = Game::new(tuning, 1, MemoryStore::new(), NoAds, SilentAudio);
        assert!(matches!(result, Err(TuningError::NoLives)));
    }

    #[test]
    fn test_start_resets_and_plays_start_cue() {
        let (mut game, log) = game_with(MemoryStore::new(), Ok(RewardStatus::Denied));
        assert!(game.start(0));
        assert_eq!(game.session().lives, 5);
        assert_eq!(game.state().phase, DriverPhase::BeatActive);
        assert!(!game.state().round.targets.is_empty());
        assert_eq!(count(&log, Call::LifeGained), 1);
        // Score 0: no decoys, so only the beat end is pending
        assert_eq!(game.next_deadline(), Some(1100));
    }

    #[test]
    fn test_hit_saves_best_score_and_plays_cue() {
        let (mut game, log) = game_with(MemoryStore::new(), Ok(RewardStatus::Denied));
        game.start(0);
        plant(&mut game, &[(6, TargetKind::Normal, true)]);
        assert_eq!(game.tap(6, 200), Outcome::HitNormal);
        assert_eq!(game.store().value(), Some(1));
        assert_eq!(log.borrow().last(), Some(&Call::Hit(1)));
    }

    #[test]
    fn test_harm_cues_in_order() {
        let (mut game, log) = game_with(MemoryStore::new(), Ok(RewardStatus::Denied));
        game.start(0);
        plant(&mut game, &[(2, TargetKind::Harm, true)]);
        log.borrow_mut().clear();
        assert_eq!(game.tap(2, 100), Outcome::HitHarm);
        assert_eq!(*log.borrow(), vec![Call::LifeLost, Call::Hit(1)]);
    }

    #[test]
    fn test_failing_store_is_not_fatal() {
        let (mut game, _log) = game_with(MemoryStore::failing(), Ok(RewardStatus::Denied));
        assert_eq!(game.session().best_score, 0);
        game.start(0);
        plant(&mut game, &[(1, TargetKind::Normal, true)]);
        assert_eq!(game.tap(1, 50), Outcome::HitNormal);
        assert_eq!(game.session().score, 1);
        assert_eq!(game.session().best_score, 1);
    }

    #[test]
    fn test_interstitial_after_third_game_over_with_delay() {
        let (mut game, log) = game_with(MemoryStore::new(), Ok(RewardStatus::Denied));
        for run in 0..3u64 {
            let t = run * 10_000;
            game.start(t);
            lose_run(&mut game, t + 10);
        }
        assert_eq!(game.session().games_played, 3);
        assert_eq!(count(&log, Call::Interstitial), 0);
        assert_eq!(game.next_deadline(), Some(20_510));

        game.advance(20_509);
        assert_eq!(count(&log, Call::Interstitial), 0);
        game.advance(20_510);
        assert_eq!(count(&log, Call::Interstitial), 1);
        game.advance(30_000);
        assert_eq!(count(&log, Call::Interstitial), 1);
    }

    #[test]
    fn test_game_over_stops_the_cycle() {
        let (mut game, _log) = game_with(MemoryStore::new(), Ok(RewardStatus::Denied));
        game.start(0);
        lose_run(&mut game, 10);
        assert_eq!(game.state().phase, DriverPhase::Idle);
        assert_eq!(game.next_deadline(), None);
        game.advance(60_000);
        assert!(game.state().round.targets.is_empty());
        assert_eq!(game.tap(0, 60_001), Outcome::Ignored);
    }

    #[test]
    fn test_continue_granted_keeps_score() {
        let (mut game, log) = game_with(MemoryStore::new(), Ok(RewardStatus::Granted));
        game.start(0);
        plant(&mut game, &[(6, TargetKind::Normal, true)]);
        game.tap(6, 5);
        lose_run(&mut game, 10);

        assert_eq!(game.request_continue(20), ContinueResult::Resumed);
        let session = game.session();
        assert_eq!(session.lives, 1);
        assert_eq!(session.score, 1);
        assert!(!session.game_over);
        assert_eq!(session.continues_used, 1);
        assert_eq!(game.state().phase, DriverPhase::BeatActive);
        assert_eq!(log.borrow().last(), Some(&Call::LifeGained));
        assert_eq!(game.snapshot().continues_left, 2);
    }

    #[test]
    fn test_continue_limit() {
        let (mut game, log) = game_with(MemoryStore::new(), Ok(RewardStatus::Granted));
        game.start(0);
        lose_run(&mut game, 10);
        for i in 1..=3u64 {
            let t = i * 1000;
            assert_eq!(game.request_continue(t), ContinueResult::Resumed);
            lose_run(&mut game, t + 10);
        }
        assert_eq!(game.request_continue(5000), ContinueResult::Unavailable);
        assert_eq!(count(&log, Call::RewardRequested), 3);
        // A fresh run gets its continues back
        game.start(6000);
        lose_run(&mut game, 6010);
        assert_eq!(game.request_continue(6020), ContinueResult::Resumed);
    }

    #[test]
    fn test_continue_unavailable_while_playing() {
        let (mut game, log) = game_with(MemoryStore::new(), Ok(RewardStatus::Granted));
        game.start(0);
        assert_eq!(game.request_continue(10), ContinueResult::Unavailable);
        assert_eq!(count(&log, Call::RewardRequested), 0);
    }

    #[test]
    fn test_continue_denied_or_failed() {
        let (mut game, _log) = game_with(MemoryStore::new(), Ok(RewardStatus::Denied));
        game.start(0);
        lose_run(&mut game, 10);
        assert_eq!(game.request_continue(20), ContinueResult::Declined);
        assert!(game.session().game_over);

        let (mut game, _log) = game_with(MemoryStore::new(), Err(SignalError::NoFill));
        game.start(0);
        lose_run(&mut game, 10);
        assert_eq!(game.request_continue(20), ContinueResult::Declined);
        assert_eq!(game.session().continues_used, 0);
    }

    #[test]
    fn test_pending_reward_resolved_later() {
        let (mut game, _log) = game_with(MemoryStore::new(), Ok(RewardStatus::Pending));
        game.start(0);
        lose_run(&mut game, 10);
        assert_eq!(game.request_continue(20), ContinueResult::AwaitingReward);
        assert_eq!(game.request_continue(30), ContinueResult::Unavailable);
        assert_eq!(game.resolve_continue_reward(false, 40), ContinueResult::Declined);
        assert!(game.session().game_over);
        assert_eq!(game.resolve_continue_reward(true, 50), ContinueResult::Unavailable);

        assert_eq!(game.request_continue(60), ContinueResult::AwaitingReward);
        assert_eq!(game.resolve_continue_reward(true, 70), ContinueResult::Resumed);
        assert_eq!(game.session().lives, 1);
    }

    #[test]
    fn test_stop_discards_pending_beat() {
        let (mut game, _log) = game_with(MemoryStore::new(), Ok(RewardStatus::Denied));
        game.start(0);
        game.stop();
        game.advance(5000);
        assert_eq!(game.state().phase, DriverPhase::Idle);
        assert_eq!(game.session().combo_hits, 0);
        assert_eq!(game.tap(3, 5001), Outcome::Ignored);
    }

    #[test]
    fn test_services_torn_down_once() {
        let (mut game, log) = game_with(MemoryStore::new(), Ok(RewardStatus::Denied));
        game.start(0);
        game.shutdown();
        drop(game);
        assert_eq!(count(&log, Call::AdsTeardown), 1);
        assert_eq!(count(&log, Call::AudioTeardown), 1);
    }

    #[test]
    fn test_snapshot_reflects_round() {
        let (mut game, _log) = game_with(MemoryStore::new(), Ok(RewardStatus::Denied));
        game.start(0);
        plant(
            &mut game,
            &[(0, TargetKind::Normal, true), (5, TargetKind::Decoy, false)],
        );
        game.tap(0, 10);
        let snapshot = game.snapshot();
        assert_eq!(snapshot.slots[0], SlotView::Consumed);
        assert_eq!(
            snapshot.slots[5],
            SlotView::Target {
                kind: TargetKind::Decoy,
                safe: false
            }
        );
        assert_eq!(snapshot.slots[1], SlotView::Empty);
        assert_eq!(snapshot.combo_multiplier, 1);
        assert_eq!(snapshot.continues_left, 3);
    }
}
