//! Idle/demo mode - a bot plays the game
//!
//! Used by the native binary and by soak tests. The bot only reads the public
//! round state and taps through the same entry point as a player.

use std::collections::BTreeSet;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::SLOT_COUNT;
use crate::game::Game;
use crate::persistence::ScoreStore;
use crate::platform::{AdService, AudioCues};
use crate::sim::{GameState, Outcome, TargetKind};

/// A simulated player
#[derive(Debug, Clone)]
pub struct Autoplayer {
    rng: Pcg32,
    /// Chance of tapping a target it decides on (and of not fumbling)
    pub accuracy: f64,
    /// Delay after spawn before the bot reacts
    pub reaction_ms: u64,
    beat_id: Option<u64>,
    decided: BTreeSet<u8>,
    fumbled: bool,
}

impl Autoplayer {
    pub fn new(seed: u64, accuracy: f64, reaction_ms: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            accuracy: accuracy.clamp(0.0, 1.0),
            reaction_ms,
            beat_id: None,
            decided: BTreeSet::new(),
            fumbled: false,
        }
    }

    /// Slots to tap this frame
    pub fn think(&mut self, state: &GameState, now_ms: u64) -> Vec<u8> {
        let Some(spawned_at) = state.round.targets.first().map(|t| t.spawned_at_ms) else {
            return Vec::new();
        };
        if self.beat_id != Some(spawned_at) {
            self.beat_id = Some(spawned_at);
            self.decided.clear();
            self.fumbled = false;
        }
        if now_ms < spawned_at + self.reaction_ms {
            return Vec::new();
        }

        let mut taps = Vec::new();
        for target in state.round.live_targets() {
            if self.decided.contains(&target.slot) {
                continue;
            }
            match target.kind {
                // Never worth it
                TargetKind::Harm => {
                    self.decided.insert(target.slot);
                }
                // Wait for it to turn safe
                TargetKind::Decoy if !target.safe_to_hit => {}
                _ => {
                    self.decided.insert(target.slot);
                    if self.rng.random::<f64>() < self.accuracy {
                        taps.push(target.slot);
                    }
                }
            }
        }

        if !self.fumbled {
            self.fumbled = true;
            let fumble_chance = (1.0 - self.accuracy) / 4.0;
            if self.rng.random::<f64>() < fumble_chance {
                let slot = self.rng.random_range(0..SLOT_COUNT as u8);
                if state.round.target(slot).is_none() {
                    taps.push(slot);
                }
            }
        }
        taps
    }
}

/// What happened in an autoplayed run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub score: u64,
    pub best_score: u64,
    pub lives: u8,
    pub game_over: bool,
    pub duration_ms: u64,
    pub hits: u32,
    pub mistakes: u32,
}

/// Play one run from `start_ms` until game over or `max_ms` elapses
pub fn play_run<S: ScoreStore, A: AdService, C: AudioCues>(
    game: &mut Game<S, A, C>,
    bot: &mut Autoplayer,
    start_ms: u64,
    frame_ms: u64,
    max_ms: u64,
) -> RunSummary {
    let mut summary = RunSummary::default();
    game.start(start_ms);

    let frame_ms = frame_ms.max(1);
    let mut now = start_ms;
    while now - start_ms < max_ms && !game.session().game_over {
        now += frame_ms;
        game.advance(now);
        for slot in bot.think(game.state(), now) {
            match game.tap(slot, now) {
                Outcome::Ignored => {}
                outcome if outcome.is_hit() => summary.hits += 1,
                _ => summary.mistakes += 1,
            }
        }
    }

    let session = game.session();
    summary.score = session.score;
    summary.best_score = session.best_score;
    summary.lives = session.lives;
    summary.game_over = session.game_over;
    summary.duration_ms = now - start_ms;
    summary
}
