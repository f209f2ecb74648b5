//! Input resolver: one tap against the live round

use serde::{Deserialize, Serialize};

use super::driver;
use super::state::{DriverPhase, GameEvent, GameState, TargetKind};
use crate::consts::SLOT_COUNT;

/// Result of a single tap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    HitNormal,
    HitHeal,
    HitHarm,
    MistakeDecoy,
    MistakeEmptySlot,
    MistakeWrongSlot,
    Ignored,
}

impl Outcome {
    pub fn is_hit(self) -> bool {
        matches!(self, Outcome::HitNormal | Outcome::HitHeal | Outcome::HitHarm)
    }

    pub fn is_mistake(self) -> bool {
        matches!(
            self,
            Outcome::MistakeDecoy | Outcome::MistakeEmptySlot | Outcome::MistakeWrongSlot
        )
    }
}

/// Classify a tap without touching state
pub fn classify_tap(state: &GameState, slot: u8) -> Outcome {
    if state.session.game_over || slot as usize >= SLOT_COUNT {
        return Outcome::Ignored;
    }
    // Stopped cycle: nothing on screen to judge against
    if state.phase == DriverPhase::Idle {
        return Outcome::Ignored;
    }
    let round = &state.round;
    if round.is_consumed(slot) {
        return Outcome::Ignored;
    }
    if round.live_targets().next().is_none() {
        // Nothing spawned yet this run: don't punish an early tap
        return if round.had_previous_beat() {
            Outcome::MistakeEmptySlot
        } else {
            Outcome::Ignored
        };
    }
    match round.target(slot) {
        Some(target) => match target.kind {
            TargetKind::Decoy if !target.safe_to_hit => Outcome::MistakeDecoy,
            TargetKind::Normal | TargetKind::Decoy => Outcome::HitNormal,
            TargetKind::Heal => Outcome::HitHeal,
            TargetKind::Harm => Outcome::HitHarm,
        },
        None => Outcome::MistakeWrongSlot,
    }
}

/// Resolve a tap and apply its score/life/combo effects in one step.
///
/// If the tap costs the last life, the game-over transition runs and the
/// driver is stopped before this returns.
pub fn resolve_tap(state: &mut GameState, slot: u8, now_ms: u64) -> Outcome {
    let outcome = classify_tap(state, slot);
    let tuning = &state.tuning;
    let session = &mut state.session;

    match outcome {
        Outcome::Ignored => return outcome,
        Outcome::HitNormal => {
            let points = tuning.combo_multiplier(session.combo_hits);
            let raised = session.add_score(points);
            session.combo_up(tuning);
            let combo = session.combo_hits;
            state.round.consumed.insert(slot);
            state.push_event(GameEvent::Hit { combo });
            if raised {
                let score = state.session.best_score;
                state.push_event(GameEvent::BestScoreRaised { score });
            }
        }
        Outcome::HitHeal => {
            session.gain_life(tuning);
            session.combo_up(tuning);
            let combo = session.combo_hits;
            state.round.consumed.insert(slot);
            state.push_event(GameEvent::LifeGained);
            state.push_event(GameEvent::Hit { combo });
        }
        Outcome::HitHarm => {
            session.lose_life();
            session.combo_up(tuning);
            let combo = session.combo_hits;
            state.round.consumed.insert(slot);
            state.push_event(GameEvent::LifeLost);
            state.push_event(GameEvent::Hit { combo });
        }
        Outcome::MistakeDecoy | Outcome::MistakeEmptySlot | Outcome::MistakeWrongSlot => {
            session.lose_life();
            session.combo_down(1);
            state.push_event(GameEvent::LifeLost);
        }
    }

    log::debug!(
        "Tap slot {} at {}ms: {:?} (score {}, lives {}, combo {})",
        slot,
        now_ms,
        outcome,
        state.session.score,
        state.session.lives,
        state.session.combo_hits
    );

    if let Some(games_played) = state.session.enter_game_over() {
        end_run(state, games_played);
    }
    outcome
}

/// Game-over transition: stop the cycle and tell the host
pub fn end_run(state: &mut GameState, games_played: u32) {
    driver::stop(state);
    log::info!(
        "Game over: score {}, best {}, games played {}",
        state.session.score,
        state.session.best_score,
        games_played
    );
    state.push_event(GameEvent::GameOver { games_played });
    if games_played % state.tuning.games_between_interstitials == 0 {
        state.push_event(GameEvent::InterstitialMilestone);
    }
}
