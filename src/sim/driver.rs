//! Round cycle driver
//!
//! Finite-state machine over [`DriverPhase`], driven by the timer queue:
//!
//! ```text
//! Idle --start--> BeatActive --BeatEnd--> BeatEnding --+--> BeatActive (next beat)
//!                                                      +--> Idle (lives == 0)
//! ```
//!
//! Every timer is stamped with the cycle that scheduled it. `stop` bumps the
//! cycle and clears the queue, so a late event can never touch state.

use super::schedule::beat_duration;
use super::spawn::select_spawn;
use super::state::{ActiveTarget, DriverPhase, GameEvent, GameState, TargetKind};
use super::timer::{TimerEvent, TimerKind};

/// Start the cycle. Only valid from `Idle` with lives left.
pub fn start(state: &mut GameState, now_ms: u64) -> bool {
    if state.phase != DriverPhase::Idle || state.session.lives == 0 {
        log::debug!(
            "Driver start refused (phase {:?}, lives {})",
            state.phase,
            state.session.lives
        );
        return false;
    }
    state.timers.cancel_all();
    state.round.clear_beat();
    state.cycle += 1;
    begin_beat(state, now_ms);
    true
}

/// Stop the cycle and drop both pending timers
pub fn stop(state: &mut GameState) {
    state.timers.cancel_all();
    state.cycle += 1;
    state.round.clear_beat();
    state.phase = DriverPhase::Idle;
}

/// Fire every timer due at or before `now_ms`, in order
pub fn advance(state: &mut GameState, now_ms: u64) {
    while let Some((due_ms, event)) = state.timers.pop_due(now_ms) {
        fire(state, event, due_ms);
    }
}

fn fire(state: &mut GameState, event: TimerEvent, due_ms: u64) {
    if event.cycle != state.cycle || state.phase == DriverPhase::Idle {
        log::trace!("Dropping stale {:?} from cycle {}", event.kind, event.cycle);
        return;
    }
    match event.kind {
        TimerKind::SafeFlip => flip_decoys_safe(state),
        TimerKind::BeatEnd => end_beat(state, due_ms),
    }
}

fn begin_beat(state: &mut GameState, now_ms: u64) {
    let score = state.session.score;
    let beat_ms = beat_duration(score, &state.tuning.beat_schedule);
    let plan = select_spawn(score, &state.tuning.spawn, &mut state.rng);

    let mut targets: Vec<ActiveTarget> = plan
        .iter()
        .map(|entry| ActiveTarget {
            slot: entry.slot,
            kind: entry.kind,
            safe_to_hit: !entry.deferred_safety,
            spawned_at_ms: now_ms,
        })
        .collect();
    targets.sort_by_key(|t| t.slot);

    state.round.consumed.clear();
    state.round.last_active_slots = plan.iter().map(|e| e.slot).collect();
    state.round.targets = targets;
    state.phase = DriverPhase::BeatActive;

    let cycle = state.cycle;
    if plan.iter().any(|e| e.deferred_safety) {
        let safe_ms = (beat_ms as f64 * state.tuning.safe_phase_ratio) as u64;
        state.timers.schedule(
            now_ms + safe_ms,
            TimerEvent {
                cycle,
                kind: TimerKind::SafeFlip,
            },
        );
    }
    state.timers.schedule(
        now_ms + beat_ms as u64,
        TimerEvent {
            cycle,
            kind: TimerKind::BeatEnd,
        },
    );

    log::debug!(
        "Beat at {}ms: {:?} ({}ms, score {})",
        now_ms,
        plan,
        beat_ms,
        score
    );
    state.push_event(GameEvent::BeatStarted {
        beat_ms,
        targets: plan.len(),
    });
}

fn flip_decoys_safe(state: &mut GameState) {
    let round = &mut state.round;
    for target in round.targets.iter_mut() {
        if target.kind == TargetKind::Decoy && !round.consumed.contains(&target.slot) {
            target.safe_to_hit = true;
        }
    }
    state.push_event(GameEvent::DecoysSafe);
}

fn end_beat(state: &mut GameState, now_ms: u64) {
    state.phase = DriverPhase::BeatEnding;

    // Letting a harm target expire is not a player error
    let missed = state
        .round
        .live_targets()
        .filter(|t| t.kind != TargetKind::Harm)
        .count() as u32;
    if missed > 0 {
        state.session.combo_down(missed);
    }
    state.round.clear_beat();
    state.round.last_beat_end_ms = Some(now_ms);
    state.push_event(GameEvent::BeatEnded { missed });

    if state.session.lives == 0 {
        stop(state);
    } else {
        begin_beat(state, now_ms);
    }
}
