//! Game state and core simulation types
//!
//! Everything the driver and the resolver mutate lives here. Hosts only read it.

use std::collections::BTreeSet;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::timer::{TimerEvent, TimerQueue};
use crate::consts::SLOT_COUNT;
use crate::tuning::Tuning;

/// What occupies a slot during a beat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    /// Scores with the combo multiplier
    Normal,
    /// Penalizes while unsafe, scores like Normal once safe
    Decoy,
    /// Grants a life
    Heal,
    /// Costs a life when tapped; never counted as missed
    Harm,
}

impl TargetKind {
    pub fn is_special(self) -> bool {
        matches!(self, TargetKind::Heal | TargetKind::Harm)
    }
}

/// A target spawned for the current beat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveTarget {
    pub slot: u8,
    pub kind: TargetKind,
    pub safe_to_hit: bool,
    /// Diagnostic only
    pub spawned_at_ms: u64,
}

/// Driver lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriverPhase {
    /// Not started, stopped, or game over
    Idle,
    /// Targets visible, awaiting taps or the beat-end timer
    BeatActive,
    /// Beat-end evaluation in progress
    BeatEnding,
}

/// Per-beat round state owned by the driver
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundState {
    /// Targets of the current beat (sorted by slot)
    pub targets: Vec<ActiveTarget>,
    /// Slots already resolved this beat
    pub consumed: BTreeSet<u8>,
    /// Slots that were spawned by the most recent beat
    pub last_active_slots: Vec<u8>,
    pub last_beat_end_ms: Option<u64>,
}

impl RoundState {
    pub fn target(&self, slot: u8) -> Option<&ActiveTarget> {
        self.targets.iter().find(|t| t.slot == slot)
    }

    pub fn is_consumed(&self, slot: u8) -> bool {
        self.consumed.contains(&slot)
    }

    /// Targets not yet resolved this beat
    pub fn live_targets(&self) -> impl Iterator<Item = &ActiveTarget> {
        self.targets.iter().filter(|t| !self.consumed.contains(&t.slot))
    }

    /// True once this run has shown at least one beat
    pub fn had_previous_beat(&self) -> bool {
        !self.last_active_slots.is_empty() || self.last_beat_end_ms.is_some()
    }

    /// Drop the current beat's targets (history is kept)
    pub fn clear_beat(&mut self) {
        self.targets.clear();
        self.consumed.clear();
    }

    /// Forget everything, including history
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Scores, lives and counters for the player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub score: u64,
    pub lives: u8,
    pub combo_hits: u32,
    pub best_score: u64,
    /// Persists across runs
    pub games_played: u32,
    /// Reset at the start of every run
    pub continues_used: u32,
    pub game_over: bool,
    pub has_started: bool,
}

impl SessionState {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            score: 0,
            lives: tuning.starting_lives,
            combo_hits: 0,
            best_score: 0,
            games_played: 0,
            continues_used: 0,
            game_over: false,
            has_started: false,
        }
    }

    /// Reset per-run counters for a fresh run
    pub fn begin_run(&mut self, tuning: &Tuning) {
        self.score = 0;
        self.lives = tuning.starting_lives;
        self.combo_hits = 0;
        self.continues_used = 0;
        self.game_over = false;
        self.has_started = true;
    }

    /// Add points; returns true if the best score was raised
    pub fn add_score(&mut self, points: u64) -> bool {
        self.score += points;
        if self.score > self.best_score {
            self.best_score = self.score;
            return true;
        }
        false
    }

    /// Entry point for a best score loaded from storage
    pub fn load_best_score(&mut self, stored: u64) {
        self.best_score = self.best_score.max(stored);
    }

    pub fn gain_life(&mut self, tuning: &Tuning) {
        self.lives = self.lives.saturating_add(1).min(tuning.starting_lives);
    }

    pub fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
    }

    pub fn combo_up(&mut self, tuning: &Tuning) {
        self.combo_hits = self.combo_hits.saturating_add(1).min(tuning.combo_max);
    }

    pub fn combo_down(&mut self, by: u32) {
        self.combo_hits = self.combo_hits.saturating_sub(by);
    }

    /// Fill level of the combo bar in `[0, 1]`
    pub fn combo_fraction(&self, tuning: &Tuning) -> f32 {
        self.combo_hits as f32 / tuning.combo_max as f32
    }

    /// Game-over transition. Fires once per life exhaustion; returns the new
    /// `games_played` when it fired.
    pub fn enter_game_over(&mut self) -> Option<u32> {
        if self.lives > 0 || self.game_over {
            return None;
        }
        self.game_over = true;
        self.games_played += 1;
        Some(self.games_played)
    }

    pub fn can_continue(&self, tuning: &Tuning) -> bool {
        self.game_over && self.continues_used < tuning.max_continues
    }

    /// Apply a granted continue; score is kept
    pub fn apply_continue(&mut self) {
        self.lives = 1;
        self.game_over = false;
        self.continues_used += 1;
    }
}

/// One-way notifications for the host (audio, storage, ads, logging)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    RunStarted,
    BeatStarted { beat_ms: u32, targets: usize },
    DecoysSafe,
    BeatEnded { missed: u32 },
    Hit { combo: u32 },
    LifeLost,
    LifeGained,
    BestScoreRaised { score: u64 },
    GameOver { games_played: u32 },
    /// Every Nth game over
    InterstitialMilestone,
    ContinueGranted,
}

/// Complete simulation state (single-threaded, deterministic for a seed)
#[derive(Debug, Clone)]
pub struct GameState {
    pub tuning: Tuning,
    pub seed: u64,
    pub rng: Pcg32,
    pub session: SessionState,
    pub round: RoundState,
    pub phase: DriverPhase,
    /// Identifies the running driver cycle; timer events from older cycles are stale
    pub cycle: u64,
    pub timers: TimerQueue<TimerEvent>,
    /// Pending host notifications, drained by the host after every call
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Create a new game state with the given seed
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        let session = SessionState::new(&tuning);
        Self {
            tuning,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            session,
            round: RoundState::default(),
            phase: DriverPhase::Idle,
            cycle: 0,
            timers: TimerQueue::new(),
            events: Vec::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase != DriverPhase::Idle
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Per-slot view for rendering
    pub fn slot_views(&self) -> [SlotView; SLOT_COUNT] {
        let mut views = [SlotView::Empty; SLOT_COUNT];
        for target in &self.round.targets {
            views[target.slot as usize] = if self.round.is_consumed(target.slot) {
                SlotView::Consumed
            } else {
                SlotView::Target {
                    kind: target.kind,
                    safe: target.safe_to_hit,
                }
            };
        }
        views
    }
}

/// What a host should draw in a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotView {
    Empty,
    Target { kind: TargetKind, safe: bool },
    Consumed,
}
