//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Host-supplied clock only (milliseconds)
//! - Seeded RNG only
//! - Timers are data, not closures
//! - No rendering, audio, storage or ad dependencies

pub mod driver;
pub mod input;
pub mod schedule;
pub mod spawn;
pub mod state;
pub mod timer;

pub use input::{Outcome, classify_tap, resolve_tap};
pub use schedule::beat_duration;
pub use spawn::{RandomSource, SpawnEntry, SpawnPlan, select_spawn};
pub use state::{
    ActiveTarget, DriverPhase, GameEvent, GameState, RoundState, SessionState, SlotView,
    TargetKind,
};
pub use timer::{TimerEvent, TimerId, TimerKind, TimerQueue};
