//! Wacky Mole - a 4x4 whack-a-mole reaction game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (beat cycle, spawning, tap resolution)
//! - `game`: Facade wiring the simulation to storage, ads and audio
//! - `platform`: Ad and audio service seams
//! - `persistence`: Best-score storage
//! - `tuning`: Data-driven game balance
//! - `autoplay`: Headless demo player

pub mod autoplay;
pub mod game;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod tuning;

#[cfg(target_arch = "wasm32")]
pub mod audio;

pub use game::{ContinueResult, Game, GameSnapshot};
pub use settings::Settings;
pub use sim::{Outcome, TargetKind};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Grid is GRID_COLUMNS x GRID_COLUMNS
    pub const GRID_COLUMNS: usize = 4;
    pub const SLOT_COUNT: usize = GRID_COLUMNS * GRID_COLUMNS;

    /// Used only if a schedule table is empty
    pub const FALLBACK_BEAT_MS: u32 = 1000;
}

/// Slot index to (row, column)
#[inline]
pub fn slot_to_cell(slot: u8) -> (usize, usize) {
    let slot = slot as usize;
    (slot / consts::GRID_COLUMNS, slot % consts::GRID_COLUMNS)
}

/// (row, column) to slot index, if on the grid
#[inline]
pub fn cell_to_slot(row: usize, col: usize) -> Option<u8> {
    if row < consts::GRID_COLUMNS && col < consts::GRID_COLUMNS {
        Some((row * consts::GRID_COLUMNS + col) as u8)
    } else {
        None
    }
}
