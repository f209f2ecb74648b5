//! Best-score persistence
//!
//! One scalar, one key. Stores report failures as [`StorageError`]; the game
//! facade logs and ignores them so a broken store never stalls a run.

#[cfg(not(target_arch = "wasm32"))]
pub mod file;
#[cfg(target_arch = "wasm32")]
pub mod local_storage;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;
#[cfg(target_arch = "wasm32")]
pub use local_storage::LocalStorageStore;

use thiserror::Error;

/// Storage key for the best score
pub const BEST_SCORE_KEY: &str = "wacky_mole_best_score";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend unavailable")]
    Unavailable,
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored record is malformed: {0}")]
    Malformed(String),
    #[error("storage write rejected: {0}")]
    Rejected(String),
}

/// Key-value access to the persisted best score
pub trait ScoreStore {
    /// `Ok(None)` when nothing has been stored yet
    fn load_best_score(&mut self) -> Result<Option<u64>, StorageError>;
    fn save_best_score(&mut self, score: u64) -> Result<(), StorageError>;
}

/// Parse a stored value. Blank or non-numeric values count as absent.
pub fn parse_score(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    if let Ok(score) = trimmed.parse::<u64>() {
        return Some(score);
    }
    // Accept float-formatted values ("12.0")
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v as u64)
}

/// In-process store (tests, native without a data dir)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    value: Option<u64>,
    /// Simulate a broken backend
    pub fail: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_score(score: u64) -> Self {
        Self {
            value: Some(score),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            value: None,
            fail: true,
        }
    }

    pub fn value(&self) -> Option<u64> {
        self.value
    }
}

impl ScoreStore for MemoryStore {
    fn load_best_score(&mut self) -> Result<Option<u64>, StorageError> {
        if self.fail {
            return Err(StorageError::Unavailable);
        }
        Ok(self.value)
    }

    fn save_best_score(&mut self, score: u64) -> Result<(), StorageError> {
        if self.fail {
            return Err(StorageError::Unavailable);
        }
        self.value = Some(score);
        Ok(())
    }
}
