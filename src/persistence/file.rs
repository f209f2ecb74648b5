//! Native best-score file (small JSON record)

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{BEST_SCORE_KEY, ScoreStore, StorageError};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BestScoreRecord {
    key: String,
    best_score: u64,
}

/// Stores the best score as JSON at a fixed path
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<dir>/wacky_mole_best_score.json`
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let mut path = dir.into();
        path.push(format!("{BEST_SCORE_KEY}.json"));
        Self { path }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl ScoreStore for FileStore {
    fn load_best_score(&mut self) -> Result<Option<u64>, StorageError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record: BestScoreRecord =
            serde_json::from_str(&json).map_err(|e| StorageError::Malformed(e.to_string()))?;
        log::info!("Loaded best score {} from {}", record.best_score, self.path.display());
        Ok(Some(record.best_score))
    }

    fn save_best_score(&mut self, score: u64) -> Result<(), StorageError> {
        let record = BestScoreRecord {
            key: BEST_SCORE_KEY.to_string(),
            best_score: score,
        };
        let json =
            serde_json::to_string(&record).map_err(|e| StorageError::Rejected(e.to_string()))?;
        // Write then rename so a crash never leaves half a record
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> FileStore {
        let dir = std::env::temp_dir().join(format!("wacky-mole-{}-{name}", std::process::id()));
        fs::create_dir_all(&dir).expect("temp dir");
        let store = FileStore::in_dir(&dir);
        let _ = fs::remove_file(store.path());
        store
    }

    #[test]
    fn test_missing_file_is_absent() {
        let mut store = temp_store("missing");
        assert_eq!(store.load_best_score().ok(), Some(None));
    }

    #[test]
    fn test_save_then_load() {
        let mut store = temp_store("roundtrip");
        store.save_best_score(123).expect("save");
        assert_eq!(store.load_best_score().ok(), Some(Some(123)));
        store.save_best_score(150).expect("overwrite");
        assert_eq!(store.load_best_score().ok(), Some(Some(150)));
    }

    #[test]
    fn test_corrupt_file_is_malformed() {
        let mut store = temp_store("corrupt");
        fs::write(store.path(), "{ not json").expect("write");
        assert!(matches!(
            store.load_best_score(),
            Err(StorageError::Malformed(_))
        ));
    }
}
