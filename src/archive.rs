//! Flat scalar archives
//!
//! The experiment persists named scalar metrics to small archive files, one
//! flat `key -> value` map per run stage. File names are fixed by the
//! surrounding pipeline; the payload is a JSON object.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Archive of per-model best R2 scores
pub const MODEL_SCORES_FILE: &str = "reg_models_r2.npz";
/// Archive of cross-validated training metrics
pub const TRAIN_METRICS_FILE: &str = "reg_train.npz";
/// Archive of held-out test metrics
pub const TEST_METRICS_FILE: &str = "reg_test.npz";

/// A flat, ordered mapping of string keys to scalar values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalarArchive {
    entries: BTreeMap<String, f64>,
}

impl ScalarArchive {
    /// Create an empty archive
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value
    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        self.entries.insert(key.into(), value);
    }

    /// Look up a value
    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries.get(key).copied()
    }

    /// All keys, in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the archive holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the archive to disk, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Read an archive back from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let entries: BTreeMap<String, f64> = serde_json::from_str(&json)?;
        Ok(Self { entries })
    }
}

impl FromIterator<(String, f64)> for ScalarArchive {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut archive = ScalarArchive::new();
        archive.insert("mse", 0.25);
        assert_eq!(archive.get("mse"), Some(0.25));
        assert_eq!(archive.get("missing"), None);
        assert_eq!(archive.len(), 1);
    }

    #[test]
    fn test_round_trip() {
        let dir = std::env::temp_dir().join("stackreg_archive_round_trip");
        let path = dir.join(MODEL_SCORES_FILE);

        let mut archive = ScalarArchive::new();
        archive.insert("SVR", 0.55);
        archive.insert("Random Forest", 0.75);
        archive.save(&path).unwrap();

        let loaded = ScalarArchive::load(&path).unwrap();
        assert_eq!(loaded, archive);
        assert_eq!(loaded.get("Random Forest"), Some(0.75));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_keys_sorted() {
        let archive: ScalarArchive = vec![
            ("b".to_string(), 2.0),
            ("a".to_string(), 1.0),
        ]
        .into_iter()
        .collect();
        let keys: Vec<&str> = archive.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
