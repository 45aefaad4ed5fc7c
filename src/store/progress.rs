//! JSON-backed store of per-URL fetch outcomes.
//!
//! The map is rewritten to disk in full after every fetch attempt, so a
//! crash mid-run loses at most the in-flight URL's outcome. Malformed or
//! missing content on load is treated as an empty store — never fatal —
//! while save failures propagate: losing recorded progress silently is
//! worse than stopping.

use crate::models::FetchOutcome;
use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use tracing::{info, warn};

/// Durable map from URL to its recorded [`FetchOutcome`].
#[derive(Debug, Default)]
pub struct ProgressStore {
    outcomes: BTreeMap<String, FetchOutcome>,
}

impl ProgressStore {
    /// Load from `path`. Missing file or unparseable JSON yields an empty
    /// store.
    pub fn load(path: &str) -> Self {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => {
                info!(%path, "progress store not found; starting empty");
                return Self::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(outcomes) => {
                let store = Self { outcomes };
                info!(count = store.len(), %path, "loaded progress store");
                store
            }
            Err(e) => {
                warn!(%path, error = %e, "progress store is malformed; treating as empty");
                Self::default()
            }
        }
    }

    /// Rewrite the full map to `path`. Errors are fatal to the run.
    pub fn save(&self, path: &str) -> Result<(), Box<dyn Error>> {
        let json = serde_json::to_string_pretty(&self.outcomes)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.outcomes.contains_key(url)
    }

    pub fn get(&self, url: &str) -> Option<&FetchOutcome> {
        self.outcomes.get(url)
    }

    /// Record (or overwrite) the outcome for `url`.
    pub fn record(&mut self, url: String, outcome: FetchOutcome) {
        self.outcomes.insert(url, outcome);
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("none.json");
        assert!(ProgressStore::load(path.to_str().unwrap()).is_empty());
    }

    #[test]
    fn test_malformed_json_is_empty_not_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(ProgressStore::load(path.to_str().unwrap()).is_empty());
    }

    #[test]
    fn test_record_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.json");
        let path = path.to_str().unwrap();

        let mut store = ProgressStore::default();
        store.record(
            "https://a/1".to_string(),
            FetchOutcome::Success {
                file: "data/1.txt".to_string(),
            },
        );
        store.record(
            "https://a/2".to_string(),
            FetchOutcome::Failed {
                error: "HTTP 500".to_string(),
            },
        );
        store.save(path).unwrap();

        let loaded = ProgressStore::load(path);
        assert_eq!(loaded.len(), 2);
        assert_eq!(
            loaded.get("https://a/1"),
            Some(&FetchOutcome::Success {
                file: "data/1.txt".to_string()
            })
        );
        assert!(loaded.contains("https://a/2"));
    }

    #[test]
    fn test_record_overwrites_within_run() {
        let mut store = ProgressStore::default();
        store.record(
            "https://a/1".to_string(),
            FetchOutcome::Failed {
                error: "timeout".to_string(),
            },
        );
        store.record(
            "https://a/1".to_string(),
            FetchOutcome::Success {
                file: "data/1.txt".to_string(),
            },
        );
        assert_eq!(store.len(), 1);
        assert!(matches!(
            store.get("https://a/1"),
            Some(FetchOutcome::Success { .. })
        ));
    }
}
