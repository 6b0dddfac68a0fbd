//! High score persistence
//!
//! The board is stored as a serialized record sequence under a fixed key
//! in a small key-value collaborator. It is read once at startup and
//! rewritten in full on every accepted insertion. Absent or malformed
//! data degrades to an empty board, never a fatal error.

use super::board::{DEFAULT_CAPACITY, HighScoreRecord, Leaderboard, MAX_NAME_LEN};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Key under which the record sequence is stored
pub const SCORES_KEY: &str = "high_scores";

/// Key-value persistence collaborator for the leaderboard
pub trait ScoreStore {
    /// Read the value stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the value stored under `key`
    fn put(&mut self, key: &str, value: &str) -> Result<()>;
}

/// File-backed store keeping one JSON file per key under a data directory
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl ScoreStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(raw))
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create directory {}", self.root.display()))?;
        let path = self.path_for(key);
        fs::write(&path, value).with_context(|| format!("Failed to write {}", path.display()))
    }
}

/// In-memory store for tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl ScoreStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// The leaderboard together with its persistence collaborator
pub struct HighScores<S> {
    board: Leaderboard,
    store: S,
}

impl<S: ScoreStore> HighScores<S> {
    /// Load the persisted board, falling back to an empty one when the
    /// stored data is absent, unreadable, or malformed
    pub fn load(store: S) -> Self {
        let board = match store.get(SCORES_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<HighScoreRecord>>(&raw) {
                Ok(records) => {
                    tracing::debug!(count = records.len(), "loaded high scores");
                    Leaderboard::from_records(records, DEFAULT_CAPACITY)
                }
                Err(err) => {
                    tracing::warn!("malformed high score data, starting empty: {err}");
                    Leaderboard::new(DEFAULT_CAPACITY)
                }
            },
            Ok(None) => Leaderboard::new(DEFAULT_CAPACITY),
            Err(err) => {
                tracing::warn!("failed to read high scores, starting empty: {err:#}");
                Leaderboard::new(DEFAULT_CAPACITY)
            }
        };

        Self { board, store }
    }

    /// Whether a final score would earn a place on the board
    pub fn qualifies(&self, score: u32) -> bool {
        self.board.qualifies(score)
    }

    /// Record a score under the given name and persist the full board.
    ///
    /// The name is trimmed and capped at [`MAX_NAME_LEN`] characters; a
    /// name that trims to empty leaves the board untouched.
    pub fn accept(&mut self, name: &str, score: u32, date: NaiveDate) -> Result<()> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Ok(());
        }
        let name: String = trimmed.chars().take(MAX_NAME_LEN).collect();

        self.board.insert(HighScoreRecord { name, score, date });
        self.persist()
    }

    pub fn records(&self) -> &[HighScoreRecord] {
        self.board.records()
    }

    fn persist(&mut self) -> Result<()> {
        let raw = serde_json::to_string_pretty(self.board.records())
            .context("Failed to serialize high scores")?;
        self.store.put(SCORES_KEY, &raw)
    }
}
