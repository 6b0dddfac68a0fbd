//! Persistent local high scores
//!
//! A bounded leaderboard sorted by score descending, kept in sync with a
//! key-value persistence collaborator across runs.

pub mod board;
pub mod store;

pub use board::{DEFAULT_CAPACITY, HighScoreRecord, Leaderboard, MAX_NAME_LEN};
pub use store::{HighScores, JsonFileStore, MemoryStore, ScoreStore};
