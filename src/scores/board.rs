use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Maximum number of records the board keeps
pub const DEFAULT_CAPACITY: usize = 5;

/// Maximum length of a recorded player name, in characters
pub const MAX_NAME_LEN: usize = 15;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreRecord {
    pub name: String,
    pub score: u32,
    pub date: NaiveDate,
}

/// Bounded list of high score records, sorted by score descending.
///
/// Records tied on score keep insertion order (earlier entries first).
#[derive(Debug, Clone, PartialEq)]
pub struct Leaderboard {
    records: Vec<HighScoreRecord>,
    capacity: usize,
}

impl Leaderboard {
    /// Create an empty board with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Vec::new(),
            capacity,
        }
    }

    /// Build a board from loaded records, restoring the sorted and
    /// bounded invariants regardless of the state they were stored in
    pub fn from_records(records: Vec<HighScoreRecord>, capacity: usize) -> Self {
        let mut board = Self { records, capacity };
        board.restore_invariants();
        board
    }

    /// Whether a candidate score would earn a place on the board.
    ///
    /// A score of 0 never qualifies. At capacity the candidate must beat
    /// the current minimum strictly; a tie does not displace the holder.
    pub fn qualifies(&self, score: u32) -> bool {
        if score == 0 {
            return false;
        }
        if self.records.len() < self.capacity {
            return true;
        }
        match self.records.last() {
            Some(lowest) => score > lowest.score,
            None => true,
        }
    }

    /// Insert a record, keeping the board sorted and within capacity
    pub fn insert(&mut self, record: HighScoreRecord) {
        self.records.push(record);
        self.restore_invariants();
    }

    pub fn records(&self) -> &[HighScoreRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn restore_invariants(&mut self) {
        // Stable sort: ties keep earlier insertions ahead
        self.records.sort_by(|a, b| b.score.cmp(&a.score));
        self.records.truncate(self.capacity);
    }
}

impl Default for Leaderboard {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
