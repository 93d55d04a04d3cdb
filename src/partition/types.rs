//! Partition types

use serde::{Deserialize, Serialize};

/// Upper bound for rows fetched by one request
pub const MAX_BATCH_SIZE: u64 = 1000;

/// Upper bound for rows covered by one partition
pub const MAX_ROWS_PER_SPLIT: u64 = 10_000;

/// A 1-based, inclusive row range fetched in batches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    /// First row, 1-based
    pub start: u64,
    /// Last row, inclusive
    pub end: u64,
    /// Rows requested per page
    pub batch_size: u64,
}

impl Partition {
    /// Create a partition
    pub fn new(start: u64, end: u64, batch_size: u64) -> Self {
        Self {
            start,
            end,
            batch_size,
        }
    }

    /// Number of rows covered
    pub fn len(&self) -> u64 {
        (self.end + 1).saturating_sub(self.start)
    }

    /// Whether the range covers no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}..={}] by {}", self.start, self.end, self.batch_size)
    }
}
