//! Pagination strategy implementations

use super::types::{PageRequest, Paginator, Progress};
use crate::partition::Partition;

// ============================================================================
// Offset Pagination
// ============================================================================

/// Client-driven pagination over one partition
///
/// Each request skips `start + processed - 1` rows and fetches at most one
/// batch of the rows remaining in the partition.
#[derive(Debug, Clone)]
pub struct OffsetPaginator {
    start: u64,
    end: u64,
    batch_size: u64,
    processed: u64,
    exhausted: bool,
}

impl OffsetPaginator {
    /// Create a paginator for a partition
    pub fn new(partition: &Partition) -> Self {
        Self {
            start: partition.start,
            end: partition.end,
            batch_size: partition.batch_size.max(1),
            processed: 0,
            exhausted: false,
        }
    }

    /// Rows covered by the partition
    pub fn len(&self) -> u64 {
        (self.end + 1).saturating_sub(self.start)
    }

    /// Whether the partition covers no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rows processed so far
    pub fn processed(&self) -> u64 {
        self.processed
    }
}

impl Paginator for OffsetPaginator {
    fn next_request(&self) -> Option<PageRequest> {
        let remaining = self.len().saturating_sub(self.processed);
        if self.exhausted || remaining == 0 {
            return None;
        }

        Some(PageRequest::Offset {
            skip: self.start + self.processed - 1,
            top: remaining.min(self.batch_size),
        })
    }

    fn record_page(&mut self, entries: usize, _next_link: Option<&str>) {
        // An empty page means the service has fewer rows than counted
        if entries == 0 {
            self.exhausted = true;
        }
        self.processed += entries as u64;
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn progress(&self) -> Progress {
        if self.is_empty() {
            return Progress::Fraction(1.0);
        }
        Progress::Fraction((self.processed as f64 / self.len() as f64).min(1.0) as f32)
    }
}

// ============================================================================
// Cursor Pagination
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Cursor {
    First,
    Next(String),
    Done,
}

/// Server-driven pagination following continuation links
///
/// The first request carries no skip or top; every later request follows
/// the link returned with the previous page. Stops on a page without a link
/// or without entries.
#[derive(Debug, Clone)]
pub struct CursorPaginator {
    cursor: Cursor,
    fetched: u64,
}

impl CursorPaginator {
    /// Create a paginator positioned before the first page
    pub fn new() -> Self {
        Self {
            cursor: Cursor::First,
            fetched: 0,
        }
    }

    /// Entries fetched so far
    pub fn fetched(&self) -> u64 {
        self.fetched
    }
}

impl Default for CursorPaginator {
    fn default() -> Self {
        Self::new()
    }
}

impl Paginator for CursorPaginator {
    fn next_request(&self) -> Option<PageRequest> {
        match &self.cursor {
            Cursor::First => Some(PageRequest::FirstPage),
            Cursor::Next(url) => Some(PageRequest::Continuation(url.clone())),
            Cursor::Done => None,
        }
    }

    fn record_page(&mut self, entries: usize, next_link: Option<&str>) {
        self.fetched += entries as u64;
        self.cursor = match next_link {
            Some(link) if entries > 0 && !link.is_empty() => Cursor::Next(link.to_string()),
            _ => Cursor::Done,
        };
    }

    fn progress(&self) -> Progress {
        Progress::Indeterminate
    }
}
