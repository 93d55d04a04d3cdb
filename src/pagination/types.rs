//! Pagination types and traits
//!
//! Defines the paginator abstraction both strategies implement and the
//! page-fetching seam the reader drives.

use crate::decode::FeedPage;
use crate::error::Result;
use async_trait::async_trait;

/// What the next page request looks like
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    /// Client-driven range
    Offset {
        /// Rows to skip
        skip: u64,
        /// Rows to fetch
        top: u64,
    },
    /// First server-driven page, no skip or top
    FirstPage,
    /// Follow a server-issued continuation URL
    Continuation(String),
}

/// Read progress of one reader
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progress {
    /// Share of the partition processed, between 0 and 1
    Fraction(f32),
    /// No known total
    Indeterminate,
}

/// Pagination strategy, chosen once when a reader is built
pub trait Paginator: Send + Sync + std::fmt::Debug {
    /// Request for the next page, or `None` once the strategy is exhausted
    fn next_request(&self) -> Option<PageRequest>;

    /// Record a fetched page: its entry count and continuation link
    fn record_page(&mut self, entries: usize, next_link: Option<&str>);

    /// Progress so far
    fn progress(&self) -> Progress;

    /// Whether no further request will be issued
    fn is_done(&self) -> bool {
        self.next_request().is_none()
    }
}

/// Fetches and parses one page of raw entries
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Issue one page request
    async fn fetch_page(&self, request: &PageRequest) -> Result<FeedPage>;
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for std::sync::Arc<T> {
    async fn fetch_page(&self, request: &PageRequest) -> Result<FeedPage> {
        (**self).fetch_page(request).await
    }
}
