//! Pagination module
//!
//! Supports: client offset ranges, server continuation links
//!
//! # Overview
//!
//! A [`RecordReader`] drives one partition through a [`Paginator`]
//! strategy chosen at construction. It holds at most one page in memory and
//! issues one request at a time.

mod reader;
mod strategies;
mod types;

pub use reader::{ReaderState, RecordReader};
pub use strategies::{CursorPaginator, OffsetPaginator};
pub use types::{PageFetcher, PageRequest, Paginator, Progress};
