//! Pull-based record reader

use super::strategies::{CursorPaginator, OffsetPaginator};
use super::types::{PageFetcher, Paginator, Progress};
use crate::error::Result;
use crate::partition::Partition;
use crate::schema::OutputSchema;
use crate::transform::{Record, Transformer};
use crate::types::{JsonObject, PaginationType};
use futures::stream::{self, Stream};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// Reader lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// Nothing fetched yet
    Init,
    /// Buffer exhausted, next call fetches
    Fetching,
    /// Serving records from the buffered page
    Emitting,
    /// End of stream
    Done,
}

/// Reads one partition record by record, fetching a page only when the
/// buffered one is exhausted
pub struct RecordReader<F> {
    fetcher: F,
    paginator: Box<dyn Paginator>,
    schema: Arc<OutputSchema>,
    transformer: Transformer,
    buffer: VecDeque<JsonObject>,
    state: ReaderState,
    fetches: u64,
}

impl<F: PageFetcher> RecordReader<F> {
    /// Create a reader with an explicit strategy
    pub fn new(fetcher: F, schema: Arc<OutputSchema>, paginator: Box<dyn Paginator>) -> Self {
        Self {
            fetcher,
            paginator,
            schema,
            transformer: Transformer::new(),
            buffer: VecDeque::new(),
            state: ReaderState::Init,
            fetches: 0,
        }
    }

    /// Client-offset reader over a partition
    pub fn offset(fetcher: F, schema: Arc<OutputSchema>, partition: &Partition) -> Self {
        Self::new(fetcher, schema, Box::new(OffsetPaginator::new(partition)))
    }

    /// Server-cursor reader
    pub fn cursor(fetcher: F, schema: Arc<OutputSchema>) -> Self {
        Self::new(fetcher, schema, Box::new(CursorPaginator::new()))
    }

    /// Reader for the configured pagination type
    pub fn for_pagination(
        fetcher: F,
        schema: Arc<OutputSchema>,
        pagination: PaginationType,
        partition: &Partition,
    ) -> Self {
        match pagination {
            PaginationType::ClientOffset => Self::offset(fetcher, schema, partition),
            PaginationType::ServerSide => Self::cursor(fetcher, schema),
        }
    }

    /// Next transformed record, or `None` at end of stream.
    ///
    /// A failed fetch ends the stream and surfaces the error.
    pub async fn next_record(&mut self) -> Result<Option<Record>> {
        loop {
            match self.state {
                ReaderState::Done => return Ok(None),
                ReaderState::Emitting => {
                    if let Some(raw) = self.buffer.pop_front() {
                        return self.transformer.transform(&self.schema, &raw).map(Some);
                    }
                    self.state = if self.paginator.is_done() {
                        ReaderState::Done
                    } else {
                        ReaderState::Fetching
                    };
                }
                ReaderState::Init | ReaderState::Fetching => {
                    let Some(request) = self.paginator.next_request() else {
                        self.state = ReaderState::Done;
                        continue;
                    };

                    let page = match self.fetcher.fetch_page(&request).await {
                        Ok(page) => page,
                        Err(e) => {
                            self.state = ReaderState::Done;
                            return Err(e);
                        }
                    };
                    self.fetches += 1;
                    debug!("Fetched page {} with {} entries", self.fetches, page.len());

                    self.paginator
                        .record_page(page.len(), page.next_link.as_deref());
                    self.buffer.extend(page.entries);
                    self.state = ReaderState::Emitting;
                }
            }
        }
    }

    /// Read every remaining record
    pub async fn collect_all(&mut self) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        while let Some(record) = self.next_record().await? {
            records.push(record);
        }
        Ok(records)
    }

    /// Adapt the reader into a stream of records
    pub fn into_stream(self) -> impl Stream<Item = Result<Record>> {
        stream::unfold(self, |mut reader| async move {
            match reader.next_record().await {
                Ok(Some(record)) => Some((Ok(record), reader)),
                Ok(None) => None,
                Err(e) => Some((Err(e), reader)),
            }
        })
    }

    /// Progress through the partition
    pub fn progress(&self) -> Progress {
        self.paginator.progress()
    }

    /// Current lifecycle state
    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Pages fetched so far
    pub fn fetch_count(&self) -> u64 {
        self.fetches
    }

    /// Schema records are shaped by
    pub fn schema(&self) -> &OutputSchema {
        &self.schema
    }
}

impl<F> std::fmt::Debug for RecordReader<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordReader")
            .field("paginator", &self.paginator)
            .field("state", &self.state)
            .field("buffered", &self.buffer.len())
            .field("fetches", &self.fetches)
            .finish_non_exhaustive()
    }
}
