//! Run context handed from the orchestrator to workers

use super::extraction::ExtractionService;
use crate::config::ExtractionConfig;
use crate::error::{Error, Result};
use crate::pagination::RecordReader;
use crate::partition::Partition;
use crate::schema::OutputSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Everything a worker needs to read its partitions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunContext {
    /// Extraction configuration
    pub config: ExtractionConfig,
    /// Planned partitions
    pub partitions: Vec<Partition>,
    /// Base64 metadata document
    pub encoded_metadata: String,
    /// Output schema shared by all partitions
    pub schema: OutputSchema,
}

impl RunContext {
    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Rebuild a service and open a reader over one partition
    pub fn reader(&self, partition: &Partition) -> Result<RecordReader<ExtractionService>> {
        let metadata = ExtractionService::decode_metadata(&self.encoded_metadata)?;
        let service =
            ExtractionService::new(self.config.clone())?.with_metadata(Arc::new(metadata));
        Ok(self.reader_with(service, partition))
    }

    /// Open a reader over one partition with an existing service
    pub fn reader_with(
        &self,
        service: ExtractionService,
        partition: &Partition,
    ) -> RecordReader<ExtractionService> {
        RecordReader::for_pagination(
            service,
            Arc::new(self.schema.clone()),
            self.config.pagination,
            partition,
        )
    }

    /// Partition at `index`
    pub fn partition(&self, index: usize) -> Result<&Partition> {
        self.partitions.get(index).ok_or_else(|| {
            Error::Other(format!(
                "partition {index} out of range, run has {}",
                self.partitions.len()
            ))
        })
    }
}
