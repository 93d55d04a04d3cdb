//! Row range splitting

use super::types::{Partition, MAX_BATCH_SIZE, MAX_ROWS_PER_SPLIT};
use tracing::debug;

/// Splits a total row count into contiguous partitions
#[derive(Debug, Clone, Copy, Default)]
pub struct PartitionBuilder;

impl PartitionBuilder {
    /// Create a builder
    pub fn new() -> Self {
        Self
    }

    /// Split `[1, total]` into ordered, non-overlapping partitions.
    ///
    /// No partition spans more than 10,000 rows and no batch exceeds 1,000.
    /// The last partition is clamped to `total` and its batch shrunk to fit.
    /// A total of zero yields no partitions.
    pub fn build_splits(&self, total: u64) -> Vec<Partition> {
        if total == 0 {
            return Vec::new();
        }

        let batch_size = total.min(MAX_BATCH_SIZE);
        let optimal_load = total.min(MAX_ROWS_PER_SPLIT);
        let split_count = total.div_ceil(optimal_load);

        let mut partitions = Vec::with_capacity(usize::try_from(split_count).unwrap_or_default());
        let mut previous_end = 0;

        for split in 1..=split_count {
            let start = previous_end + 1;
            let mut end = start - 1 + optimal_load;
            let mut batch = batch_size;

            if split == split_count {
                end = total;
                batch = batch.min(end - start + 1);
            }

            partitions.push(Partition::new(start, end, batch));
            previous_end = end;
        }

        debug!("Split {} rows into {} partitions", total, partitions.len());
        partitions
    }
}
