//! Row range partitioning
//!
//! Splits a run's total row count into bounded ranges that independent
//! readers fetch and retry on their own.

mod builder;
mod types;

pub use builder::PartitionBuilder;
pub use types::{Partition, MAX_BATCH_SIZE, MAX_ROWS_PER_SPLIT};
