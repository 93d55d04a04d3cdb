//! Output module
//!
//! Materialises transformed records as Arrow record batches.
//!
//! # Overview
//!
//! - Mapping output schemas to Arrow schemas
//! - Converting records to Arrow RecordBatches, nested records as structs
//!   and collections as lists of structs

mod batch;
mod schema;

pub use batch::records_to_batch;
pub use schema::{to_arrow_schema, to_arrow_type, LIST_ITEM_NAME, TIMESTAMP_TIMEZONE};
