// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # odata-extract
//!
//! Bulk extraction of entity data from OData v2 catalog services.
//!
//! ## Features
//!
//! - **Metadata-driven schemas**: default, expand and select modes derived
//!   from the service metadata document
//! - **Partitioned reads**: row ranges sized for parallel workers
//! - **Two paging strategies**: client `$skip`/`$top` or server cursors
//! - **Retrying transport**: backoff on 5xx, bearer refresh on 403
//! - **Arrow Output**: transformed records as Arrow `RecordBatch`es
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use odata_extract::{AuthSettings, ExtractionConfig, ExtractionService, RunContext, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ExtractionConfig::new(
//!         "https://api.example.com/odata/v2",
//!         "Products",
//!         AuthSettings::basic("user", "secret"),
//!     );
//!
//!     // Orchestrator: validate, count, derive schema, plan partitions
//!     let context = ExtractionService::new(config)?.prepare().await?;
//!     let handoff = context.to_json()?;
//!
//!     // Worker: one reader per partition
//!     let context = RunContext::from_json(&handoff)?;
//!     for partition in &context.partitions {
//!         let mut reader = context.reader(partition)?;
//!         while let Some(record) = reader.next_record().await? {
//!             // Process record
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      ExtractionService                          │
//! │  check_url()   total_row_count()   build_schema()   prepare()   │
//! │  RunContext::reader(partition) → RecordReader → Record          │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │ Metadata │   HTTP    │   Paginate    │ Partition │  Transform  │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ EDMX     │ Basic     │ Offset        │ 10k rows  │ Coercion    │
//! │ Schema   │ Bearer    │ Cursor        │ 1k batch  │ Records     │
//! │ Columns  │ Retry     │ Progress      │           │ Arrow       │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the crate
pub mod error;

/// Common types and type aliases
pub mod types;

/// Extraction configuration
pub mod config;

/// Authentication implementations
pub mod auth;

/// HTTP transport with retry and bearer refresh
pub mod http;

/// Service metadata documents
pub mod metadata;

/// Output schema derivation
pub mod schema;

/// Row-range partitioning
pub mod partition;

/// JSON feed decoding
pub mod decode;

/// Pagination strategies and record readers
pub mod pagination;

/// Raw entries to typed records
pub mod transform;

/// Arrow output
pub mod output;

/// Extraction orchestration
pub mod service;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::{AuthSettings, ExtractionConfig};
pub use service::{ExtractionService, RunContext};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
