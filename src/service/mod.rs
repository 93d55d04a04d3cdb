//! Extraction service module
//!
//! Ties the components together:
//!
//! - **URLs** for the probe, count, metadata and data calls
//! - **Response classification** into service errors
//! - **Orchestration**: validate, probe, count, schema and partition planning
//! - **Run context** serialised for workers, which open one reader per
//!   partition

mod context;
mod extraction;
mod response;
mod urls;

pub use context::RunContext;
pub use extraction::ExtractionService;
pub use response::{check_response, check_status, check_version};
pub use urls::UrlBuilder;

#[cfg(test)]
mod tests;
