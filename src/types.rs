//! Common types used throughout odata-extract
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Protocol Constants
// ============================================================================

/// Response header carrying the service protocol version
pub const SERVICE_VERSION_HEADER: &str = "dataserviceversion";

/// The only service protocol version this crate understands
pub const SUPPORTED_SERVICE_VERSION: &str = "2.0";

// ============================================================================
// Media Type
// ============================================================================

/// Accepted response media type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaType {
    /// JSON feed
    #[default]
    Json,
    /// XML metadata document
    Xml,
    /// Plain text (`$count`)
    Text,
}

impl MediaType {
    /// Value for the `Accept` header
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Json => "application/json",
            MediaType::Xml => "application/xml",
            MediaType::Text => "text/plain",
        }
    }
}

// ============================================================================
// Pagination Type
// ============================================================================

/// How successive pages of a partition are requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationType {
    /// Caller-driven `$skip`/`$top` paging inside a partition
    ClientOffset,
    /// Server-driven paging following continuation links
    #[default]
    ServerSide,
}

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.is_empty())
    }
}
