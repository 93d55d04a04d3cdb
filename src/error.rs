//! Error types for odata-extract
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Errors fall into five categories, see [`ErrorKind`]: transport failures,
//! service-reported failures, schema derivation failures, configuration
//! validation failures, and data (decode/transform/output) failures.

use std::fmt;
use thiserror::Error;

/// Configuration option an error can be attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigField {
    /// Service base URL
    BaseUrl,
    /// Entity name
    EntityName,
    /// Associated entity name
    AssociatedEntityName,
    /// Username/password or token settings
    Credentials,
    /// Filter option
    Filter,
    /// Select option
    Select,
    /// Expand option
    Expand,
    /// Proxy settings
    Proxy,
    /// Retry settings
    Retry,
}

impl ConfigField {
    /// Name of the option as it appears in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BaseUrl => "base_url",
            Self::EntityName => "entity_name",
            Self::AssociatedEntityName => "associated_entity_name",
            Self::Credentials => "credentials",
            Self::Filter => "filter",
            Self::Select => "select",
            Self::Expand => "expand",
            Self::Proxy => "proxy",
            Self::Retry => "retry",
        }
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broad category of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network or IO failure
    Transport,
    /// Unexpected status or structured error payload from the service
    Service,
    /// Schema could not be derived
    Schema,
    /// Configuration is invalid
    Validation,
    /// Payload could not be decoded, transformed or materialised
    Data,
}

/// Structured error payload returned by the remote service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteError {
    /// Remote error code
    pub code: Option<String>,
    /// Human readable message
    pub message: Option<String>,
    /// Transaction id from the inner error block
    pub transaction_id: Option<String>,
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(code) = &self.code {
            parts.push(format!("code: {code}"));
        }
        if let Some(message) = &self.message {
            parts.push(format!("message: {message}"));
        }
        if let Some(id) = &self.transaction_id {
            parts.push(format!("transaction id: {id}"));
        }
        f.write_str(&parts.join(", "))
    }
}

/// Failure reported by the remote service
#[derive(Debug, Clone)]
pub struct ServiceError {
    /// HTTP status, if the failure came from a response
    pub status: Option<u16>,
    /// Description of what went wrong
    pub message: String,
    /// Parsed remote error payload
    pub remote: Option<RemoteError>,
    /// Configuration option most likely responsible
    pub config_field: Option<ConfigField>,
}

impl ServiceError {
    /// Create a service error without a status code
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            remote: None,
            config_field: None,
        }
    }

    /// Attach the HTTP status
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach the remote error payload
    #[must_use]
    pub fn with_remote(mut self, remote: RemoteError) -> Self {
        self.remote = Some(remote);
        self
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(remote) = &self.remote {
            write!(f, " ({remote})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ServiceError {}

/// A single configuration validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    /// Offending option
    pub field: ConfigField,
    /// What is wrong with it
    pub message: String,
}

impl ValidationFailure {
    /// Create a validation failure
    pub fn new(field: ConfigField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_failures(failures: &[ValidationFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// The main error type for odata-extract
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request to {url} failed after {attempts} attempts: {message}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        message: String,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Service Errors
    // ============================================================================
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Token request failed: {message}")]
    TokenRequest { message: String },

    #[error("Failed to parse metadata document: {message}")]
    MetadataParse { message: String },

    #[error("Failed to decode metadata: {message}")]
    MetadataDecode { message: String },

    // ============================================================================
    // Schema Errors
    // ============================================================================
    #[error("Schema error: {message}")]
    Schema {
        message: String,
        config_field: Option<ConfigField>,
    },

    // ============================================================================
    // Validation Errors
    // ============================================================================
    #[error("Invalid configuration: {}", join_failures(.0))]
    Validation(Vec<ValidationFailure>),

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // ============================================================================
    // Data Errors
    // ============================================================================
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    #[error("Failed to transform field '{field}': {message}")]
    Transform { field: String, message: String },

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Output error: {message}")]
    Output { message: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a service error
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service(ServiceError::new(message))
    }

    /// Create a schema error
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
            config_field: None,
        }
    }

    /// Create a schema error for a mode that resolved no columns
    pub fn no_columns(option: &str, entity: &str) -> Self {
        Self::schema(format!(
            "no columns found for {option} in entity '{entity}'"
        ))
    }

    /// Create a schema error for an associated entity that cannot be expanded
    pub fn unsupported_associated_entity(associated: &str, entity: &str) -> Self {
        Self::Schema {
            message: format!(
                "associated entity '{associated}' is not supported by entity '{entity}'"
            ),
            config_field: Some(ConfigField::AssociatedEntityName),
        }
    }

    /// Create a metadata parse error
    pub fn metadata_parse(message: impl Into<String>) -> Self {
        Self::MetadataParse {
            message: message.into(),
        }
    }

    /// Create a token request error
    pub fn token(message: impl Into<String>) -> Self {
        Self::TokenRequest {
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a transform error
    pub fn transform(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transform {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Http(_) | Error::RetriesExhausted { .. } => ErrorKind::Transport,
            Error::Service(_)
            | Error::TokenRequest { .. }
            | Error::MetadataParse { .. }
            | Error::MetadataDecode { .. } => ErrorKind::Service,
            Error::Schema { .. } => ErrorKind::Schema,
            Error::Validation(_) | Error::YamlParse(_) | Error::InvalidUrl(_) => {
                ErrorKind::Validation
            }
            _ => ErrorKind::Data,
        }
    }

    /// HTTP status carried by a service error
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Service(e) => e.status,
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Configuration option this error is attributed to
    pub fn config_field(&self) -> Option<ConfigField> {
        match self {
            Error::Service(e) => e.config_field,
            Error::Schema { config_field, .. } => *config_field,
            _ => None,
        }
    }

    /// Attribute a service or schema error to a configuration option.
    ///
    /// An existing attribution is kept; other error kinds pass through.
    #[must_use]
    pub fn with_config_field(self, field: ConfigField) -> Self {
        match self {
            Error::Service(mut e) => {
                e.config_field.get_or_insert(field);
                Error::Service(e)
            }
            Error::Schema {
                message,
                config_field,
            } => Error::Schema {
                message,
                config_field: config_field.or(Some(field)),
            },
            other => other,
        }
    }

    /// Check if this error is retryable on the data-fetch path
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_connect() || e.is_timeout(),
            Error::Service(ServiceError {
                status: Some(status),
                ..
            }) => is_retryable_status(*status),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is retryable
pub(crate) fn is_retryable_status(status: u16) -> bool {
    (500..600).contains(&status)
}

/// Result type alias for odata-extract
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
