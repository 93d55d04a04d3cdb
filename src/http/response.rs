//! Buffered HTTP response

use crate::error::Result;
use bytes::Bytes;
use serde::de::DeserializeOwned;

/// Everything the caller needs from one HTTP exchange, fully buffered
#[derive(Debug, Clone)]
pub struct ResponseContainer {
    status: u16,
    status_message: String,
    service_version: Option<String>,
    body: Bytes,
}

impl ResponseContainer {
    /// Create a response container
    pub fn new(
        status: u16,
        status_message: impl Into<String>,
        service_version: Option<String>,
        body: impl Into<Bytes>,
    ) -> Self {
        Self {
            status,
            status_message: status_message.into(),
            service_version,
            body: body.into(),
        }
    }

    /// HTTP status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Canonical reason phrase for the status
    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// Value of the service version header, if present
    pub fn service_version(&self) -> Option<&str> {
        self.service_version.as_deref()
    }

    /// Raw body bytes
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body decoded as UTF-8 (lossy)
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parse the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Check for a 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
