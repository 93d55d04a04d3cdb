//! HTTP transport module
//!
//! Provides the authenticated transporter used for every service call.
//!
//! # Features
//!
//! - **Single-attempt fetch** for probe, count and metadata calls
//! - **Retrying fetch** for data pages, driven by a [`RetryPolicy`]
//! - **Backoff Strategies**: Constant, linear, and exponential backoff
//! - **Bearer refresh**: one token refresh and repeat on HTTP 403
//! - **Proxy** with optional basic credentials

mod response;
mod retry;
mod transporter;

pub use response::ResponseContainer;
pub use retry::RetryPolicy;
pub use transporter::Transporter;

#[cfg(test)]
mod tests;
