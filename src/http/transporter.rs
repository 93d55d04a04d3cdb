//! Authenticated HTTP GETs against the service
//!
//! Provides the single-attempt `fetch` used for probe, count and metadata
//! calls, and `fetch_with_retry` used for data pages.

use super::response::ResponseContainer;
use super::retry::RetryPolicy;
use crate::auth::Authenticator;
use crate::config::{ConnectionConfig, ProxyConfig};
use crate::error::{Error, Result};
use crate::types::{MediaType, SERVICE_VERSION_HEADER};
use reqwest::header::ACCEPT;
use reqwest::{Client, Proxy, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// HTTP transport with authentication, retry and optional proxy
#[derive(Clone)]
pub struct Transporter {
    client: Client,
    authenticator: Authenticator,
    retry: RetryPolicy,
}

impl Transporter {
    /// Create a transporter from connection settings
    pub fn new(connection: &ConnectionConfig, retry: RetryPolicy) -> Result<Self> {
        let timeout = Duration::from_secs(connection.timeout_seconds);
        let mut builder = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(format!("odata-extract/{}", env!("CARGO_PKG_VERSION")));

        if let Some(proxy) = &connection.proxy {
            builder = builder.proxy(build_proxy(proxy)?);
        }

        let client = builder.build()?;
        let authenticator = Authenticator::from_settings(&connection.auth, client.clone());

        Ok(Self::with_client(client, authenticator, retry))
    }

    /// Create a transporter around an existing client
    pub fn with_client(client: Client, authenticator: Authenticator, retry: RetryPolicy) -> Self {
        Self {
            client,
            authenticator,
            retry,
        }
    }

    /// Retry policy applied by `fetch_with_retry`
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Single GET.
    ///
    /// With bearer authentication a 403 triggers one token refresh and one
    /// repeat of the request; a second 403 is returned as is.
    pub async fn fetch(&self, url: &Url, accept: MediaType) -> Result<ResponseContainer> {
        let response = self.send(url, accept).await?;

        if response.status() == StatusCode::FORBIDDEN.as_u16() && self.authenticator.is_bearer() {
            debug!("Got 403 for {}, refreshing bearer token", url);
            self.authenticator.refresh().await?;
            return self.send(url, accept).await;
        }

        Ok(response)
    }

    /// GET a JSON data page, retrying 5xx responses and connection failures.
    ///
    /// Any other response is returned unchanged for the caller to classify.
    pub async fn fetch_with_retry(&self, url: &Url) -> Result<ResponseContainer> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            let outcome = self.fetch(url, MediaType::Json).await;

            if !self.retry.should_retry(&outcome) {
                return outcome;
            }

            let reason = match &outcome {
                Ok(response) => format!("HTTP {}", response.status()),
                Err(e) => e.to_string(),
            };

            if !self.retry.has_attempts_left(attempt) {
                let message = match outcome {
                    Ok(response) => format!("{reason}: {}", response.body_text()),
                    Err(_) => reason,
                };
                return Err(Error::RetriesExhausted {
                    url: url.to_string(),
                    attempts: attempt,
                    message,
                });
            }

            let delay = self.retry.delay_for(attempt);
            warn!(
                "Request failed with {}, attempt {}/{}, retrying in {:?}",
                reason, attempt, self.retry.max_attempts, delay
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn send(&self, url: &Url, accept: MediaType) -> Result<ResponseContainer> {
        let req = self
            .client
            .get(url.clone())
            .header(ACCEPT, accept.as_str());
        let req = self.authenticator.apply(req).await?;

        let response = req.send().await?;
        let status = response.status();
        let service_version = response
            .headers()
            .get(SERVICE_VERSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;

        debug!("GET {} -> {}", url, status.as_u16());
        Ok(ResponseContainer::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
            service_version,
            body,
        ))
    }
}

impl std::fmt::Debug for Transporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transporter")
            .field("authenticator", &self.authenticator)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

fn build_proxy(config: &ProxyConfig) -> Result<Proxy> {
    let mut proxy = Proxy::all(config.url.trim())?;
    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        if !username.is_empty() {
            proxy = proxy.basic_auth(username, password);
        }
    }
    Ok(proxy)
}
