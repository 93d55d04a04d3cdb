//! Authenticator implementation
//!
//! Handles applying authentication to requests and managing the cached
//! bearer token.

use super::providers::{SamlBearerTokenProvider, StaticTokenProvider, TokenProvider};
use super::types::{AuthConfig, CachedToken};
use crate::config::AuthSettings;
use crate::error::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Puts credentials on outgoing service requests
pub struct Authenticator {
    config: AuthConfig,
    /// Cached bearer token, shared by every clone of the transporter
    cached_token: Arc<RwLock<Option<CachedToken>>>,
}

impl Authenticator {
    /// Authenticator for a runtime auth config
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            cached_token: Arc::new(RwLock::new(None)),
        }
    }

    /// Build an authenticator from configuration settings.
    ///
    /// `http_client` is used for token requests.
    pub fn from_settings(settings: &AuthSettings, http_client: Client) -> Self {
        let config = match settings {
            AuthSettings::Basic { username, password } => AuthConfig::basic(username, password),
            AuthSettings::Bearer { token } => AuthConfig::bearer(StaticTokenProvider::new(token)),
            AuthSettings::SamlBearer {
                token_url,
                client_id,
                company_id,
                assertion,
            } => AuthConfig::bearer(SamlBearerTokenProvider::new(
                http_client,
                token_url,
                client_id,
                company_id,
                assertion,
            )),
        };
        Self::new(config)
    }

    /// Whether requests carry a bearer token
    pub fn is_bearer(&self) -> bool {
        matches!(self.config, AuthConfig::Bearer { .. })
    }

    /// Add the `Authorization` header to a request
    pub async fn apply(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        match &self.config {
            AuthConfig::Basic { username, password } => {
                Ok(req.header(AUTHORIZATION, basic_header(username, password)))
            }
            AuthConfig::Bearer { provider } => {
                let token = self.bearer_token(provider.as_ref()).await?;
                Ok(req.bearer_auth(token))
            }
        }
    }

    /// Replace the cached token with a freshly issued one.
    ///
    /// No-op for basic authentication.
    pub async fn refresh(&self) -> Result<()> {
        let AuthConfig::Bearer { provider } = &self.config else {
            return Ok(());
        };

        let new_token = provider.fetch_token().await?;
        *self.cached_token.write().await = Some(new_token);
        debug!("Bearer token refreshed");
        Ok(())
    }

    /// Cached token while it is fresh, otherwise a newly issued one.
    ///
    /// The cache is re-checked under the write lock so concurrent readers
    /// waiting on an expired token trigger one issuance.
    async fn bearer_token(&self, provider: &dyn TokenProvider) -> Result<String> {
        if let Some(token) = fresh(self.cached_token.read().await.as_ref()) {
            return Ok(token);
        }

        let mut cached = self.cached_token.write().await;
        if let Some(token) = fresh(cached.as_ref()) {
            return Ok(token);
        }

        let issued = provider.fetch_token().await?;
        debug!("Issued bearer token, expires at {:?}", issued.expires_at);
        let token = issued.token.clone();
        *cached = Some(issued);
        Ok(token)
    }
}

fn fresh(token: Option<&CachedToken>) -> Option<String> {
    token.filter(|t| !t.is_expired()).map(|t| t.token.clone())
}

impl Clone for Authenticator {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            cached_token: Arc::clone(&self.cached_token),
        }
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// `Basic <base64(username:password)>`
pub fn basic_header(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}
