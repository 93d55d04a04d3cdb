//! Token issuance collaborators
//!
//! Bearer authentication asks a [`TokenProvider`] for access tokens. Token
//! issuance itself (assertion signing, credential storage) happens outside
//! this crate; providers only fetch or hand over the result.

use super::types::CachedToken;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// SAML bearer grant type used for assertion exchange
pub const SAML2_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:saml2-bearer";

/// Source of bearer access tokens
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Obtain a fresh access token
    async fn fetch_token(&self) -> Result<CachedToken>;
}

// ============================================================================
// Static Token
// ============================================================================

/// Hands out a pre-issued token
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    /// Create a provider for a fixed token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn fetch_token(&self) -> Result<CachedToken> {
        Ok(CachedToken::new(self.token.clone(), None))
    }
}

// ============================================================================
// SAML Bearer Assertion Exchange
// ============================================================================

/// Exchanges a signed SAML assertion for an access token
#[derive(Debug, Clone)]
pub struct SamlBearerTokenProvider {
    http_client: Client,
    token_url: String,
    client_id: String,
    company_id: String,
    assertion: String,
}

impl SamlBearerTokenProvider {
    /// Create a provider posting to `token_url`
    pub fn new(
        http_client: Client,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        company_id: impl Into<String>,
        assertion: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            token_url: token_url.into(),
            client_id: client_id.into(),
            company_id: company_id.into(),
            assertion: assertion.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for SamlBearerTokenProvider {
    async fn fetch_token(&self) -> Result<CachedToken> {
        let form = [
            ("client_id", self.client_id.as_str()),
            ("company_id", self.company_id.as_str()),
            ("grant_type", SAML2_BEARER_GRANT),
            ("assertion", self.assertion.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(Error::Http)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::token(format!(
                "Token request failed with status {status}: {body}"
            )));
        }

        let token_response: TokenResponse = response.json().await.map_err(Error::Http)?;
        Ok(token_response.into_cached_token())
    }
}

/// OAuth2 token response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_cached_token(self) -> CachedToken {
        match self.expires_in {
            Some(secs) => CachedToken::expires_in(self.access_token, secs),
            None => CachedToken::new(self.access_token, None),
        }
    }
}
