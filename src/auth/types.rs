//! Auth configuration types
//!
//! These types represent the runtime auth configuration built from
//! [`AuthSettings`](crate::config::AuthSettings).

use super::providers::TokenProvider;
use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::sync::Arc;

/// Authentication configuration
#[derive(Clone)]
pub enum AuthConfig {
    /// HTTP Basic authentication
    Basic {
        /// Username
        username: String,
        /// Password
        password: String,
    },

    /// Bearer token issued by an external collaborator
    Bearer {
        /// Source of access tokens
        provider: Arc<dyn TokenProvider>,
    },
}

impl AuthConfig {
    /// Basic authentication
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Bearer authentication backed by a token provider
    pub fn bearer(provider: impl TokenProvider + 'static) -> Self {
        Self::Bearer {
            provider: Arc::new(provider),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthConfig::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
            AuthConfig::Bearer { .. } => f.debug_struct("Bearer").finish_non_exhaustive(),
        }
    }
}

/// A token is treated as expired this long before its actual expiry
const EXPIRY_SKEW_SECS: i64 = 30;

/// Bearer token as issued, with its expiry if the issuer reported one
#[derive(Debug, Clone)]
pub struct CachedToken {
    /// Token value sent in the `Authorization` header
    pub token: String,
    /// Expiry instant; `None` means the token never expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    /// Token with an explicit expiry
    pub fn new(token: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { token, expires_at }
    }

    /// Token valid for `seconds` from now, as reported by `expires_in`
    pub fn expires_in(token: String, seconds: i64) -> Self {
        Self::new(token, Some(Utc::now() + Duration::seconds(seconds)))
    }

    /// Whether the token is expired or about to expire
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|at| Utc::now() + Duration::seconds(EXPIRY_SKEW_SECS) >= at)
    }
}
