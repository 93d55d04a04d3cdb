//! Extraction configuration
//!
//! A run is described by a single [`ExtractionConfig`], loadable from YAML
//! or JSON. The same structure is JSON-encoded into the run context handed
//! to workers.
//!
//! Option text is normalised on read: filter line breaks become spaces and
//! select/expand lists lose all whitespace.

use crate::error::{ConfigField, Error, Result, ValidationFailure};
use crate::types::{BackoffType, OptionStringExt, PaginationType};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use url::Url;

/// Entity names carrying a key predicate, e.g. `User('42')`
static KEY_PREDICATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(.*\)").expect("valid regex"));

// ============================================================================
// Top-Level Extraction Config
// ============================================================================

/// Complete configuration of one extraction run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// How to reach the service
    pub connection: ConnectionConfig,

    /// Entity set to extract
    #[serde(default)]
    pub entity_name: String,

    /// Associated entity fetched together with the main entity
    #[serde(default)]
    pub associated_entity_name: Option<String>,

    /// `$filter` expression
    #[serde(default)]
    pub filter: Option<String>,

    /// Comma-separated `$select` list
    #[serde(default)]
    pub select: Option<String>,

    /// Comma-separated `$expand` paths
    #[serde(default)]
    pub expand: Option<String>,

    /// Paging mode inside a partition
    #[serde(default)]
    pub pagination: PaginationType,

    /// Retry behaviour for data pages
    #[serde(default)]
    pub retry: RetryConfig,
}

impl ExtractionConfig {
    /// Create a config for an entity with default options
    pub fn new(
        base_url: impl Into<String>,
        entity_name: impl Into<String>,
        auth: AuthSettings,
    ) -> Self {
        Self {
            connection: ConnectionConfig {
                base_url: base_url.into(),
                auth,
                proxy: None,
                timeout_seconds: default_timeout(),
            },
            entity_name: entity_name.into(),
            associated_entity_name: None,
            filter: None,
            select: None,
            expand: None,
            pagination: PaginationType::default(),
            retry: RetryConfig::default(),
        }
    }

    /// Parse a config from YAML
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse a config from JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encode the config as JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Set the `$filter` expression
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Set the `$select` list
    #[must_use]
    pub fn with_select(mut self, select: impl Into<String>) -> Self {
        self.select = Some(select.into());
        self
    }

    /// Set the `$expand` paths
    #[must_use]
    pub fn with_expand(mut self, expand: impl Into<String>) -> Self {
        self.expand = Some(expand.into());
        self
    }

    /// Set the associated entity
    #[must_use]
    pub fn with_associated_entity(mut self, name: impl Into<String>) -> Self {
        self.associated_entity_name = Some(name.into());
        self
    }

    /// Set the paging mode
    #[must_use]
    pub fn with_pagination(mut self, pagination: PaginationType) -> Self {
        self.pagination = pagination;
        self
    }

    /// Set the retry behaviour
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Route requests through a proxy
    #[must_use]
    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.connection.proxy = Some(proxy);
        self
    }

    // ========================================================================
    // Normalised accessors
    // ========================================================================

    /// Entity name without surrounding whitespace
    pub fn entity_name(&self) -> &str {
        self.entity_name.trim()
    }

    /// Associated entity name, if set and non-blank
    pub fn associated_entity(&self) -> Option<&str> {
        self.associated_entity_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Filter expression with line breaks folded into spaces
    pub fn filter_option(&self) -> Option<String> {
        self.filter
            .as_deref()
            .map(|f| f.replace("\r\n", " ").replace(['\n', '\r'], " ").trim().to_string())
            .none_if_empty()
    }

    /// Select list with all whitespace removed
    pub fn select_option(&self) -> Option<String> {
        self.select.as_deref().map(strip_whitespace).none_if_empty()
    }

    /// Expand paths with all whitespace removed
    pub fn expand_option(&self) -> Option<String> {
        self.expand.as_deref().map(strip_whitespace).none_if_empty()
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Check the config without touching the network.
    ///
    /// Every failure is collected and reported together.
    pub fn validate(&self) -> Result<()> {
        let mut failures = Vec::new();

        let base_url = self.connection.base_url.trim();
        if base_url.is_empty() {
            failures.push(ValidationFailure::new(ConfigField::BaseUrl, "is required"));
        } else if let Err(e) = Url::parse(base_url) {
            failures.push(ValidationFailure::new(
                ConfigField::BaseUrl,
                format!("'{base_url}' is not a valid URL: {e}"),
            ));
        }

        let entity = self.entity_name();
        if entity.is_empty() {
            failures.push(ValidationFailure::new(ConfigField::EntityName, "is required"));
        } else if KEY_PREDICATE.is_match(entity) {
            failures.push(ValidationFailure::new(
                ConfigField::EntityName,
                format!("'{entity}' contains a key predicate, which is not supported"),
            ));
        }

        self.connection.auth.validate(&mut failures);

        if let Some(proxy) = &self.connection.proxy {
            proxy.validate(&mut failures);
        }

        if self.retry.max_attempts == 0 {
            failures.push(ValidationFailure::new(
                ConfigField::Retry,
                "max_attempts must be at least 1",
            ));
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(failures))
        }
    }
}

fn strip_whitespace(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}

// ============================================================================
// Connection
// ============================================================================

/// Service endpoint and transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Service root, e.g. `https://api.example.com/odata/v2`
    #[serde(default)]
    pub base_url: String,

    /// Authentication mode
    pub auth: AuthSettings,

    /// Optional outbound proxy
    #[serde(default)]
    pub proxy: Option<ProxyConfig>,

    /// Connect and read timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_timeout() -> u64 {
    300
}

// ============================================================================
// Auth Settings
// ============================================================================

/// Authentication settings from configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthSettings {
    /// HTTP Basic authentication
    Basic {
        /// Username
        #[serde(default)]
        username: String,
        /// Password
        #[serde(default)]
        password: String,
    },

    /// Pre-issued bearer token
    Bearer {
        /// The token value
        #[serde(default)]
        token: String,
    },

    /// Bearer token obtained by exchanging a signed SAML assertion
    SamlBearer {
        /// Token endpoint URL
        #[serde(default)]
        token_url: String,
        /// OAuth client id
        #[serde(default)]
        client_id: String,
        /// Tenant company id
        #[serde(default)]
        company_id: String,
        /// Base64 signed assertion
        #[serde(default)]
        assertion: String,
    },
}

impl AuthSettings {
    /// Basic authentication settings
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    fn validate(&self, failures: &mut Vec<ValidationFailure>) {
        let mut require = |value: &str, name: &str| {
            if value.trim().is_empty() {
                failures.push(ValidationFailure::new(
                    ConfigField::Credentials,
                    format!("{name} is required"),
                ));
            }
        };

        match self {
            AuthSettings::Basic { username, password } => {
                require(username, "username");
                require(password, "password");
            }
            AuthSettings::Bearer { token } => require(token, "token"),
            AuthSettings::SamlBearer {
                token_url,
                client_id,
                company_id,
                assertion,
            } => {
                require(token_url, "token_url");
                require(client_id, "client_id");
                require(company_id, "company_id");
                require(assertion, "assertion");
            }
        }
    }
}

// ============================================================================
// Proxy
// ============================================================================

/// Outbound proxy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Proxy URL
    #[serde(default)]
    pub url: String,

    /// Proxy username
    #[serde(default)]
    pub username: Option<String>,

    /// Proxy password
    #[serde(default)]
    pub password: Option<String>,
}

impl ProxyConfig {
    fn validate(&self, failures: &mut Vec<ValidationFailure>) {
        let url = self.url.trim();
        if url.is_empty() {
            failures.push(ValidationFailure::new(ConfigField::Proxy, "url is required"));
        } else if Url::parse(url).is_err() {
            failures.push(ValidationFailure::new(
                ConfigField::Proxy,
                format!("'{url}' is not a valid URL"),
            ));
        }

        let has_user = self.username.as_deref().is_some_and(|u| !u.is_empty());
        let has_password = self.password.as_deref().is_some_and(|p| !p.is_empty());
        if has_user != has_password {
            failures.push(ValidationFailure::new(
                ConfigField::Proxy,
                "username and password must be set together",
            ));
        }
    }
}

// ============================================================================
// Retry
// ============================================================================

/// Retry settings for data-page requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Type of backoff
    #[serde(rename = "backoff", default)]
    pub backoff_type: BackoffType,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_ms")]
    pub initial_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_type: BackoffType::Exponential,
            initial_ms: default_initial_ms(),
            max_ms: default_max_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_ms() -> u64 {
    1000
}

fn default_max_ms() -> u64 {
    60000
}
