//! Authentication module
//!
//! Supports: Basic, Bearer (static token or SAML assertion exchange)
//!
//! The `Authenticator` applies credentials to outgoing requests and caches
//! the bearer token across clones of the transporter.

mod authenticator;
mod providers;
mod types;

pub use authenticator::{basic_header, Authenticator};
pub use providers::{
    SamlBearerTokenProvider, StaticTokenProvider, TokenProvider, SAML2_BEARER_GRANT,
};
pub use types::{AuthConfig, CachedToken};
