//! Error types for the DDNS system
//!
//! Every failure the reconciliation pass can observe is a tagged variant, so
//! callers branch on the kind and keep the message for the operator.

use thiserror::Error;

use crate::types::RecordType;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS system
#[derive(Error, Debug)]
pub enum Error {
    /// No IP echo service produced a usable address for a family
    #[error("IP unavailable: {0}")]
    IpUnavailable(String),

    /// No provider zone contains the domain
    #[error("Cannot find domain \"{0}\" at the DNS provider")]
    DomainNotFound(String),

    /// The zone has no address record of the requested type for the domain
    #[error("Cannot find {record_type} record for {domain}")]
    RecordNotFound {
        /// Domain that was looked up
        domain: String,
        /// Record type that was looked up
        record_type: RecordType,
    },

    /// The provider rejected the API token
    #[error("API token is invalid: {0}")]
    TokenInvalid(String),

    /// Any other provider-side failure (client error, API error, transport)
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Contradictory or missing user input
    #[error("Configuration error: {0}")]
    Config(String),

    /// Cache file could not be read or written
    #[error("Cache error: {0}")]
    Cache(String),

    /// Cache file exists but does not parse
    #[error("Invalid cache file: {0}")]
    InvalidCache(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an IP unavailable error
    pub fn ip_unavailable(msg: impl Into<String>) -> Self {
        Self::IpUnavailable(msg.into())
    }

    /// Create a "domain not found" error
    pub fn domain_not_found(domain: impl Into<String>) -> Self {
        Self::DomainNotFound(domain.into())
    }

    /// Create a "record not found" error
    pub fn record_not_found(domain: impl Into<String>, record_type: RecordType) -> Self {
        Self::RecordNotFound {
            domain: domain.into(),
            record_type,
        }
    }

    /// Create a token invalid error
    pub fn token_invalid(msg: impl Into<String>) -> Self {
        Self::TokenInvalid(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a cache I/O error
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }

    /// Create an invalid cache error
    pub fn invalid_cache(msg: impl Into<String>) -> Self {
        Self::InvalidCache(msg.into())
    }

    /// True for the lookup miss that the update ladder turns into a create
    pub fn is_record_not_found(&self) -> bool {
        matches!(self, Self::RecordNotFound { .. })
    }
}
