//! Error types for AgentRelay.

use thiserror::Error;

/// Result type alias using AgentRelay's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for AgentRelay.
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Request errors (resolved before any network activity)
    // =========================================================================
    #[error("Authorization failed: {0}")]
    Auth(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Routing failed: {0}")]
    Routing(String),

    // =========================================================================
    // Upstream errors (a downstream agent misbehaved)
    // =========================================================================
    #[error("UpstreamTimeout: agent '{agent}' did not respond within {timeout_secs}s")]
    UpstreamTimeout { agent: String, timeout_secs: u64 },

    #[error("UpstreamError: agent '{agent}' returned status {status}: {body}")]
    UpstreamError {
        agent: String,
        status: u16,
        body: String,
    },

    #[error("UpstreamError: agent '{agent}' unreachable: {detail}")]
    UpstreamUnreachable { agent: String, detail: String },

    // =========================================================================
    // Storage errors
    // =========================================================================
    #[error("Storage error: {0}")]
    Storage(String),

    // =========================================================================
    // Generic errors
    // =========================================================================
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create an authorization error.
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create an invalid request error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a routing error.
    pub fn routing(msg: impl Into<String>) -> Self {
        Self::Routing(msg.into())
    }

    /// Create a storage error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Short machine-readable code for error responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Auth(_) => "AUTH_ERROR",
            Self::InvalidRequest(_) => "VALIDATION_ERROR",
            Self::Routing(_) => "ROUTING_FAILURE",
            Self::UpstreamTimeout { .. } => "UPSTREAM_TIMEOUT",
            Self::UpstreamError { .. } | Self::UpstreamUnreachable { .. } => "UPSTREAM_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }
}
