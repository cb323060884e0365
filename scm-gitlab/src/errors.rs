//! Crate-wide error hierarchy for scm-gitlab.
//!
//! Every failure path of the adapter ends in one of these variants. Messages are
//! safe to show to end users: access tokens are never formatted into them.

use std::time::Duration;

use thiserror::Error;

use crate::validator::ResponseError;

/// Convenient alias for crate-wide results.
pub type ScmResult<T> = Result<T, ScmError>;

/// Root error type for the scm-gitlab crate.
#[derive(Debug, Error)]
pub enum ScmError {
    /// Checkout URL did not match `protocol://host/namespace/repo[#branch]`.
    #[error("invalid checkout url: {0}")]
    MalformedUrl(String),

    /// SCM URI is not a `host:projectId:branch` triple.
    #[error("invalid scm uri: {0}")]
    MalformedUri(String),

    /// Checkout URL points at a host other than the configured GitLab instance.
    #[error("checkout url host {host} is not supported by this login host ({expected})")]
    UnsupportedHost { host: String, expected: String },

    /// GitLab answered with a non-2xx status.
    #[error("{0}")]
    Lookup(ResponseError),

    /// File lookup answered with a non-2xx status.
    #[error("file not found: {0}")]
    FileNotFound(ResponseError),

    /// Network/transport failure without HTTP status (DNS/connect/reset).
    #[error("network error: {0}")]
    Transport(String),

    /// Call exceeded the configured per-call timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Breaker is open; the call was rejected without touching the network.
    #[error("SCM service unavailable: circuit breaker is open")]
    BreakerOpen,

    /// Unexpected/invalid shape of provider response.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    /// Configuration problems (missing oauth credentials, bad numbers, etc.).
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ScmError {
    /// Whether retrying the same call later may succeed.
    ///
    /// Input errors are caller mistakes and never become valid on retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ScmError::Lookup(_) | ScmError::Transport(_) | ScmError::Timeout(_) | ScmError::BreakerOpen
        )
    }
}

/// Configuration and setup errors raised while building a [`crate::config::GitLabConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required field or environment variable is missing or empty.
    #[error("missing required configuration value: {0}")]
    Missing(&'static str),

    /// A number failed to parse (thresholds, timeouts).
    #[error("invalid number in {var}: {reason}")]
    InvalidNumber {
        var: &'static str,
        reason: &'static str,
    },

    /// Value had the wrong format (protocol, host).
    #[error("invalid value in {var}: {reason}")]
    InvalidValue {
        var: &'static str,
        reason: &'static str,
    },

    /// HTTP client could not be constructed.
    #[error("failed to build http client: {0}")]
    HttpClient(String),
}
