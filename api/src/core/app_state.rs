use chrono::{DateTime, Utc};
use scm_gitlab::{GitLabConfig, GitLabScm, ScmResult};

use crate::error_handler::AppResult;

/// Shared state for all HTTP handlers.
#[derive(Debug)]
pub struct AppState {
    /// The adapter; it owns the breaker, so every handler shares one.
    pub scm: GitLabScm,
    /// When the facade was started, reported by `/health`.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: GitLabConfig) -> ScmResult<Self> {
        Ok(Self {
            scm: GitLabScm::new(config)?,
            started_at: Utc::now(),
        })
    }

    /// Load the adapter config from environment variables.
    pub fn from_env() -> AppResult<Self> {
        let config = GitLabConfig::from_env()?;
        Ok(Self::new(config)?)
    }
}
