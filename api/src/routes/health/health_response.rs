use chrono::{DateTime, Utc};
use scm_gitlab::BreakerState;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` while the breaker is closed, `degraded` otherwise.
    pub status: &'static str,
    pub breaker: BreakerState,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: i64,
}
