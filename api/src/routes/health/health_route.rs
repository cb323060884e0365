use std::sync::Arc;

use axum::{extract::State, response::Response};
use chrono::Utc;
use scm_gitlab::{BreakerState, ScmProvider};

use crate::{
    core::{app_state::AppState, http::response_envelope::ok},
    routes::health::health_response::HealthResponse,
};

/// Liveness plus breaker state; the facade itself stays up while GitLab is down.
pub async fn health_route(State(state): State<Arc<AppState>>) -> Response {
    let breaker = state.scm.stats().state;
    ok(HealthResponse {
        status: if breaker == BreakerState::Closed {
            "ok"
        } else {
            "degraded"
        },
        breaker,
        started_at: state.started_at,
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
    })
}

/// Breaker statistics.
pub async fn stats_route(State(state): State<Arc<AppState>>) -> Response {
    ok(state.scm.stats())
}
