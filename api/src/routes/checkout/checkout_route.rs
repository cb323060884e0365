use std::sync::Arc;

use axum::{
    extract::{Json, State},
    response::Response,
};
use scm_gitlab::{CheckoutRequest, ScmProvider};
use tracing::instrument;

use crate::{
    core::{app_state::AppState, http::response_envelope::ok},
    error_handler::{AppResult, require_fields},
};

/// Builds the checkout step; no GitLab call and no token needed.
#[instrument(
    name = "checkout_command_route",
    skip(state, body),
    fields(org = %body.org, repo = %body.repo, sha = %body.sha)
)]
pub async fn checkout_command_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CheckoutRequest>,
) -> AppResult<Response> {
    require_fields(&[
        ("host", &body.host),
        ("org", &body.org),
        ("repo", &body.repo),
        ("branch", &body.branch),
        ("sha", &body.sha),
    ])?;
    Ok(ok(state.scm.get_checkout_command(&body)))
}

/// OAuth provider record for the platform's login layer.
pub async fn bell_route(State(state): State<Arc<AppState>>) -> Response {
    ok(state.scm.get_bell_configuration())
}
