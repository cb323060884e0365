use std::sync::Arc;

use axum::{
    extract::{Json, State},
    response::Response,
};
use scm_gitlab::{CommitStatusUpdate, ScmProvider, status::status_context};
use tracing::{info, instrument};

use crate::{
    core::{
        app_state::AppState,
        http::{bearer::ScmToken, response_envelope::ok},
    },
    error_handler::{AppResult, require_fields},
    routes::commit_status::commit_status_request::CommitStatusResponse,
};

/// Posts a build status against a commit.
///
/// Body: `{scm_uri, sha, build_status, job_name?, url}`; unknown build statuses
/// are reported to GitLab as `failure`.
#[instrument(
    name = "commit_status_route",
    skip(state, token, body),
    fields(scm_uri = %body.scm_uri, sha = %body.sha, build_status = %body.build_status)
)]
pub async fn commit_status_route(
    State(state): State<Arc<AppState>>,
    token: ScmToken,
    Json(body): Json<CommitStatusUpdate>,
) -> AppResult<Response> {
    require_fields(&[
        ("scm_uri", &body.scm_uri),
        ("sha", &body.sha),
        ("url", &body.url),
    ])?;

    state.scm.update_commit_status(&body, token.as_str()).await?;

    let response = CommitStatusResponse {
        state: body.build_status.state().as_str().to_string(),
        context: status_context(body.job_name.as_deref()),
    };
    info!(state = %response.state, context = %response.context, "commit status posted");
    Ok(ok(response))
}
