use std::sync::Arc;

use axum::{
    extract::{Json, State},
    response::Response,
};
use scm_gitlab::ScmProvider;
use tracing::{debug, instrument};

use crate::{
    core::{
        app_state::AppState,
        http::{bearer::ScmToken, response_envelope::ok},
    },
    error_handler::{AppResult, require_fields},
    routes::file::file_request::{FileRequest, FileResponse},
};

#[instrument(
    name = "file_route",
    skip(state, token, body),
    fields(scm_uri = %body.scm_uri, path = %body.path)
)]
pub async fn file_route(
    State(state): State<Arc<AppState>>,
    token: ScmToken,
    Json(body): Json<FileRequest>,
) -> AppResult<Response> {
    require_fields(&[("scm_uri", &body.scm_uri), ("path", &body.path)])?;

    let git_ref = body
        .git_ref
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());
    let content = state
        .scm
        .get_file(&body.scm_uri, body.path.trim(), token.as_str(), git_ref)
        .await?;
    debug!(bytes = content.len(), "file fetched");

    Ok(ok(FileResponse {
        path: body.path,
        content,
    }))
}
