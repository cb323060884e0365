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
    routes::decorate::decorate_request::{DecorateAuthorRequest, DecorateCommitRequest},
};

/// Commit message, link and author profile for one sha.
#[instrument(
    name = "decorate_commit_route",
    skip(state, token, body),
    fields(scm_uri = %body.scm_uri, sha = %body.sha)
)]
pub async fn decorate_commit_route(
    State(state): State<Arc<AppState>>,
    token: ScmToken,
    Json(body): Json<DecorateCommitRequest>,
) -> AppResult<Response> {
    require_fields(&[("scm_uri", &body.scm_uri), ("sha", &body.sha)])?;

    let decoration = state
        .scm
        .decorate_commit(&body.scm_uri, body.sha.trim(), token.as_str())
        .await?;
    debug!(author = %decoration.author.username, "commit decorated");
    Ok(ok(decoration))
}

#[instrument(name = "decorate_author_route", skip(state, token, body), fields(username = %body.username))]
pub async fn decorate_author_route(
    State(state): State<Arc<AppState>>,
    token: ScmToken,
    Json(body): Json<DecorateAuthorRequest>,
) -> AppResult<Response> {
    require_fields(&[("username", &body.username)])?;
    let author = state
        .scm
        .decorate_author(body.username.trim(), token.as_str())
        .await?;
    Ok(ok(author))
}
