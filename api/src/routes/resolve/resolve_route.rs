use std::sync::Arc;

use axum::{
    extract::{Json, State},
    response::Response,
};
use scm_gitlab::ScmProvider;
use tracing::{info, instrument};

use crate::{
    core::{
        app_state::AppState,
        http::{bearer::ScmToken, response_envelope::ok},
    },
    error_handler::{AppResult, require_fields},
    routes::resolve::resolve_request::{
        CommitShaResponse, ParseUrlRequest, ParseUrlResponse, ScmUriRequest,
    },
};

/// Checkout URL → SCM URI.
#[instrument(name = "parse_url_route", skip(state, token, body))]
pub async fn parse_url_route(
    State(state): State<Arc<AppState>>,
    token: ScmToken,
    Json(body): Json<ParseUrlRequest>,
) -> AppResult<Response> {
    require_fields(&[("checkout_url", &body.checkout_url)])?;

    let scm_uri = state
        .scm
        .parse_url(body.checkout_url.trim(), token.as_str())
        .await?;
    info!(%scm_uri, "checkout url resolved");
    Ok(ok(ParseUrlResponse { scm_uri }))
}

#[instrument(name = "decorate_url_route", skip(state, token, body), fields(scm_uri = %body.scm_uri))]
pub async fn decorate_url_route(
    State(state): State<Arc<AppState>>,
    token: ScmToken,
    Json(body): Json<ScmUriRequest>,
) -> AppResult<Response> {
    require_fields(&[("scm_uri", &body.scm_uri)])?;
    let decoration = state.scm.decorate_url(&body.scm_uri, token.as_str()).await?;
    Ok(ok(decoration))
}

#[instrument(name = "permissions_route", skip(state, token, body), fields(scm_uri = %body.scm_uri))]
pub async fn permissions_route(
    State(state): State<Arc<AppState>>,
    token: ScmToken,
    Json(body): Json<ScmUriRequest>,
) -> AppResult<Response> {
    require_fields(&[("scm_uri", &body.scm_uri)])?;
    let permissions = state
        .scm
        .get_permissions(&body.scm_uri, token.as_str())
        .await?;
    Ok(ok(permissions))
}

#[instrument(name = "commit_sha_route", skip(state, token, body), fields(scm_uri = %body.scm_uri))]
pub async fn commit_sha_route(
    State(state): State<Arc<AppState>>,
    token: ScmToken,
    Json(body): Json<ScmUriRequest>,
) -> AppResult<Response> {
    require_fields(&[("scm_uri", &body.scm_uri)])?;
    let sha = state.scm.get_commit_sha(&body.scm_uri, token.as_str()).await?;
    Ok(ok(CommitShaResponse { sha }))
}
