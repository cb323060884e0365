use std::{env, sync::Arc};

pub mod core;
pub mod error_handler;
mod middleware_layer;
mod routes;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tokio::signal;
use tracing::{info, warn};

use crate::{
    core::app_state::AppState,
    error_handler::{AppError, AppResult},
    middleware_layer::json_extractor::json_error_mapper,
    routes::{
        checkout::checkout_route::{bell_route, checkout_command_route},
        commit_status::commit_status_route::commit_status_route,
        decorate::decorate_route::{decorate_author_route, decorate_commit_route},
        file::file_route::file_route,
        health::health_route::{health_route, stats_route},
        resolve::resolve_route::{
            commit_sha_route, decorate_url_route, parse_url_route, permissions_route,
        },
    },
};

/// All facade routes over a shared adapter.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/scm/parse_url", post(parse_url_route))
        .route("/scm/decorate_url", post(decorate_url_route))
        .route("/scm/decorate_commit", post(decorate_commit_route))
        .route("/scm/decorate_author", post(decorate_author_route))
        .route("/scm/permissions", post(permissions_route))
        .route("/scm/commit_sha", post(commit_sha_route))
        .route("/scm/commit_status", post(commit_status_route))
        .route("/scm/file", post(file_route))
        .route("/scm/checkout_command", post(checkout_command_route))
        .route("/scm/bell", get(bell_route))
        .route("/stats", get(stats_route))
        .route("/health", get(health_route))
        .layer(middleware::from_fn(json_error_mapper))
        .with_state(state)
}

/// Builds the adapter from the environment and serves until Ctrl+C.
pub async fn start() -> AppResult<()> {
    let host_url = env::var("API_ADDRESS").map_err(|_| AppError::MissingEnv("API_ADDRESS"))?;
    let state = Arc::new(AppState::from_env()?);

    let listener = tokio::net::TcpListener::bind(&host_url)
        .await
        .map_err(AppError::Bind)?;
    info!(address = %host_url, "scm facade listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("scm facade stopped");
    Ok(())
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
