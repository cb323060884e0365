//! In-process GitLab API double built on axum.
//!
//! Routes are registered per test with [`MockGitLab::on`]; every request is
//! recorded so tests can assert on paths, query strings and auth headers, or on
//! the absence of a call.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use scm_gitlab::{BreakerOptions, GitLabConfig, GitLabScm};
use serde_json::{Value, json};

pub const HOST: &str = "gitlab.example.com";
pub const TOKEN: &str = "s3cr3t-token";

#[derive(Debug, Clone)]
pub struct Hit {
    pub method: String,
    pub path: String,
    pub query: HashMap<String, String>,
    pub authorization: Option<String>,
}

#[derive(Debug, Clone)]
struct Canned {
    status: u16,
    body: Value,
    delay: Option<Duration>,
}

#[derive(Clone, Default)]
struct MockState {
    routes: Arc<Mutex<HashMap<(String, String), Canned>>>,
    hits: Arc<Mutex<Vec<Hit>>>,
}

pub struct MockGitLab {
    pub api: String,
    state: MockState,
}

impl MockGitLab {
    pub async fn start() -> Self {
        let state = MockState::default();
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            api: format!("http://{addr}/api/v3"),
            state,
        }
    }

    /// Registers (or replaces) a canned answer; `path` is relative to `/api/v3/`.
    pub fn on(&self, method: &str, path: &str, status: u16, body: Value) {
        self.insert(method, path, Canned { status, body, delay: None });
    }

    pub fn on_delayed(&self, method: &str, path: &str, delay: Duration, body: Value) {
        self.insert(
            method,
            path,
            Canned {
                status: 200,
                body,
                delay: Some(delay),
            },
        );
    }

    fn insert(&self, method: &str, path: &str, canned: Canned) {
        self.state
            .routes
            .lock()
            .unwrap()
            .insert((method.to_string(), format!("/api/v3/{path}")), canned);
    }

    pub fn requests(&self) -> Vec<Hit> {
        self.state.hits.lock().unwrap().clone()
    }

    /// Number of requests received for `path` (relative to `/api/v3/`).
    pub fn hits(&self, path: &str) -> usize {
        let full = format!("/api/v3/{path}");
        self.requests().iter().filter(|h| h.path == full).count()
    }

    pub fn total_hits(&self) -> usize {
        self.requests().len()
    }
}

async fn handle(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let path = uri.path().to_string();
    state.hits.lock().unwrap().push(Hit {
        method: method.to_string(),
        path: path.clone(),
        query,
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });

    let canned = state
        .routes
        .lock()
        .unwrap()
        .get(&(method.to_string(), path))
        .cloned();

    match canned {
        Some(c) => {
            if let Some(delay) = c.delay {
                tokio::time::sleep(delay).await;
            }
            let status = StatusCode::from_u16(c.status).unwrap();
            (status, Json(c.body)).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "404 Not Found" })),
        )
            .into_response(),
    }
}

pub fn adapter(mock: &MockGitLab) -> GitLabScm {
    adapter_with(mock, BreakerOptions::default())
}

pub fn adapter_with(mock: &MockGitLab, breaker: BreakerOptions) -> GitLabScm {
    let mut cfg = GitLabConfig::new("client-id", "client-secret");
    cfg.gitlab_host = HOST.to_string();
    cfg.api_url = Some(mock.api.clone());
    cfg.breaker = breaker;
    GitLabScm::new(cfg).unwrap()
}

pub fn breaker(failure_threshold: u32, cooldown_ms: u64) -> BreakerOptions {
    BreakerOptions {
        timeout: Duration::from_secs(5),
        failure_threshold,
        cooldown: Duration::from_millis(cooldown_ms),
    }
}
