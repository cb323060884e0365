use std::{sync::Arc, time::Duration};

use api::{core::app_state::AppState, router};
use reqwest::StatusCode;
use scm_gitlab::{BreakerOptions, GitLabConfig};
use serde_json::{Value, json};

const TOKEN: &str = "facade-token";

/// Serves the facade on a random port; GitLab itself is unreachable.
async fn spawn_facade() -> String {
    // Reserve a port and release it so GitLab calls fail to connect.
    let dead = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = dead.local_addr().unwrap();
    drop(dead);

    let mut cfg = GitLabConfig::new("client-id", "client-secret");
    cfg.gitlab_host = "gitlab.example.com".into();
    cfg.api_url = Some(format!("http://{dead_addr}/api/v3"));
    cfg.breaker = BreakerOptions {
        timeout: Duration::from_secs(2),
        failure_threshold: 1,
        cooldown: Duration::from_secs(60),
    };
    let state = Arc::new(AppState::new(cfg).unwrap());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    format!("http://{addr}")
}

async fn post(base: &str, path: &str, body: Value) -> (StatusCode, Value) {
    let resp = reqwest::Client::new()
        .post(format!("{base}{path}"))
        .bearer_auth(TOKEN)
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = resp.status();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn health_and_bell_are_served_without_gitlab() {
    let base = spawn_facade().await;

    let health: Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["success"], true);
    assert_eq!(health["data"]["status"], "ok");
    assert_eq!(health["data"]["breaker"], "closed");

    let bell: Value = reqwest::get(format!("{base}/scm/bell"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(bell["data"]["provider"], "gitlab");
    assert_eq!(bell["data"]["clientId"], "client-id");
    assert_eq!(bell["data"]["config"]["uri"], "https://gitlab.example.com");
}

#[tokio::test]
async fn checkout_command_is_built_locally() {
    let base = spawn_facade().await;
    let (status, body) = post(
        &base,
        "/scm/checkout_command",
        json!({
            "host": "gitlab.example.com",
            "org": "group",
            "repo": "proj",
            "branch": "main",
            "sha": "abc123",
            "pr_ref": "merge-requests/4/head"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "sd-checkout-code");
    let command = body["data"]["command"].as_str().unwrap();
    assert!(command.ends_with("git fetch origin merge-requests/4/head && git merge abc123"));
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let base = spawn_facade().await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/scm/commit_sha"))
        .json(&json!({ "scm_uri": "gitlab.example.com:1:main" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn input_errors_are_bad_requests() {
    let base = spawn_facade().await;

    let (status, body) = post(&base, "/scm/commit_sha", json!({ "scm_uri": "nope" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "MALFORMED_SCM_URI");

    let (status, body) = post(
        &base,
        "/scm/parse_url",
        json!({ "checkout_url": "https://github.com/a/b" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "UNSUPPORTED_HOST");

    let (status, body) = post(
        &base,
        "/scm/decorate_commit",
        json!({ "scm_uri": "", "sha": "" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"].as_array().unwrap().len(), 2);

    // None of these reached GitLab.
    let stats: Value = reqwest::get(format!("{base}/stats"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["data"]["total_calls"], 0);
}

#[tokio::test]
async fn missing_json_field_is_wrapped_in_envelope() {
    let base = spawn_facade().await;
    let (status, body) = post(&base, "/scm/file", json!({ "scm_uri": "h:1:main" })).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNPROCESSABLE_ENTITY");
    assert_eq!(body["error"]["details"][0]["path"], "path");
}

#[tokio::test]
async fn unreachable_gitlab_is_bad_gateway_then_unavailable() {
    let base = spawn_facade().await;
    let req = json!({ "scm_uri": "gitlab.example.com:42:main" });

    let (status, body) = post(&base, "/scm/commit_sha", req.clone()).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "SCM_TRANSPORT_ERROR");
    assert!(!body.to_string().contains(TOKEN));

    let (status, body) = post(&base, "/scm/commit_sha", req).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "SCM_UNAVAILABLE");

    let health: Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["data"]["status"], "degraded");
    assert_eq!(health["data"]["breaker"], "open");
}
