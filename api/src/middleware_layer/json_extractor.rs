use axum::{
    body::{Body, Bytes},
    http::{HeaderValue, Request, StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use crate::core::http::response_envelope::{ApiErrorDetail, ApiResponse};

/// Request fields the facade accepts; used to point hints at the offending one.
const KNOWN_FIELDS: [&str; 9] = [
    "checkout_url",
    "scm_uri",
    "sha",
    "username",
    "path",
    "build_status",
    "job_name",
    "url",
    "ref",
];

async fn take_body(res: Response) -> (axum::http::response::Parts, Bytes) {
    let (parts, body) = res.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();
    (parts, bytes)
}

fn field_from_serde_msg(msg: &str) -> Option<String> {
    KNOWN_FIELDS
        .iter()
        .find(|f| msg.contains(&format!("`{f}`")))
        .map(|f| f.to_string())
}

fn ensure_request_id(parts: &mut axum::http::response::Parts) {
    let present = parts
        .headers
        .get("X-Request-Id")
        .and_then(|h| h.to_str().ok())
        .is_some_and(|v| !v.trim().is_empty());
    if present {
        return;
    }
    let nanos = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| Utc::now().timestamp_micros() * 1000);
    if let Ok(id) = HeaderValue::from_str(&format!("req-{nanos}")) {
        parts.headers.insert("X-Request-Id", id);
    }
}

fn is_json(parts: &axum::http::response::Parts) -> bool {
    parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

/// Rewrites axum's plain-text body rejections (400/415/422) into the JSON envelope.
/// Responses already produced by handlers are JSON and pass through untouched.
pub async fn json_error_mapper(req: Request<Body>, next: Next) -> Response {
    let res = next.run(req).await;
    let status = res.status();

    let code = match status {
        StatusCode::BAD_REQUEST => "BAD_REQUEST",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
        StatusCode::UNPROCESSABLE_ENTITY => "UNPROCESSABLE_ENTITY",
        _ => return res,
    };

    let (mut parts, bytes) = take_body(res).await;
    if is_json(&parts) {
        return Response::from_parts(parts, bytes.into());
    }
    ensure_request_id(&mut parts);

    let original = String::from_utf8_lossy(&bytes);
    let detail = ApiErrorDetail {
        path: field_from_serde_msg(&original),
        hint: if original.contains("missing field") {
            Some("Add the missing field to the JSON body.".into())
        } else if status == StatusCode::UNSUPPORTED_MEDIA_TYPE {
            Some("Send the body with `Content-Type: application/json`.".into())
        } else {
            None
        },
    };

    let envelope = ApiResponse::<()>::error(code, original.trim(), vec![detail]);
    let body = match serde_json::to_vec(&envelope) {
        Ok(v) => v,
        Err(_) => bytes.to_vec(),
    };

    parts
        .headers
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    parts.headers.remove(axum::http::header::CONTENT_LENGTH);

    Response::from_parts(parts, body.into())
}
