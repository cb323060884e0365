use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use scm_gitlab::{ConfigError, ScmError};
use thiserror::Error;
use tracing::{error, warn};

use crate::core::http::response_envelope::{ApiErrorDetail, ApiResponse};

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request ---
    #[error("{message}")]
    Validation {
        message: String,
        details: Vec<ApiErrorDetail>,
    },

    #[error("missing or malformed bearer token")]
    Unauthorized,

    // --- Adapter ---
    #[error(transparent)]
    Scm(#[from] ScmError),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingEnv(_) | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR, // startup-only
            AppError::Bind(_) | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Scm(e) => scm_status(e),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::MissingEnv(_) => "MISSING_ENV",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::Validation { .. } => "BAD_REQUEST",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::Scm(e) => scm_code(e),
        }
    }
}

fn scm_status(err: &ScmError) -> StatusCode {
    match err {
        ScmError::MalformedUrl(_) | ScmError::MalformedUri(_) | ScmError::UnsupportedHost { .. } => {
            StatusCode::BAD_REQUEST
        }
        // An upstream 5xx is GitLab's failure, not a missing resource.
        ScmError::Lookup(e) | ScmError::FileNotFound(e) if e.status >= 500 => StatusCode::BAD_GATEWAY,
        ScmError::Lookup(_) | ScmError::FileNotFound(_) => StatusCode::NOT_FOUND,
        ScmError::BreakerOpen => StatusCode::SERVICE_UNAVAILABLE,
        ScmError::Transport(_) | ScmError::Timeout(_) | ScmError::InvalidResponse(_) => {
            StatusCode::BAD_GATEWAY
        }
        ScmError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn scm_code(err: &ScmError) -> &'static str {
    match err {
        ScmError::MalformedUrl(_) => "MALFORMED_CHECKOUT_URL",
        ScmError::MalformedUri(_) => "MALFORMED_SCM_URI",
        ScmError::UnsupportedHost { .. } => "UNSUPPORTED_HOST",
        ScmError::Lookup(_) => "SCM_LOOKUP_FAILED",
        ScmError::FileNotFound(_) => "FILE_NOT_FOUND",
        ScmError::Transport(_) => "SCM_TRANSPORT_ERROR",
        ScmError::Timeout(_) => "SCM_TIMEOUT",
        ScmError::BreakerOpen => "SCM_UNAVAILABLE",
        ScmError::InvalidResponse(_) => "SCM_INVALID_RESPONSE",
        ScmError::Config(_) => "CONFIG_ERROR",
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(%status, error = %self, "request failed");
        } else {
            warn!(%status, error = %self, "request rejected");
        }

        let code = self.error_code();
        let message = self.to_string();
        let details = match self {
            AppError::Validation { details, .. } => details,
            _ => Vec::new(),
        };
        ApiResponse::<()>::error(code, message, details).into_response_with_status(status)
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Rejects blank required string fields, reporting every offending field at once.
pub fn require_fields(fields: &[(&str, &str)]) -> AppResult<()> {
    let details: Vec<ApiErrorDetail> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| ApiErrorDetail::field(*name, "Provide a non-empty string."))
        .collect();

    if details.is_empty() {
        return Ok(());
    }
    let names: Vec<&str> = details.iter().filter_map(|d| d.path.as_deref()).collect();
    Err(AppError::Validation {
        message: format!("Required field(s) missing: {}", names.join(", ")),
        details,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use scm_gitlab::validator::ResponseError;

    use super::*;

    fn lookup(status: u16) -> AppError {
        AppError::Scm(ScmError::Lookup(ResponseError {
            status,
            message: "x".into(),
        }))
    }

    #[test]
    fn adapter_errors_map_to_http_status() {
        let cases = [
            (AppError::Scm(ScmError::MalformedUri("a".into())), StatusCode::BAD_REQUEST),
            (
                AppError::Scm(ScmError::UnsupportedHost {
                    host: "github.com".into(),
                    expected: "gitlab.com".into(),
                }),
                StatusCode::BAD_REQUEST,
            ),
            (lookup(404), StatusCode::NOT_FOUND),
            (lookup(503), StatusCode::BAD_GATEWAY),
            (AppError::Scm(ScmError::BreakerOpen), StatusCode::SERVICE_UNAVAILABLE),
            (
                AppError::Scm(ScmError::Timeout(Duration::from_secs(1))),
                StatusCode::BAD_GATEWAY,
            ),
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{err}");
        }
    }

    #[test]
    fn blank_fields_are_reported_together() {
        assert!(require_fields(&[("scm_uri", "a:1:b"), ("sha", "abc")]).is_ok());

        match require_fields(&[("scm_uri", " "), ("sha", "abc"), ("url", "")]) {
            Err(AppError::Validation { message, details }) => {
                assert_eq!(message, "Required field(s) missing: scm_uri, url");
                assert_eq!(details.len(), 2);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
