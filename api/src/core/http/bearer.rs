use std::fmt;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error_handler::AppError;

/// GitLab token forwarded by the caller in `Authorization: Bearer <token>`.
pub struct ScmToken(pub String);

impl ScmToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ScmToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ScmToken(<redacted>)")
    }
}

impl<S> FromRequestParts<S> for ScmToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AppError::Unauthorized)?;
        Ok(ScmToken(token.to_string()))
    }
}
