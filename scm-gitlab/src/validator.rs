//! Response classification.
//!
//! [`check_response`] must run right after a gateway call resolves and before
//! the body is deserialized into any wire type.

use std::fmt;

use serde_json::Value;

use crate::gateway::ProviderResponse;

/// A non-2xx provider answer turned into a displayable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseError {
    pub status: u16,
    pub message: String,
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ResponseError {}

/// Returns `Ok(())` for statuses in `200..300`, otherwise a [`ResponseError`]
/// whose message reads `<errorMessage> Reason "<errorReason>"`.
pub fn check_response(response: &ProviderResponse) -> Result<(), ResponseError> {
    if (200..300).contains(&response.status) {
        return Ok(());
    }

    let error_message = string_field(&response.body, "message")
        .unwrap_or_else(|| format!("SCM service unavailable ({}).", response.status));
    let error_reason =
        string_field(&response.body, "error").unwrap_or_else(|| response.body.to_string());

    Err(ResponseError {
        status: response.status,
        message: format!("{error_message} Reason \"{error_reason}\""),
    })
}

fn string_field(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
