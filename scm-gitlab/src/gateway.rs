//! Resilient call gateway: one shared `reqwest::Client` behind a [`CircuitBreaker`].
//!
//! The gateway records a failure for transport faults, timeouts and non-2xx
//! statuses, but it hands non-2xx responses back to the caller untouched so the
//! validator can turn them into a message. It never looks inside a body.

use std::fmt;

use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    breaker::{BreakerOptions, BreakerStats, CircuitBreaker},
    errors::{ConfigError, ScmError, ScmResult},
};

/// One outbound call: method, path below the API root, query and bearer token.
#[derive(Clone)]
pub struct RequestSpec {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    token: String,
}

impl RequestSpec {
    pub fn new(method: Method, path: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            token: token.into(),
        }
    }

    pub fn get(path: impl Into<String>, token: impl Into<String>) -> Self {
        Self::new(Method::GET, path, token)
    }

    pub fn post(path: impl Into<String>, token: impl Into<String>) -> Self {
        Self::new(Method::POST, path, token)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

// Token stays out of logs.
impl fmt::Debug for RequestSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSpec")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Status plus body. Non-JSON bodies are carried as a JSON string, empty bodies as `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    pub status: u16,
    pub body: Value,
}

impl ProviderResponse {
    /// Deserializes the body into a wire type. Only call after validation.
    pub fn json<T: DeserializeOwned>(self) -> ScmResult<T> {
        serde_json::from_value(self.body).map_err(|e| ScmError::InvalidResponse(e.to_string()))
    }
}

#[derive(Debug)]
pub struct Gateway {
    http: Client,
    base_api: String,
    breaker: CircuitBreaker,
}

impl Gateway {
    /// `base_api` is the REST root, e.g. `https://gitlab.com/api/v3`.
    pub fn new(base_api: impl Into<String>, options: BreakerOptions) -> ScmResult<Self> {
        let http = Client::builder()
            .user_agent("scm-gitlab/0.1")
            .timeout(options.timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        let base_api = base_api.into().trim_end_matches('/').to_string();
        debug!(%base_api, timeout_ms = options.timeout.as_millis() as u64, "gateway initialized");

        Ok(Self {
            http,
            base_api,
            breaker: CircuitBreaker::new(options),
        })
    }

    pub fn base_api(&self) -> &str {
        &self.base_api
    }

    pub fn stats(&self) -> BreakerStats {
        self.breaker.stats()
    }

    /// Issues the call through the breaker.
    ///
    /// Returns `Err` only for breaker rejections, transport faults and timeouts;
    /// any HTTP answer, successful or not, comes back as `Ok`.
    pub async fn execute(&self, spec: RequestSpec) -> ScmResult<ProviderResponse> {
        let permit = self.breaker.acquire()?;
        let url = format!("{}/{}", self.base_api, spec.path.trim_start_matches('/'));
        debug!(method = %spec.method, %url, trial = permit.is_trial(), "gitlab request");

        let sent = self
            .http
            .request(spec.method.clone(), &url)
            .bearer_auth(&spec.token)
            .query(&spec.query)
            .send()
            .await;

        let resp = match sent {
            Ok(resp) => resp,
            Err(e) => {
                permit.fail(e.is_timeout());
                return Err(self.transport_error(e));
            }
        };

        let status = resp.status().as_u16();
        let text = match resp.text().await {
            Ok(text) => text,
            Err(e) => {
                permit.fail(e.is_timeout());
                return Err(self.transport_error(e));
            }
        };

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        if (200..300).contains(&status) {
            permit.succeed();
        } else {
            permit.fail(false);
            warn!(status, method = %spec.method, path = %spec.path, "gitlab returned non-2xx");
        }

        Ok(ProviderResponse { status, body })
    }

    fn transport_error(&self, e: reqwest::Error) -> ScmError {
        if e.is_timeout() {
            warn!("gitlab request timed out");
            return ScmError::Timeout(self.breaker.options().timeout);
        }
        let e = e.without_url();
        warn!(error = %e, "gitlab transport failure");
        ScmError::Transport(e.to_string())
    }
}
