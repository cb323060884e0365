//! Adapter configuration.
//!
//! [`GitLabConfig`] is validated when the adapter is constructed: the OAuth
//! client credentials are required, everything else has a default.
//!
//! # Environment variables
//!
//! Required:
//! - `OAUTH_CLIENT_ID`, `OAUTH_CLIENT_SECRET`
//!
//! Optional:
//! - `GITLAB_PROTOCOL` (`https`), `GITLAB_HOST` (`gitlab.com`), `GITLAB_API_URL`
//! - `SCM_USERNAME` (`sd-buildbot`), `SCM_EMAIL` (`dev-null@screwdriver.cd`)
//! - `SCM_HTTPS` (`false`), `SCM_DEFAULT_BRANCH` (`master`)
//! - `BREAKER_TIMEOUT_MS`, `BREAKER_FAILURE_THRESHOLD`, `BREAKER_COOLDOWN_MS`

use std::{fmt, time::Duration};

use crate::{breaker::BreakerOptions, errors::ConfigError};

pub const DEFAULT_PROTOCOL: &str = "https";
pub const DEFAULT_HOST: &str = "gitlab.com";
pub const DEFAULT_USERNAME: &str = "sd-buildbot";
pub const DEFAULT_EMAIL: &str = "dev-null@screwdriver.cd";
pub const DEFAULT_BRANCH: &str = "master";

#[derive(Clone)]
pub struct GitLabConfig {
    /// `http` or `https`.
    pub gitlab_protocol: String,
    /// Host of the GitLab instance; checkout URLs must point at it.
    pub gitlab_host: String,
    /// REST root override. Defaults to `<protocol>://<host>/api/v3`.
    pub api_url: Option<String>,
    /// Git identity used by checkout commands.
    pub username: String,
    pub email: String,
    /// Marks OAuth cookies secure and forces https on the login flow.
    pub https: bool,
    pub oauth_client_id: String,
    pub oauth_client_secret: String,
    /// Branch assumed when a checkout URL carries no `#branch`.
    pub default_branch: String,
    pub breaker: BreakerOptions,
}

impl GitLabConfig {
    /// Config with every optional field at its default.
    pub fn new(oauth_client_id: impl Into<String>, oauth_client_secret: impl Into<String>) -> Self {
        Self {
            gitlab_protocol: DEFAULT_PROTOCOL.to_string(),
            gitlab_host: DEFAULT_HOST.to_string(),
            api_url: None,
            username: DEFAULT_USERNAME.to_string(),
            email: DEFAULT_EMAIL.to_string(),
            https: false,
            oauth_client_id: oauth_client_id.into(),
            oauth_client_secret: oauth_client_secret.into(),
            default_branch: DEFAULT_BRANCH.to_string(),
            breaker: BreakerOptions::default(),
        }
    }

    /// Loads the config from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads the config through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let must = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));
        let millis = |name: &'static str, default: Duration| -> Result<Duration, ConfigError> {
            match get(name) {
                Some(v) => v
                    .parse::<u64>()
                    .map(Duration::from_millis)
                    .map_err(|_| ConfigError::InvalidNumber {
                        var: name,
                        reason: "expected milliseconds as u64",
                    }),
                None => Ok(default),
            }
        };

        let defaults = BreakerOptions::default();
        let failure_threshold = match get("BREAKER_FAILURE_THRESHOLD") {
            Some(v) => v.parse::<u32>().map_err(|_| ConfigError::InvalidNumber {
                var: "BREAKER_FAILURE_THRESHOLD",
                reason: "expected u32",
            })?,
            None => defaults.failure_threshold,
        };
        let https = match get("SCM_HTTPS").as_deref() {
            None => false,
            Some("true") | Some("1") => true,
            Some("false") | Some("0") => false,
            Some(_) => {
                return Err(ConfigError::InvalidValue {
                    var: "SCM_HTTPS",
                    reason: "expected true/false",
                });
            }
        };

        let cfg = Self {
            gitlab_protocol: get("GITLAB_PROTOCOL").unwrap_or_else(|| DEFAULT_PROTOCOL.into()),
            gitlab_host: get("GITLAB_HOST").unwrap_or_else(|| DEFAULT_HOST.into()),
            api_url: get("GITLAB_API_URL"),
            username: get("SCM_USERNAME").unwrap_or_else(|| DEFAULT_USERNAME.into()),
            email: get("SCM_EMAIL").unwrap_or_else(|| DEFAULT_EMAIL.into()),
            https,
            oauth_client_id: must("OAUTH_CLIENT_ID")?,
            oauth_client_secret: must("OAUTH_CLIENT_SECRET")?,
            default_branch: get("SCM_DEFAULT_BRANCH").unwrap_or_else(|| DEFAULT_BRANCH.into()),
            breaker: BreakerOptions {
                timeout: millis("BREAKER_TIMEOUT_MS", defaults.timeout)?,
                failure_threshold,
                cooldown: millis("BREAKER_COOLDOWN_MS", defaults.cooldown)?,
            },
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Rejects missing credentials and out-of-range values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.oauth_client_id.trim().is_empty() {
            return Err(ConfigError::Missing("oauth_client_id"));
        }
        if self.oauth_client_secret.trim().is_empty() {
            return Err(ConfigError::Missing("oauth_client_secret"));
        }
        if !matches!(self.gitlab_protocol.as_str(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                var: "gitlab_protocol",
                reason: "expected http or https",
            });
        }
        if self.gitlab_host.trim().is_empty() || self.gitlab_host.contains('/') {
            return Err(ConfigError::InvalidValue {
                var: "gitlab_host",
                reason: "expected a bare host name",
            });
        }
        if let Some(url) = &self.api_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidValue {
                    var: "api_url",
                    reason: "must start with http:// or https://",
                });
            }
        }
        for (var, value) in [
            ("username", &self.username),
            ("email", &self.email),
            ("default_branch", &self.default_branch),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing(var));
            }
        }
        if self.breaker.failure_threshold == 0 {
            return Err(ConfigError::InvalidNumber {
                var: "failure_threshold",
                reason: "must be at least 1",
            });
        }
        if self.breaker.timeout.is_zero() {
            return Err(ConfigError::InvalidNumber {
                var: "timeout",
                reason: "must be greater than zero",
            });
        }
        Ok(())
    }

    /// `<protocol>://<host>`, the web root of the instance.
    pub fn web_base(&self) -> String {
        format!("{}://{}", self.gitlab_protocol, self.gitlab_host)
    }

    /// REST root used by the gateway.
    pub fn api_base(&self) -> String {
        match &self.api_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("{}/api/v3", self.web_base()),
        }
    }
}

impl fmt::Debug for GitLabConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitLabConfig")
            .field("gitlab_protocol", &self.gitlab_protocol)
            .field("gitlab_host", &self.gitlab_host)
            .field("api_url", &self.api_url)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("https", &self.https)
            .field("oauth_client_id", &self.oauth_client_id)
            .field("oauth_client_secret", &"<redacted>")
            .field("default_branch", &self.default_branch)
            .field("breaker", &self.breaker)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply() {
        let cfg = GitLabConfig::from_lookup(lookup(&[
            ("OAUTH_CLIENT_ID", "id"),
            ("OAUTH_CLIENT_SECRET", "secret"),
        ]))
        .unwrap();
        assert_eq!(cfg.gitlab_protocol, "https");
        assert_eq!(cfg.gitlab_host, "gitlab.com");
        assert_eq!(cfg.username, "sd-buildbot");
        assert_eq!(cfg.email, "dev-null@screwdriver.cd");
        assert!(!cfg.https);
        assert_eq!(cfg.breaker, BreakerOptions::default());
        assert_eq!(cfg.api_base(), "https://gitlab.com/api/v3");
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let err = GitLabConfig::from_lookup(lookup(&[("OAUTH_CLIENT_ID", "id")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("OAUTH_CLIENT_SECRET")));

        let err = GitLabConfig::new("", "secret").validate().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("oauth_client_id")));
    }

    #[test]
    fn overrides_and_breaker_values() {
        let cfg = GitLabConfig::from_lookup(lookup(&[
            ("OAUTH_CLIENT_ID", "id"),
            ("OAUTH_CLIENT_SECRET", "secret"),
            ("GITLAB_PROTOCOL", "http"),
            ("GITLAB_HOST", "git.internal"),
            ("GITLAB_API_URL", "http://127.0.0.1:9000/api/v3/"),
            ("SCM_HTTPS", "true"),
            ("BREAKER_FAILURE_THRESHOLD", "2"),
            ("BREAKER_COOLDOWN_MS", "1500"),
        ]))
        .unwrap();
        assert_eq!(cfg.web_base(), "http://git.internal");
        assert_eq!(cfg.api_base(), "http://127.0.0.1:9000/api/v3");
        assert!(cfg.https);
        assert_eq!(cfg.breaker.failure_threshold, 2);
        assert_eq!(cfg.breaker.cooldown, Duration::from_millis(1500));
    }

    #[test]
    fn bad_numbers_and_values() {
        let base = [("OAUTH_CLIENT_ID", "id"), ("OAUTH_CLIENT_SECRET", "s")];

        let mut pairs = base.to_vec();
        pairs.push(("BREAKER_TIMEOUT_MS", "soon"));
        assert!(matches!(
            GitLabConfig::from_lookup(lookup(&pairs)),
            Err(ConfigError::InvalidNumber { var: "BREAKER_TIMEOUT_MS", .. })
        ));

        let mut pairs = base.to_vec();
        pairs.push(("GITLAB_PROTOCOL", "ftp"));
        assert!(matches!(
            GitLabConfig::from_lookup(lookup(&pairs)),
            Err(ConfigError::InvalidValue { var: "gitlab_protocol", .. })
        ));

        let mut pairs = base.to_vec();
        pairs.push(("BREAKER_FAILURE_THRESHOLD", "0"));
        assert!(GitLabConfig::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn debug_hides_secret() {
        let rendered = format!("{:?}", GitLabConfig::new("id", "very-secret"));
        assert!(!rendered.contains("very-secret"));
    }
}
