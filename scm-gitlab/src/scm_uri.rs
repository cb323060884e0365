//! SCM URI codec and checkout URL parsing.
//!
//! An SCM URI is the opaque `host:projectId:branch` triple the orchestration
//! platform stores for a pipeline. The project id is GitLab's numeric id, so the
//! URI survives repository renames; the branch is chosen by the caller.

use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;

use crate::errors::{ScmError, ScmResult};

const SEPARATOR: char = ':';

/// `https://[user@]host/namespace/repo[.git][#branch]` or `git@host:namespace/repo[.git][#branch]`.
/// Namespace may contain nested groups; the last path segment is the repository.
/// Ports are not accepted: a `:` after the https host would be read as a namespace.
static CHECKOUT_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:https?://(?:[^@/\s]+@)?([^/:@\s]+)/|git@([^/:@\s]+):)([^\s#:]+)/([^\s/#:]+?)(?:\.git)?(?:#(\S+))?$",
    )
    .expect("checkout url regex is valid")
});

/// Components of a human checkout URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutUrl {
    pub hostname: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl CheckoutUrl {
    /// `owner/repo`, the GitLab `path_with_namespace`.
    pub fn full_path(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// Parses a checkout URL; `default_branch` applies when no `#branch` suffix is given.
pub fn parse_checkout_url(url: &str, default_branch: &str) -> ScmResult<CheckoutUrl> {
    let caps = CHECKOUT_URL
        .captures(url.trim())
        .ok_or_else(|| ScmError::MalformedUrl(url.to_string()))?;

    let hostname = caps
        .get(1)
        .or_else(|| caps.get(2))
        .ok_or_else(|| ScmError::MalformedUrl(url.to_string()))?;
    let branch = caps
        .get(5)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| default_branch.to_string());

    Ok(CheckoutUrl {
        hostname: hostname.as_str().to_string(),
        owner: caps[3].to_string(),
        repo: caps[4].to_string(),
        branch,
    })
}

/// Decoded `host:projectId:branch` triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScmUri {
    pub host: String,
    pub project_id: String,
    pub branch: String,
}

impl ScmUri {
    /// Builds a validated URI.
    pub fn new(
        host: impl Into<String>,
        project_id: impl Into<String>,
        branch: impl Into<String>,
    ) -> ScmResult<Self> {
        let uri = Self {
            host: host.into(),
            project_id: project_id.into(),
            branch: branch.into(),
        };
        uri.validate()?;
        Ok(uri)
    }

    /// Same repository, different branch.
    pub fn with_branch(&self, branch: impl Into<String>) -> ScmResult<Self> {
        Self::new(self.host.clone(), self.project_id.clone(), branch)
    }

    fn validate(&self) -> ScmResult<()> {
        for (name, value) in [
            ("host", &self.host),
            ("project id", &self.project_id),
            ("branch", &self.branch),
        ] {
            if value.is_empty() {
                return Err(ScmError::MalformedUri(format!("{name} must not be empty")));
            }
            if value.contains(SEPARATOR) {
                return Err(ScmError::MalformedUri(format!(
                    "{name} must not contain '{SEPARATOR}': {value}"
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for ScmUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            self.host, self.project_id, self.branch
        )
    }
}

impl FromStr for ScmUri {
    type Err = ScmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_scm_uri(s)
    }
}

/// Joins the three fields with `:`.
pub fn encode_scm_uri(uri: &ScmUri) -> ScmResult<String> {
    uri.validate()?;
    Ok(uri.to_string())
}

/// Splits on `:`; anything other than three non-empty fields is rejected.
pub fn decode_scm_uri(raw: &str) -> ScmResult<ScmUri> {
    let parts: Vec<&str> = raw.split(SEPARATOR).collect();
    let [host, project_id, branch] = parts.as_slice() else {
        return Err(ScmError::MalformedUri(format!(
            "expected host:projectId:branch, got {} field(s) in {raw}",
            parts.len()
        )));
    };
    ScmUri::new(*host, *project_id, *branch)
}
