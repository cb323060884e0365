//! Provider-agnostic records returned to the orchestration platform.

use serde::{Deserialize, Serialize};

use crate::status::BuildStatus;

pub const DEFAULT_AUTHOR_AVATAR: &str = "https://cd.screwdriver.cd/assets/unknown_user.png";
pub const DEFAULT_AUTHOR_NAME: &str = "n/a";
pub const DEFAULT_AUTHOR_URL: &str = "https://cd.screwdriver.cd/";

/// Repository coordinates recovered from an SCM URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub hostname: String,
    /// Namespace, including nested groups (`org/sub`).
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

/// Profile of a commit author.
///
/// This type never contains any provider access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub avatar: String,
    pub name: String,
    pub username: String,
    pub url: String,
}

impl Author {
    /// Sentinel used when the provider reports no author.
    pub fn unknown() -> Self {
        Self {
            avatar: DEFAULT_AUTHOR_AVATAR.to_string(),
            name: DEFAULT_AUTHOR_NAME.to_string(),
            username: DEFAULT_AUTHOR_NAME.to_string(),
            url: DEFAULT_AUTHOR_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitDecoration {
    pub author: Author,
    pub message: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlDecoration {
    pub branch: String,
    /// `owner/repo`.
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub admin: bool,
    pub push: bool,
    pub pull: bool,
}

/// Commit status report for `update_commit_status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitStatusUpdate {
    pub scm_uri: String,
    pub sha: String,
    pub build_status: BuildStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_name: Option<String>,
    /// Link shown next to the status (build page).
    pub url: String,
}

/// OAuth provider settings consumed by the platform's login layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BellConfiguration {
    pub provider: String,
    pub cookie: String,
    pub client_id: String,
    pub client_secret: String,
    pub is_secure: bool,
    pub force_https: bool,
    pub config: BellProviderConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BellProviderConfig {
    pub uri: String,
}
