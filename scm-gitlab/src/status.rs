//! Build outcome → GitLab commit status mapping.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Build outcome reported by the orchestration platform.
///
/// Anything outside the known set parses to `Unknown` and is reported like a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BuildStatus {
    Success,
    Failure,
    Aborted,
    Running,
    Queued,
    Unknown(String),
}

/// GitLab commit status `state` values used by this adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitState {
    Success,
    Pending,
    Failure,
}

impl CommitState {
    pub fn as_str(self) -> &'static str {
        match self {
            CommitState::Success => "success",
            CommitState::Pending => "pending",
            CommitState::Failure => "failure",
        }
    }
}

impl BuildStatus {
    pub fn state(&self) -> CommitState {
        match self {
            BuildStatus::Success => CommitState::Success,
            BuildStatus::Running | BuildStatus::Queued => CommitState::Pending,
            BuildStatus::Failure | BuildStatus::Aborted | BuildStatus::Unknown(_) => {
                CommitState::Failure
            }
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BuildStatus::Success => "Everything looks good!",
            BuildStatus::Failure | BuildStatus::Unknown(_) => "Did not work as expected.",
            BuildStatus::Aborted => "Aborted mid-flight",
            BuildStatus::Running => "Testing your code...",
            BuildStatus::Queued => "Looking good so far!",
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            BuildStatus::Success => "SUCCESS",
            BuildStatus::Failure => "FAILURE",
            BuildStatus::Aborted => "ABORTED",
            BuildStatus::Running => "RUNNING",
            BuildStatus::Queued => "QUEUED",
            BuildStatus::Unknown(raw) => raw,
        }
    }
}

impl From<&str> for BuildStatus {
    fn from(raw: &str) -> Self {
        match raw {
            "SUCCESS" => BuildStatus::Success,
            "FAILURE" => BuildStatus::Failure,
            "ABORTED" => BuildStatus::Aborted,
            "RUNNING" => BuildStatus::Running,
            "QUEUED" => BuildStatus::Queued,
            other => BuildStatus::Unknown(other.to_string()),
        }
    }
}

impl From<String> for BuildStatus {
    fn from(raw: String) -> Self {
        BuildStatus::from(raw.as_str())
    }
}

impl From<BuildStatus> for String {
    fn from(status: BuildStatus) -> Self {
        status.as_str().to_string()
    }
}

impl FromStr for BuildStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(BuildStatus::from(s))
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status context label shown next to the commit.
pub fn status_context(job_name: Option<&str>) -> String {
    match job_name.map(str::trim).filter(|s| !s.is_empty()) {
        Some(job) => format!("Screwdriver/{job}"),
        None => "Screwdriver".to_string(),
    }
}
