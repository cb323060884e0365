use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ParseUrlRequest {
    /// e.g. `https://gitlab.com/group/project.git#main`
    pub checkout_url: String,
}

/// Body shared by every operation that only needs an SCM URI.
#[derive(Debug, Deserialize)]
pub struct ScmUriRequest {
    pub scm_uri: String,
}

#[derive(Debug, Serialize)]
pub struct ParseUrlResponse {
    pub scm_uri: String,
}

#[derive(Debug, Serialize)]
pub struct CommitShaResponse {
    pub sha: String,
}
