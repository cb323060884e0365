use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct FileRequest {
    pub scm_uri: String,
    /// Repository-relative file path.
    pub path: String,
    /// Branch, tag or sha; the SCM URI's branch when absent.
    #[serde(default, rename = "ref")]
    pub git_ref: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub path: String,
    pub content: String,
}
