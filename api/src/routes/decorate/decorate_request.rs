use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct DecorateCommitRequest {
    pub scm_uri: String,
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub struct DecorateAuthorRequest {
    pub username: String,
}
