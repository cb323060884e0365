use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CommitStatusResponse {
    /// GitLab commit state that was posted (`success`, `pending`, `failure`).
    pub state: String,
    pub context: String,
}
