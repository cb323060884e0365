//! SCM provider contract.
//!
//! [`ScmProvider`] is the capability set the orchestration platform relies on.
//! It is implemented by [`gitlab::GitLabScm`]. Methods return `Send` futures via
//! return-position `impl Future`, so callers can spawn them without `async-trait`
//! or boxed trait objects.

pub mod gitlab;
pub mod types;

pub use types::*;

use std::future::Future;

use crate::{
    breaker::BreakerStats,
    checkout::{CheckoutCommand, CheckoutRequest},
    errors::ScmResult,
};

pub trait ScmProvider: Send + Sync {
    /// Resolves a checkout URL into an SCM URI (`host:projectId:branch`).
    fn parse_url(
        &self,
        checkout_url: &str,
        token: &str,
    ) -> impl Future<Output = ScmResult<String>> + Send;

    /// Shell step that clones and checks out the requested revision.
    fn get_checkout_command(&self, request: &CheckoutRequest) -> CheckoutCommand;

    fn decorate_url(
        &self,
        scm_uri: &str,
        token: &str,
    ) -> impl Future<Output = ScmResult<UrlDecoration>> + Send;

    fn decorate_commit(
        &self,
        scm_uri: &str,
        sha: &str,
        token: &str,
    ) -> impl Future<Output = ScmResult<CommitDecoration>> + Send;

    fn decorate_author(
        &self,
        username: &str,
        token: &str,
    ) -> impl Future<Output = ScmResult<Author>> + Send;

    fn get_permissions(
        &self,
        scm_uri: &str,
        token: &str,
    ) -> impl Future<Output = ScmResult<Permissions>> + Send;

    /// Head commit of the branch named by the SCM URI.
    fn get_commit_sha(
        &self,
        scm_uri: &str,
        token: &str,
    ) -> impl Future<Output = ScmResult<String>> + Send;

    fn update_commit_status(
        &self,
        update: &CommitStatusUpdate,
        token: &str,
    ) -> impl Future<Output = ScmResult<()>> + Send;

    /// File contents as text; `git_ref` defaults to the SCM URI's branch.
    fn get_file(
        &self,
        scm_uri: &str,
        path: &str,
        token: &str,
        git_ref: Option<&str>,
    ) -> impl Future<Output = ScmResult<String>> + Send;

    fn get_bell_configuration(&self) -> BellConfiguration;

    fn stats(&self) -> BreakerStats;
}
