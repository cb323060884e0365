//! GitLab source-control adapter for a CI orchestration platform.
//!
//! The platform addresses repositories through opaque SCM URIs
//! (`host:projectId:branch`). This crate resolves them against GitLab's REST
//! API, reads commit/author metadata, posts commit statuses and fetches files.
//! Every outbound call goes through a [`gateway::Gateway`] whose circuit
//! breaker fails fast while GitLab is unhealthy.
//!
//! Entry point: [`GitLabScm`], used through the [`ScmProvider`] contract.

pub mod breaker;
pub mod checkout;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod git_providers;
pub mod scm_uri;
pub mod status;
pub mod telemetry;
pub mod validator;

pub use breaker::{BreakerOptions, BreakerState, BreakerStats};
pub use checkout::{CheckoutCommand, CheckoutRequest};
pub use config::GitLabConfig;
pub use errors::{ConfigError, ScmError, ScmResult};
pub use git_providers::{ScmProvider, gitlab::GitLabScm, types::*};
pub use scm_uri::{CheckoutUrl, ScmUri, decode_scm_uri, encode_scm_uri, parse_checkout_url};
pub use status::BuildStatus;
