//! GitLab provider (REST v3).
//!
//! Endpoints used:
//!   * GET  /projects/:id
//!   * GET  /projects/:namespace%2Frepo
//!   * GET  /projects/:id/repository/branches/:branch
//!   * GET  /projects/:id/repository/commits/:sha
//!   * POST /projects/:id/statuses/:sha
//!   * GET  /projects/:id/repository/files?file_path=:path&ref=:ref
//!   * GET  /users?username=:username
//!
//! Every call goes decode → gateway → validate → shape; nothing is cached
//! between calls.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    breaker::BreakerStats,
    checkout::{CheckoutCommand, CheckoutRequest, checkout_command},
    config::GitLabConfig,
    errors::{ScmError, ScmResult},
    gateway::{Gateway, ProviderResponse, RequestSpec},
    git_providers::{ScmProvider, types::*},
    scm_uri::{CheckoutUrl, ScmUri, decode_scm_uri, parse_checkout_url},
    status::status_context,
    validator::{ResponseError, check_response},
};

/// GitLab adapter: validated config plus the gateway that owns the breaker.
#[derive(Debug)]
pub struct GitLabScm {
    config: GitLabConfig,
    gateway: Gateway,
}

impl GitLabScm {
    /// Validates the config and builds the HTTP gateway.
    pub fn new(config: GitLabConfig) -> ScmResult<Self> {
        config.validate()?;
        let gateway = Gateway::new(config.api_base(), config.breaker.clone())?;
        info!(
            host = %config.gitlab_host,
            api = %gateway.base_api(),
            failure_threshold = config.breaker.failure_threshold,
            "GitLab SCM adapter initialized"
        );
        Ok(Self { config, gateway })
    }

    /// Checkout URL → SCM URI, looking the project up by its namespaced path.
    pub async fn resolve_checkout_url(&self, checkout_url: &str, token: &str) -> ScmResult<ScmUri> {
        let parsed = parse_checkout_url(checkout_url, &self.config.default_branch)?;
        self.resolve_parsed(&parsed, token).await
    }

    async fn resolve_parsed(&self, parsed: &CheckoutUrl, token: &str) -> ScmResult<ScmUri> {
        let path = format!("projects/{}", urlencoding::encode(&parsed.full_path()));
        let resp = self.gateway.execute(RequestSpec::get(path, token)).await?;
        check_response(&resp).map_err(ScmError::Lookup)?;

        let project: GitLabProjectId = resp.json()?;
        debug!(
            project = %parsed.full_path(),
            id = project.id,
            "resolved checkout url"
        );
        ScmUri::new(&parsed.hostname, project.id.to_string(), &parsed.branch)
    }

    /// SCM URI → host/owner/repo/branch, looking the project up by id.
    pub async fn resolve_scm_uri(&self, scm_uri: &str, token: &str) -> ScmResult<RepositoryRef> {
        let uri = decode_scm_uri(scm_uri)?;
        let project = self.fetch_project(&uri.project_id, token).await?;
        repository_ref(&uri, &project)
    }

    async fn fetch_project(&self, project_id: &str, token: &str) -> ScmResult<GitLabProject> {
        let path = format!("projects/{}", urlencoding::encode(project_id));
        let resp = self.gateway.execute(RequestSpec::get(path, token)).await?;
        check_response(&resp).map_err(ScmError::Lookup)?;
        resp.json()
    }

    async fn fetch_commit(&self, project_id: &str, sha: &str, token: &str) -> ScmResult<GitLabCommit> {
        let path = format!(
            "projects/{}/repository/commits/{}",
            urlencoding::encode(project_id),
            urlencoding::encode(sha)
        );
        let resp = self.gateway.execute(RequestSpec::get(path, token)).await?;
        check_response(&resp).map_err(ScmError::Lookup)?;
        resp.json()
    }

    /// `Ok(None)` when the search succeeds but matches nobody.
    async fn lookup_author(&self, username: &str, token: &str) -> ScmResult<Option<Author>> {
        let spec = RequestSpec::get("users", token).query("username", username);
        let resp = self.gateway.execute(spec).await?;
        check_response(&resp).map_err(ScmError::Lookup)?;

        let users: Vec<GitLabUser> = resp.json()?;
        Ok(users.into_iter().next().map(|u| Author {
            avatar: u
                .avatar_url
                .unwrap_or_else(|| DEFAULT_AUTHOR_AVATAR.to_string()),
            name: u.name,
            username: u.username,
            url: u.web_url.unwrap_or_else(|| DEFAULT_AUTHOR_URL.to_string()),
        }))
    }
}

impl ScmProvider for GitLabScm {
    async fn parse_url(&self, checkout_url: &str, token: &str) -> ScmResult<String> {
        let parsed = parse_checkout_url(checkout_url, &self.config.default_branch)?;
        if !parsed.hostname.eq_ignore_ascii_case(&self.config.gitlab_host) {
            return Err(ScmError::UnsupportedHost {
                host: parsed.hostname,
                expected: self.config.gitlab_host.clone(),
            });
        }
        let uri = self.resolve_parsed(&parsed, token).await?;
        Ok(uri.to_string())
    }

    fn get_checkout_command(&self, request: &CheckoutRequest) -> CheckoutCommand {
        checkout_command(request, &self.config.username, &self.config.email)
    }

    async fn decorate_url(&self, scm_uri: &str, token: &str) -> ScmResult<UrlDecoration> {
        let repo = self.resolve_scm_uri(scm_uri, token).await?;
        let name = format!("{}/{}", repo.owner, repo.repo);
        let url = format!(
            "{}://{}/{}/tree/{}",
            self.config.gitlab_protocol, repo.hostname, name, repo.branch
        );
        Ok(UrlDecoration {
            branch: repo.branch,
            name,
            url,
        })
    }

    async fn decorate_commit(
        &self,
        scm_uri: &str,
        sha: &str,
        token: &str,
    ) -> ScmResult<CommitDecoration> {
        let uri = decode_scm_uri(scm_uri)?;
        let commit = self.fetch_commit(&uri.project_id, sha, token).await?;

        // Both follow-ups depend only on the commit; the project is needed just
        // for a fallback link when GitLab omits `web_url`.
        let author = async {
            match commit.author_name.as_deref().map(str::trim) {
                Some(name) if !name.is_empty() => {
                    Ok(self
                        .lookup_author(name, token)
                        .await?
                        .unwrap_or_else(|| Author {
                            name: name.to_string(),
                            ..Author::unknown()
                        }))
                }
                _ => {
                    debug!(sha, "commit has no author, using default author");
                    Ok::<_, ScmError>(Author::unknown())
                }
            }
        };
        let url = async {
            if let Some(url) = &commit.web_url {
                return Ok::<_, ScmError>(url.clone());
            }
            let project = self.fetch_project(&uri.project_id, token).await?;
            let repo = repository_ref(&uri, &project)?;
            Ok(format!(
                "{}://{}/{}/{}/commit/{}",
                self.config.gitlab_protocol, repo.hostname, repo.owner, repo.repo, sha
            ))
        };

        let (author, url) = tokio::try_join!(author, url)?;

        Ok(CommitDecoration {
            author,
            message: commit.message.unwrap_or_default(),
            url,
        })
    }

    async fn decorate_author(&self, username: &str, token: &str) -> ScmResult<Author> {
        self.lookup_author(username, token).await?.ok_or_else(|| {
            ScmError::Lookup(ResponseError {
                status: 404,
                message: format!("No GitLab user matches username {username}"),
            })
        })
    }

    async fn get_permissions(&self, scm_uri: &str, token: &str) -> ScmResult<Permissions> {
        let uri = decode_scm_uri(scm_uri)?;
        // Only proves the project is visible to the token; access levels are not mapped.
        self.fetch_project(&uri.project_id, token).await?;
        Ok(Permissions {
            admin: true,
            push: true,
            pull: true,
        })
    }

    async fn get_commit_sha(&self, scm_uri: &str, token: &str) -> ScmResult<String> {
        let uri = decode_scm_uri(scm_uri)?;
        let path = format!(
            "projects/{}/repository/branches/{}",
            urlencoding::encode(&uri.project_id),
            urlencoding::encode(&uri.branch)
        );
        let resp = self.gateway.execute(RequestSpec::get(path, token)).await?;
        check_response(&resp).map_err(ScmError::Lookup)?;

        let branch: GitLabBranch = resp.json()?;
        Ok(branch.commit.id)
    }

    async fn update_commit_status(&self, update: &CommitStatusUpdate, token: &str) -> ScmResult<()> {
        let uri = decode_scm_uri(&update.scm_uri)?;
        let state = update.build_status.state();
        let context = status_context(update.job_name.as_deref());

        let path = format!(
            "projects/{}/statuses/{}",
            urlencoding::encode(&uri.project_id),
            urlencoding::encode(&update.sha)
        );
        let spec = RequestSpec::post(path, token)
            .query("context", context.as_str())
            .query("description", update.build_status.description())
            .query("state", state.as_str())
            .query("target_url", update.url.as_str());

        let resp = self.gateway.execute(spec).await?;
        check_response(&resp).map_err(ScmError::Lookup)?;

        info!(
            project = %uri.project_id,
            sha = %update.sha,
            state = state.as_str(),
            %context,
            "commit status updated"
        );
        Ok(())
    }

    async fn get_file(
        &self,
        scm_uri: &str,
        path: &str,
        token: &str,
        git_ref: Option<&str>,
    ) -> ScmResult<String> {
        let uri = decode_scm_uri(scm_uri)?;
        let git_ref = git_ref.unwrap_or(&uri.branch);

        let spec = RequestSpec::get(
            format!("projects/{}/repository/files", urlencoding::encode(&uri.project_id)),
            token,
        )
        .query("file_path", path)
        .query("ref", git_ref);

        let resp: ProviderResponse = self.gateway.execute(spec).await?;
        check_response(&resp).map_err(ScmError::FileNotFound)?;

        let file: GitLabFile = resp.json()?;
        debug!(path, git_ref, encoding = ?file.encoding, "file fetched");
        decode_file_content(file)
    }

    fn get_bell_configuration(&self) -> BellConfiguration {
        BellConfiguration {
            provider: "gitlab".to_string(),
            cookie: format!("gitlab-{}", self.config.gitlab_host),
            client_id: self.config.oauth_client_id.clone(),
            client_secret: self.config.oauth_client_secret.clone(),
            is_secure: self.config.https,
            force_https: self.config.https,
            config: BellProviderConfig {
                uri: self.config.web_base(),
            },
        }
    }

    fn stats(&self) -> BreakerStats {
        self.gateway.stats()
    }
}

fn repository_ref(uri: &ScmUri, project: &GitLabProject) -> ScmResult<RepositoryRef> {
    let (owner, repo) = project
        .path_with_namespace
        .rsplit_once('/')
        .ok_or_else(|| {
            ScmError::InvalidResponse(format!(
                "project path without namespace: {}",
                project.path_with_namespace
            ))
        })?;

    Ok(RepositoryRef {
        hostname: uri.host.clone(),
        owner: owner.to_string(),
        repo: repo.to_string(),
        branch: uri.branch.clone(),
    })
}

fn decode_file_content(file: GitLabFile) -> ScmResult<String> {
    match file.encoding.as_deref() {
        Some("base64") => {
            // GitLab may wrap base64 payloads across lines.
            let compact: String = file.content.split_whitespace().collect();
            let bytes = STANDARD
                .decode(compact)
                .map_err(|e| ScmError::InvalidResponse(format!("invalid base64 content: {e}")))?;
            String::from_utf8(bytes)
                .map_err(|e| ScmError::InvalidResponse(format!("file is not utf-8: {e}")))
        }
        None | Some("text") => Ok(file.content),
        Some(other) => Err(ScmError::InvalidResponse(format!(
            "unsupported file encoding: {other}"
        ))),
    }
}

/// Namespaced project lookup; only the numeric id is needed.
#[derive(Debug, Deserialize)]
struct GitLabProjectId {
    id: u64,
}

/// GitLab project response (subset).
#[derive(Debug, Deserialize)]
struct GitLabProject {
    path_with_namespace: String,
}

#[derive(Debug, Deserialize)]
struct GitLabBranch {
    commit: GitLabBranchCommit,
}

#[derive(Debug, Deserialize)]
struct GitLabBranchCommit {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GitLabCommit {
    #[serde(default)]
    author_name: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    web_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitLabUser {
    username: String,
    name: String,
    #[serde(default)]
    avatar_url: Option<String>,
    #[serde(default)]
    web_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitLabFile {
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(path: &str) -> GitLabProject {
        GitLabProject {
            path_with_namespace: path.to_string(),
        }
    }

    #[test]
    fn repository_ref_keeps_nested_namespace() {
        let uri = ScmUri::new("gitlab.com", "7", "main").unwrap();
        let repo = repository_ref(&uri, &project("org/team/app")).unwrap();
        assert_eq!(repo.owner, "org/team");
        assert_eq!(repo.repo, "app");
        assert_eq!(repo.branch, "main");
        assert_eq!(repo.hostname, "gitlab.com");
    }

    #[test]
    fn repository_ref_requires_namespace() {
        let uri = ScmUri::new("gitlab.com", "7", "main").unwrap();
        assert!(matches!(
            repository_ref(&uri, &project("lonely")),
            Err(ScmError::InvalidResponse(_))
        ));
    }

    #[test]
    fn decodes_wrapped_base64() {
        let file = GitLabFile {
            content: "am9icz\nogW10=\n".into(),
            encoding: Some("base64".into()),
        };
        assert_eq!(decode_file_content(file).unwrap(), "jobs: []");
    }

    #[test]
    fn plain_text_passes_through() {
        let file = GitLabFile {
            content: "hello".into(),
            encoding: None,
        };
        assert_eq!(decode_file_content(file).unwrap(), "hello");
    }

    #[test]
    fn unknown_encoding_is_rejected() {
        let file = GitLabFile {
            content: "x".into(),
            encoding: Some("rot13".into()),
        };
        assert!(decode_file_content(file).is_err());
    }
}
