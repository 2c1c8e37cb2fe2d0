//! Crate for interacting with the GitHub REST API.
//!
//! This crate provides the calls a branch protection sync needs: reading a
//! repository, its branch protection and its rulesets, listing the repositories
//! of an owner, reading the rate limit budget and writing branch protection and
//! rulesets. Requests are authenticated with a personal access token.
//!
//! Responses are read raw and their status codes mapped by [`Error::from_status`],
//! because some statuses that octocrab would treat as failures (HTTP 303 when a
//! protection pattern already exists) are meaningful to callers.

use async_trait::async_trait;
use octocrab::Octocrab;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

pub mod errors;
pub use errors::Error;

pub mod branch_protection;
pub use branch_protection::{
    ApplyStatus, BranchProtection, BranchRestrictions, BranchRestrictionsRequest,
    DismissalRestrictions, DismissalRestrictionsRequest, EnabledSetting, ProtectionRequest,
    PullRequestReviews, PullRequestReviewsRequest, RequiredStatusChecks, SlugRef, StatusCheck,
    UserRef,
};

pub mod rate_limit;
pub use rate_limit::RateLimit;

pub mod repository;
pub use repository::{Owner, Repository};

pub mod ruleset;
pub use ruleset::Ruleset;

// Reference the tests module in the separate file
#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Number of repositories requested per page when listing an owner.
const REPOSITORIES_PER_PAGE: usize = 100;

/// HTTP status GitHub uses when the same branch name pattern already exists.
const STATUS_PATTERN_EXISTS: u16 = 303;

/// Trait for the GitHub operations used by a branch protection sync.
///
/// [`GitHubClient`] implements this against the REST API; tests substitute
/// in-memory implementations.
#[async_trait]
pub trait ProtectionClient: Send + Sync {
    /// Fetches a repository, including its default branch.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the repository does not exist or is not
    /// visible to the credential, `Error::AuthError` if the credential is
    /// rejected and `Error::UpstreamError` for any other failure status.
    async fn get_repository(&self, owner: &str, repo: &str) -> Result<Repository, Error>;

    /// Fetches the branch protection of a branch.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the branch does not exist or is not protected.
    async fn get_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<BranchProtection, Error>;

    /// Lists the rulesets of a repository as returned by the list endpoint,
    /// which omits the rules themselves.
    async fn list_ruleset_summaries(&self, owner: &str, repo: &str)
        -> Result<Vec<Ruleset>, Error>;

    /// Lists the rulesets of a repository, each with its rules.
    async fn list_rulesets(&self, owner: &str, repo: &str) -> Result<Vec<Ruleset>, Error>;

    /// Lists every repository owned by an organization or, failing that, a user.
    ///
    /// All pages are fetched before returning.
    async fn list_owner_repositories(&self, owner: &str) -> Result<Vec<Repository>, Error>;

    /// Reads the current core rate limit window.
    async fn get_rate_limit(&self) -> Result<RateLimit, Error>;

    /// Replaces the branch protection of a branch.
    ///
    /// Returns `ApplyStatus::AlreadyExists` when GitHub answers that the same
    /// branch name pattern already exists.
    async fn update_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        protection: &ProtectionRequest,
    ) -> Result<ApplyStatus, Error>;

    /// Creates a ruleset on a repository.
    async fn create_ruleset(
        &self,
        owner: &str,
        repo: &str,
        ruleset: &Ruleset,
    ) -> Result<ApplyStatus, Error>;
}

/// A client for interacting with the GitHub API, authenticated with a token.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Octocrab,
}

/// HTTP verbs used by the client.
#[derive(Debug, Clone, Copy)]
enum Method {
    Get,
    Post,
    Put,
}

/// A response whose body has been read but not interpreted.
#[derive(Debug)]
struct RawResponse {
    status: u16,
    body: String,
}

impl RawResponse {
    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Converts a failure status into an error carrying GitHub's message.
    fn into_error(self) -> Error {
        let message = serde_json::from_str::<Value>(&self.body)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or(self.body);
        Error::from_status(self.status, message)
    }

    fn json<T: DeserializeOwned>(self) -> Result<T, Error> {
        if !self.is_success() {
            return Err(self.into_error());
        }
        Ok(serde_json::from_str(&self.body)?)
    }
}

impl GitHubClient {
    /// Creates a new `GitHubClient` from an authenticated `Octocrab` instance.
    ///
    /// Use [`create_token_client`] to build the `Octocrab` instance.
    pub fn new(client: Octocrab) -> Self {
        Self { client }
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<RawResponse, Error> {
        debug!(method = ?method, path = path, "Sending GitHub API request");
        let result = match method {
            Method::Get => self.client._get(path).await,
            Method::Post => self.client._post(path, body).await,
            Method::Put => self.client._put(path, body).await,
        };

        let response = result.map_err(|e| {
            let message = e.to_string();
            log_octocrab_error("GitHub API request failed", e);
            Error::ApiError(message)
        })?;

        let status = response.status().as_u16();
        let body = self.client.body_to_string(response).await.map_err(|e| {
            let message = e.to_string();
            log_octocrab_error("Failed to read GitHub API response body", e);
            Error::ApiError(message)
        })?;

        debug!(path = path, status = status, "Received GitHub API response");
        Ok(RawResponse { status, body })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.send(Method::Get, path, None).await?.json()
    }

    /// Fetches every page of a repository listing.
    async fn list_repository_pages(&self, base_path: &str) -> Result<Vec<Repository>, Error> {
        let mut repositories = Vec::new();
        let mut page = 1;
        loop {
            let path = format!(
                "{}?per_page={}&page={}",
                base_path, REPOSITORIES_PER_PAGE, page
            );
            let batch: Vec<Repository> = self.get_json(&path).await?;
            let batch_len = batch.len();
            repositories.extend(batch);

            debug!(
                path = base_path,
                page = page,
                count = batch_len,
                "Fetched repository page"
            );

            if batch_len < REPOSITORIES_PER_PAGE {
                break;
            }
            page += 1;
        }

        Ok(repositories)
    }
}

#[async_trait]
impl ProtectionClient for GitHubClient {
    #[instrument(skip(self), fields(owner = %owner, repo = %repo))]
    async fn get_repository(&self, owner: &str, repo: &str) -> Result<Repository, Error> {
        let path = format!("/repos/{}/{}", owner, repo);
        self.get_json(&path).await
    }

    #[instrument(skip(self), fields(owner = %owner, repo = %repo, branch = %branch))]
    async fn get_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<BranchProtection, Error> {
        let path = format!("/repos/{}/{}/branches/{}/protection", owner, repo, branch);
        self.get_json(&path).await
    }

    #[instrument(skip(self), fields(owner = %owner, repo = %repo))]
    async fn list_ruleset_summaries(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<Ruleset>, Error> {
        let path = format!("/repos/{}/{}/rulesets?includes_parents=false", owner, repo);
        self.get_json(&path).await
    }

    #[instrument(skip(self), fields(owner = %owner, repo = %repo))]
    async fn list_rulesets(&self, owner: &str, repo: &str) -> Result<Vec<Ruleset>, Error> {
        let summaries = self.list_ruleset_summaries(owner, repo).await?;

        let mut rulesets = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let ruleset = match summary.id {
                Some(id) if !summary.has_rules() => {
                    let path = format!("/repos/{}/{}/rulesets/{}", owner, repo, id);
                    self.get_json(&path).await?
                }
                _ => summary,
            };
            rulesets.push(ruleset);
        }

        info!(
            owner = owner,
            repo = repo,
            count = rulesets.len(),
            "Retrieved repository rulesets"
        );
        Ok(rulesets)
    }

    #[instrument(skip(self), fields(owner = %owner))]
    async fn list_owner_repositories(&self, owner: &str) -> Result<Vec<Repository>, Error> {
        let org_path = format!("/orgs/{}/repos", owner);
        match self.list_repository_pages(&org_path).await {
            Ok(repositories) => Ok(repositories),
            Err(Error::NotFound) => {
                warn!(
                    owner = owner,
                    "Owner is not an organization, listing user repositories instead"
                );
                let user_path = format!("/users/{}/repos", owner);
                self.list_repository_pages(&user_path).await
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self))]
    async fn get_rate_limit(&self) -> Result<RateLimit, Error> {
        let response: rate_limit::RateLimitResponse = self.get_json("/rate_limit").await?;
        RateLimit::try_from(response)
    }

    #[instrument(skip(self, protection), fields(owner = %owner, repo = %repo, branch = %branch))]
    async fn update_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        protection: &ProtectionRequest,
    ) -> Result<ApplyStatus, Error> {
        let path = format!("/repos/{}/{}/branches/{}/protection", owner, repo, branch);
        let body = serde_json::to_value(protection)?;
        let response = self.send(Method::Put, &path, Some(&body)).await?;

        match response.status {
            STATUS_PATTERN_EXISTS => {
                info!(
                    owner = owner,
                    repo = repo,
                    status = response.status,
                    "Same branch name pattern already exists"
                );
                Ok(ApplyStatus::AlreadyExists)
            }
            _ if response.is_success() => Ok(ApplyStatus::Updated),
            _ => Err(response.into_error()),
        }
    }

    #[instrument(skip(self, ruleset), fields(owner = %owner, repo = %repo, ruleset = %ruleset.name))]
    async fn create_ruleset(
        &self,
        owner: &str,
        repo: &str,
        ruleset: &Ruleset,
    ) -> Result<ApplyStatus, Error> {
        let path = format!("/repos/{}/{}/rulesets", owner, repo);
        let body = ruleset.to_create_payload();
        let response = self.send(Method::Post, &path, Some(&body)).await?;

        if response.is_success() {
            Ok(ApplyStatus::Updated)
        } else {
            Err(response.into_error())
        }
    }
}

/// Creates an `Octocrab` client authenticated with a personal access token.
///
/// # Arguments
///
/// * `token` - A personal access token or installation token.
/// * `base_uri` - API root to use instead of `https://api.github.com`, e.g.
///   for GitHub Enterprise Server.
///
/// # Errors
///
/// Returns an `Error::AuthError` if the base URI is rejected or the client
/// cannot be built.
///
/// # Example
///
/// ```rust,no_run
/// use github_client::{create_token_client, GitHubClient, Error};
///
/// fn main() -> Result<(), Error> {
///     let octocrab = create_token_client("ghp_example", None)?;
///     let client = GitHubClient::new(octocrab);
///     Ok(())
/// }
/// ```
#[instrument(skip(token))]
pub fn create_token_client(token: &str, base_uri: Option<&Url>) -> Result<Octocrab, Error> {
    let mut builder = Octocrab::builder().personal_token(token.to_string());
    if let Some(uri) = base_uri {
        builder = builder.base_uri(uri.as_str()).map_err(|e| {
            error!(base_uri = %uri, error = %e, "Invalid GitHub API base URI");
            Error::AuthError(format!("Invalid GitHub API base URI '{}': {}", uri, e))
        })?;
    }

    builder.build().map_err(|e| {
        error!(error = ?e, "Failed to build Octocrab client with token credentials");
        Error::AuthError("Failed to build the GitHub client.".to_string())
    })
}

fn log_octocrab_error(message: &str, e: octocrab::Error) {
    match e {
        octocrab::Error::GitHub { source, backtrace } => error!(
            error_message = source.message,
            backtrace = backtrace.to_string(),
            "{}. Received an error from GitHub",
            message
        ),
        octocrab::Error::Uri { source, backtrace } => error!(
            error_message = source.to_string(),
            backtrace = backtrace.to_string(),
            "{}. Failed to parse URI.",
            message
        ),
        _ => error!(error_message = e.to_string(), message),
    };
}
