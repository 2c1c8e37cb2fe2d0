//! Core of the branch protection sync.
//!
//! A run reads the protection of one source repository with
//! [`ProtectionReader`], lists every repository of the owner and hands both to
//! the [`SyncEngine`], which applies the configuration to each target under
//! bounded parallelism and the shared rate limit.
//!
//! # Example
//!
//! ```rust,no_run
//! use github_client::{create_token_client, GitHubClient};
//! use protection_sync_core::{synchronize, SyncSettings};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(GitHubClient::new(create_token_client("ghp_example", None)?));
//! let report = synchronize(
//!     client,
//!     "my-org",
//!     "template-repo",
//!     SyncSettings::default(),
//!     &CancellationToken::new(),
//! )
//! .await?;
//! println!("applied to {} repositories", report.applied());
//! # Ok(())
//! # }
//! ```

use github_client::ProtectionClient;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

pub mod errors;
pub use errors::{SyncError, TargetValidationError};

pub mod rate_governor;
pub use rate_governor::RateGovernor;

pub mod reader;
pub use reader::ProtectionReader;

pub mod sync_engine;
pub use sync_engine::{concurrency_limit, SyncEngine};

pub mod translator;
pub use translator::to_apply_payload;

pub mod types;
pub use types::{
    ApplyOutcome, ProtectionConfig, RulesetCollection, SyncReport, SyncSettings, TargetReport,
    TargetRepository, ValidTarget,
};

#[cfg(test)]
mod test_support;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Copies the branch protection of `owner/repo` to every repository of `owner`.
///
/// The source configuration is read completely before any target is touched.
///
/// # Errors
///
/// * `SyncError::ConfigFetch` if the source protection or rulesets cannot be read
/// * `SyncError::TargetList` if the owner's repositories cannot be listed
/// * `SyncError::RateBudget` if the rate limit cannot be read during the run
#[instrument(skip(client, settings, cancel))]
pub async fn synchronize(
    client: Arc<dyn ProtectionClient>,
    owner: &str,
    repo: &str,
    settings: SyncSettings,
    cancel: &CancellationToken,
) -> Result<SyncReport, SyncError> {
    let (config, rulesets) = ProtectionReader::new(client.clone())
        .fetch(owner, repo)
        .await?;

    let repositories = client
        .list_owner_repositories(owner)
        .await
        .map_err(|source| {
            error!(owner = owner, error = %source, "Failed to list repositories");
            SyncError::TargetList {
                owner: owner.to_string(),
                source,
            }
        })?;
    info!(
        owner = owner,
        count = repositories.len(),
        "Listed target repositories"
    );

    let targets = repositories
        .into_iter()
        .map(TargetRepository::from)
        .collect();

    SyncEngine::new(client, settings)
        .with_rulesets(rulesets)
        .run(owner, &config, targets, cancel)
        .await
}
