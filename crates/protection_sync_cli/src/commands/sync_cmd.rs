//! Executes a sync run from resolved options.

use std::sync::Arc;

use github_client::{create_token_client, GitHubClient, ProtectionClient};
use protection_sync_core::{synchronize, SyncReport};
use secrecy::ExposeSecret;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{config::RunOptions, errors::Error};

#[cfg(test)]
#[path = "sync_cmd_tests.rs"]
mod tests;

/// Builds an authenticated GitHub client and runs the sync.
pub async fn execute(options: &RunOptions, cancel: &CancellationToken) -> Result<SyncReport, Error> {
    let octocrab = create_token_client(options.token.expose_secret(), options.api_url.as_ref())?;
    let client: Arc<dyn ProtectionClient> = Arc::new(GitHubClient::new(octocrab));

    info!(
        owner = options.owner.as_str(),
        repo = options.repo.as_str(),
        sync_rulesets = options.settings.sync_rulesets,
        "Starting protection sync"
    );

    let report = synchronize(
        client,
        &options.owner,
        &options.repo,
        options.settings.clone(),
        cancel,
    )
    .await?;

    check_completed(report)
}

/// Turns a report with unfinished repositories into `Error::Cancelled`.
///
/// An interrupt that arrives after every repository finished still counts as
/// a completed run.
pub fn check_completed(report: SyncReport) -> Result<SyncReport, Error> {
    let cancelled = report.cancelled();
    if cancelled > 0 {
        return Err(Error::Cancelled {
            completed: report.targets.len() - cancelled,
            total: report.targets.len(),
        });
    }
    Ok(report)
}

/// One line per outcome category, for printing after a run.
pub fn summary(report: &SyncReport) -> String {
    format!(
        "Synchronized {} repositories: {} applied, {} skipped, {} failed",
        report.targets.len(),
        report.applied(),
        report.skipped(),
        report.failed()
    )
}
