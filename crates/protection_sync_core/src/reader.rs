//! Reads the canonical configuration from the source repository.

use github_client::{Error, ProtectionClient};
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::{ProtectionConfig, RulesetCollection, SyncError};

#[cfg(test)]
#[path = "reader_tests.rs"]
mod tests;

/// Fetches the protection and rulesets of the source repository.
pub struct ProtectionReader {
    client: Arc<dyn ProtectionClient>,
}

impl ProtectionReader {
    pub fn new(client: Arc<dyn ProtectionClient>) -> Self {
        Self { client }
    }

    /// Resolves the default branch of `owner/repo`, then reads its branch
    /// protection and the repository's rulesets.
    ///
    /// The read is all or nothing.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::ConfigFetch` wrapping `Error::NotFound` if the
    /// repository, its default branch or the branch protection is missing,
    /// `Error::AuthError` if the credential is rejected and
    /// `Error::UpstreamError` for any other failure status.
    #[instrument(skip(self), fields(owner = %owner, repo = %repo))]
    pub async fn fetch(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<(ProtectionConfig, RulesetCollection), SyncError> {
        self.read(owner, repo).await.map_err(|source| {
            error!(owner = owner, repo = repo, error = %source, "Failed to read source configuration");
            SyncError::ConfigFetch {
                owner: owner.to_string(),
                repo: repo.to_string(),
                source,
            }
        })
    }

    async fn read(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<(ProtectionConfig, RulesetCollection), Error> {
        let repository = self.client.get_repository(owner, repo).await?;
        let branch = repository
            .default_branch()
            .filter(|b| !b.is_empty())
            .ok_or(Error::NotFound)?
            .to_string();

        let protection = self
            .client
            .get_branch_protection(owner, repo, &branch)
            .await?;
        let rulesets = self.client.list_rulesets(owner, repo).await?;

        info!(
            owner = owner,
            repo = repo,
            branch = branch.as_str(),
            rulesets = rulesets.len(),
            "Read source protection configuration"
        );

        let source = format!("{}/{}", owner, repo);
        Ok((
            ProtectionConfig::new(source, branch, protection),
            RulesetCollection::new(rulesets),
        ))
    }
}
