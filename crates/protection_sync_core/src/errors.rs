//! Error types for a protection sync run.
//!
//! Errors fall in two groups. [`SyncError`] ends the run: without the source
//! configuration, the list of targets or visibility into the rate budget there
//! is nothing safe left to do. [`TargetValidationError`] only concerns a single
//! target, which is skipped while the rest of the run continues. Failures of
//! the apply call itself never become errors at this level; they are recorded
//! as [`crate::ApplyOutcome::Failed`].

use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that terminate a sync run.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Reading the protection or rulesets of the source repository failed.
    #[error("Failed to fetch the protection configuration of {owner}/{repo}: {source}")]
    ConfigFetch {
        owner: String,
        repo: String,
        #[source]
        source: github_client::Error,
    },

    /// Listing the repositories of the owner failed.
    #[error("Failed to list the repositories of {owner}: {source}")]
    TargetList {
        owner: String,
        #[source]
        source: github_client::Error,
    },

    /// The rate limit budget could not be read.
    #[error("Failed to read the API rate limit: {source}")]
    RateBudget {
        #[source]
        source: github_client::Error,
    },
}

/// A target repository is missing a field needed to address its default branch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TargetValidationError {
    #[error("repository has no owner")]
    MissingOwner,

    #[error("repository has no name")]
    MissingName,

    #[error("repository has no default branch")]
    MissingDefaultBranch,
}
