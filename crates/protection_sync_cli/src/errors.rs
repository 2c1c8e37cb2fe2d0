use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur in the protection sync CLI.
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration file could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Command-line arguments were present but unusable.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The GitHub client could not be created.
    #[error("GitHub client error: {0}")]
    GitHub(#[from] github_client::Error),

    /// The sync run ended with a fatal error.
    #[error(transparent)]
    Sync(#[from] protection_sync_core::SyncError),

    /// The run was interrupted before every repository was processed.
    #[error("Sync cancelled: {completed} of {total} repositories completed")]
    Cancelled { completed: usize, total: usize },
}
