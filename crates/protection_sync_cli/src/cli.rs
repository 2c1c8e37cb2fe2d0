//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use url::Url;

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;

/// Protection Sync: copy one repository's branch protection to every
/// repository of an organization or user
#[derive(Parser)]
#[command(name = "protection-sync", version)]
#[command(
    about = "Copy a repository's branch protection to every repository of its owner",
    long_about = None
)]
pub struct Cli {
    /// Organization or user whose repositories are updated
    #[arg(short = 'o', long)]
    pub owner: String,

    /// Repository whose default branch protection is copied
    #[arg(short = 'r', long)]
    pub repo: String,

    /// GitHub token with administration access to the repositories
    #[arg(short = 't', long)]
    pub token: String,

    /// Path to a TOML configuration file
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Also create the source repository's rulesets on every target
    #[arg(long)]
    pub sync_rulesets: bool,

    /// GitHub API root, e.g. for GitHub Enterprise Server
    #[arg(long)]
    pub api_url: Option<Url>,
}
