//! Configuration for the protection sync CLI.
//!
//! Settings come from an optional TOML file and from command-line flags.
//! Flags win over the file; anything set in neither falls back to
//! [`SyncSettings::default`].
//!
//! # Example TOML Configuration
//!
//! ```toml
//! api_url = "https://github.example.com/api/v3/"
//!
//! [sync]
//! safety_margin_secs = 5
//! sync_rulesets = true
//! ```

use std::{fs, path::Path, time::Duration};

use protection_sync_core::SyncSettings;
use secrecy::SecretString;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::{cli::Cli, errors::Error};

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Contents of the configuration file.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// API root for GitHub Enterprise Server
    #[serde(default)]
    pub api_url: Option<String>,

    #[serde(default)]
    pub sync: SyncConfig,
}

/// The `[sync]` table of the configuration file.
#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct SyncConfig {
    #[serde(default = "SyncConfig::default_safety_margin_secs")]
    pub safety_margin_secs: u64,

    #[serde(default)]
    pub sync_rulesets: bool,
}

impl SyncConfig {
    fn default_safety_margin_secs() -> u64 {
        SyncSettings::default().safety_margin.as_secs()
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            safety_margin_secs: Self::default_safety_margin_secs(),
            sync_rulesets: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file at the specified path.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file does not exist, cannot be read or
    /// is not valid TOML for this schema.
    pub fn load(path: &Path) -> Result<Self, Error> {
        debug!("Loading configuration from {:?}", path);

        if !path.exists() {
            return Err(Error::Config(format!(
                "Configuration file not found: {:?}",
                path
            )));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read configuration file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse configuration file: {}", e)))
    }
}

/// Everything needed to start a run.
#[derive(Debug)]
pub struct RunOptions {
    pub owner: String,
    pub repo: String,
    pub token: SecretString,
    pub api_url: Option<Url>,
    pub settings: SyncSettings,
}

impl RunOptions {
    /// Merges the parsed flags with the configuration file, if one was given.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArguments` for empty required values and
    /// `Error::Config` for an unparseable `api_url` in the file.
    pub fn resolve(cli: &Cli, config: Option<AppConfig>) -> Result<Self, Error> {
        let config = config.unwrap_or_default();

        for (flag, value) in [
            ("--owner", &cli.owner),
            ("--repo", &cli.repo),
            ("--token", &cli.token),
        ] {
            if value.trim().is_empty() {
                return Err(Error::InvalidArguments(format!(
                    "{} must not be empty",
                    flag
                )));
            }
        }

        let api_url = match (&cli.api_url, &config.api_url) {
            (Some(url), _) => Some(url.clone()),
            (None, Some(raw)) => Some(Url::parse(raw).map_err(|e| {
                Error::Config(format!("Invalid api_url '{}': {}", raw, e))
            })?),
            (None, None) => None,
        };

        Ok(Self {
            owner: cli.owner.clone(),
            repo: cli.repo.clone(),
            token: SecretString::from(cli.token.clone()),
            api_url,
            settings: SyncSettings {
                safety_margin: Duration::from_secs(config.sync.safety_margin_secs),
                sync_rulesets: cli.sync_rulesets || config.sync.sync_rulesets,
            },
        })
    }
}
