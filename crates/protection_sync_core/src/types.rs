//! Domain types shared by the reader, the translator and the sync engine.

use github_client::{BranchProtection, Repository, Ruleset};
use std::fmt;
use std::time::Duration;

use crate::errors::TargetValidationError;

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;

/// The protection settings of the source repository's default branch.
///
/// A `ProtectionConfig` is only produced by [`crate::ProtectionReader`] and
/// exposes no mutators, so every apply task of a run sees the same settings.
#[derive(Clone, Debug, PartialEq)]
pub struct ProtectionConfig {
    source: String,
    branch: String,
    protection: BranchProtection,
}

impl ProtectionConfig {
    pub(crate) fn new(source: String, branch: String, protection: BranchProtection) -> Self {
        Self {
            source,
            branch,
            protection,
        }
    }

    /// The `owner/name` of the repository the settings were read from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The branch of the source repository the settings were read from.
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// The protection settings as read from GitHub.
    pub fn protection(&self) -> &BranchProtection {
        &self.protection
    }
}

/// The rulesets of the source repository, in the order GitHub listed them.
///
/// Rulesets are carried opaquely; see [`Ruleset`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RulesetCollection(Vec<Ruleset>);

impl RulesetCollection {
    pub fn new(rulesets: Vec<Ruleset>) -> Self {
        Self(rulesets)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Rulesets defined on the repository itself rather than inherited from
    /// its organization. Only these can be recreated on a target.
    pub fn repository_owned(&self) -> impl Iterator<Item = &Ruleset> {
        self.0.iter().filter(|r| r.is_repository_owned())
    }
}

impl From<Vec<Ruleset>> for RulesetCollection {
    fn from(rulesets: Vec<Ruleset>) -> Self {
        Self(rulesets)
    }
}

/// A repository that protection should be applied to.
///
/// Fields are kept optional because repository listings can contain
/// incomplete entries. Use [`TargetRepository::validate`] before addressing
/// the repository.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TargetRepository {
    pub owner: Option<String>,
    pub name: Option<String>,
    pub default_branch: Option<String>,
}

impl TargetRepository {
    pub fn new(owner: &str, name: &str, default_branch: &str) -> Self {
        Self {
            owner: Some(owner.to_string()),
            name: Some(name.to_string()),
            default_branch: Some(default_branch.to_string()),
        }
    }

    /// A human readable label for log lines, also for invalid targets.
    pub fn label(&self) -> String {
        format!(
            "{}/{}",
            self.owner.as_deref().unwrap_or("<unknown>"),
            self.name.as_deref().unwrap_or("<unknown>")
        )
    }

    /// Checks that the owner, name and default branch are all present.
    ///
    /// Empty strings are treated as missing.
    pub fn validate(&self) -> Result<ValidTarget<'_>, TargetValidationError> {
        let owner = non_empty(&self.owner).ok_or(TargetValidationError::MissingOwner)?;
        let name = non_empty(&self.name).ok_or(TargetValidationError::MissingName)?;
        let branch =
            non_empty(&self.default_branch).ok_or(TargetValidationError::MissingDefaultBranch)?;

        Ok(ValidTarget {
            owner,
            name,
            branch,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl From<Repository> for TargetRepository {
    fn from(repo: Repository) -> Self {
        Self {
            owner: repo.owner_login().map(str::to_string),
            name: repo.name().map(str::to_string),
            default_branch: repo.default_branch().map(str::to_string),
        }
    }
}

impl From<&Repository> for TargetRepository {
    fn from(repo: &Repository) -> Self {
        Self::from(repo.clone())
    }
}

/// A target whose identifying fields are known to be present.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidTarget<'a> {
    pub owner: &'a str,
    pub name: &'a str,
    pub branch: &'a str,
}

impl fmt::Display for ValidTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// The terminal result of applying protection to one target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Protection was written, or an identical pattern already existed.
    Applied,
    /// The target lacked an owner, name or default branch.
    SkippedInvalid { reason: String },
    /// GitHub rejected the apply call.
    Failed { reason: String },
    /// The run was cancelled before this target completed.
    Cancelled,
}

impl ApplyOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ApplyOutcome::Applied)
    }
}

impl fmt::Display for ApplyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyOutcome::Applied => write!(f, "applied"),
            ApplyOutcome::SkippedInvalid { reason } => write!(f, "skipped-invalid ({})", reason),
            ApplyOutcome::Failed { reason } => write!(f, "failed ({})", reason),
            ApplyOutcome::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A target paired with its outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetReport {
    pub target: TargetRepository,
    pub outcome: ApplyOutcome,
}

/// The per-target outcomes of a run, in the order the targets were given.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub targets: Vec<TargetReport>,
    pub concurrency_limit: usize,
    pub was_cancelled: bool,
}

impl SyncReport {
    pub fn outcomes(&self) -> impl Iterator<Item = &ApplyOutcome> {
        self.targets.iter().map(|t| &t.outcome)
    }

    pub fn applied(&self) -> usize {
        self.count(|o| matches!(o, ApplyOutcome::Applied))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ApplyOutcome::SkippedInvalid { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ApplyOutcome::Failed { .. }))
    }

    pub fn cancelled(&self) -> usize {
        self.count(|o| matches!(o, ApplyOutcome::Cancelled))
    }

    fn count(&self, predicate: impl Fn(&ApplyOutcome) -> bool) -> usize {
        self.outcomes().filter(|o| predicate(o)).count()
    }
}

/// Tunables for a sync run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncSettings {
    /// Extra wait after the rate limit window resets before resuming.
    pub safety_margin: Duration,
    /// Whether the source repository's rulesets are created on targets.
    pub sync_rulesets: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            safety_margin: Duration::from_secs(1),
            sync_rulesets: false,
        }
    }
}
