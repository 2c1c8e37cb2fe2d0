//! Branch protection domain types.
//!
//! GitHub uses two different shapes for branch protection. The read shape
//! returned by `GET /repos/{owner}/{repo}/branches/{branch}/protection` nests
//! every flag in an object and lists full user, team and app records. The write
//! shape accepted by `PUT` on the same path uses plain booleans and login/slug
//! lists. [`BranchProtection`] models the former, [`ProtectionRequest`] the latter.
//!
//! See: https://docs.github.com/en/rest/branches/branch-protection

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "branch_protection_tests.rs"]
mod tests;

/// Branch protection settings as read from a repository branch.
///
/// Every nested section is optional. GitHub omits a section, or returns it as
/// `null`, when the corresponding feature is turned off.
///
/// # Examples
///
/// ```rust
/// use github_client::{BranchProtection, EnabledSetting};
///
/// let protection = BranchProtection {
///     enforce_admins: Some(EnabledSetting { enabled: true }),
///     ..Default::default()
/// };
/// assert!(protection.required_pull_request_reviews.is_none());
/// ```
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct BranchProtection {
    /// Status checks that must pass before merging
    pub required_status_checks: Option<RequiredStatusChecks>,
    /// Whether the protection also applies to administrators
    pub enforce_admins: Option<EnabledSetting>,
    /// Pull request review requirements
    pub required_pull_request_reviews: Option<PullRequestReviews>,
    /// Who may push to the branch
    pub restrictions: Option<BranchRestrictions>,
    /// Whether merge commits are rejected
    pub required_linear_history: Option<EnabledSetting>,
    /// Whether force pushes are allowed
    pub allow_force_pushes: Option<EnabledSetting>,
    /// Whether the branch may be deleted
    pub allow_deletions: Option<EnabledSetting>,
    /// Whether all review conversations must be resolved before merging
    pub required_conversation_resolution: Option<EnabledSetting>,
}

/// A single on/off flag in the read shape, e.g. `{"enabled": true}`.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct EnabledSetting {
    #[serde(default)]
    pub enabled: bool,
}

/// Required status checks.
///
/// This type is shared by the read and write shapes.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct RequiredStatusChecks {
    /// Whether the branch must be up to date with the base before merging
    #[serde(default)]
    pub strict: bool,
    /// Legacy list of check names
    #[serde(default)]
    pub contexts: Vec<String>,
    /// Check names together with the app expected to report them
    #[serde(default)]
    pub checks: Vec<StatusCheck>,
}

/// A required status check.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct StatusCheck {
    /// Name of the check
    pub context: String,
    /// The app that must set the check; any app when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<i64>,
}

/// Pull request review requirements in the read shape.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct PullRequestReviews {
    /// Who may dismiss reviews; absent when anyone with write access can
    pub dismissal_restrictions: Option<DismissalRestrictions>,
    #[serde(default)]
    pub dismiss_stale_reviews: bool,
    #[serde(default)]
    pub require_code_owner_reviews: bool,
    #[serde(default)]
    pub required_approving_review_count: u32,
    #[serde(default)]
    pub require_last_push_approval: bool,
}

/// Users, teams and apps allowed to dismiss reviews (read shape).
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct DismissalRestrictions {
    #[serde(default)]
    pub users: Vec<UserRef>,
    #[serde(default)]
    pub teams: Vec<SlugRef>,
    #[serde(default)]
    pub apps: Vec<SlugRef>,
}

/// Users, teams and apps allowed to push to the branch (read shape).
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct BranchRestrictions {
    #[serde(default)]
    pub users: Vec<UserRef>,
    #[serde(default)]
    pub teams: Vec<SlugRef>,
    #[serde(default)]
    pub apps: Vec<SlugRef>,
}

/// A user as embedded in protection responses. Only the login is kept.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct UserRef {
    pub login: String,
}

/// A team or app as embedded in protection responses. Only the slug is kept.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct SlugRef {
    pub slug: String,
}

/// The body of a branch protection update.
///
/// An update replaces the whole protection of the branch. A `null`
/// `required_status_checks` turns status checks off; the other sections are
/// always sent so that an empty value explicitly clears the target's setting.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct ProtectionRequest {
    /// Serialized as `null` when `None`; GitHub requires the key
    pub required_status_checks: Option<RequiredStatusChecks>,
    pub enforce_admins: bool,
    pub required_pull_request_reviews: PullRequestReviewsRequest,
    pub restrictions: BranchRestrictionsRequest,
    pub required_linear_history: bool,
    pub allow_force_pushes: bool,
    pub allow_deletions: bool,
    pub required_conversation_resolution: bool,
}

/// Pull request review requirements in the write shape.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct PullRequestReviewsRequest {
    pub dismissal_restrictions: DismissalRestrictionsRequest,
    pub dismiss_stale_reviews: bool,
    pub require_code_owner_reviews: bool,
    pub required_approving_review_count: u32,
    pub require_last_push_approval: bool,
}

/// Review dismissal restrictions in the write shape.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct DismissalRestrictionsRequest {
    pub users: Vec<String>,
    pub teams: Vec<String>,
    pub apps: Vec<String>,
}

/// Push restrictions in the write shape.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct BranchRestrictionsRequest {
    pub users: Vec<String>,
    pub teams: Vec<String>,
    pub apps: Vec<String>,
}

/// Result of a successful mutating call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyStatus {
    /// GitHub accepted the change (2xx).
    Updated,
    /// An equivalent configuration is already in place (HTTP 303, or a
    /// ruleset with the same name exists).
    AlreadyExists,
}
