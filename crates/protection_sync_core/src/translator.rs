//! Translation of read-shaped branch protection into the write payload.
//!
//! GitHub treats an omitted section in a protection update as "leave as is"
//! and an empty section as "disable". A sync must make the target identical
//! to the source, so every absent section of the source is written out as an
//! explicit empty value.

use github_client::{
    BranchRestrictions, BranchRestrictionsRequest, DismissalRestrictions,
    DismissalRestrictionsRequest, EnabledSetting, ProtectionRequest, PullRequestReviews,
    PullRequestReviewsRequest, SlugRef, UserRef,
};

use crate::ProtectionConfig;

#[cfg(test)]
#[path = "translator_tests.rs"]
mod tests;

/// Maps a fetched protection configuration to the payload that overwrites a
/// target branch's protection.
///
/// The mapping is pure; calling it twice with the same input yields equal
/// payloads.
pub fn to_apply_payload(config: &ProtectionConfig) -> ProtectionRequest {
    let protection = config.protection();

    ProtectionRequest {
        required_status_checks: protection.required_status_checks.clone(),
        enforce_admins: is_enabled(protection.enforce_admins),
        required_pull_request_reviews: reviews_request(
            protection.required_pull_request_reviews.as_ref(),
        ),
        restrictions: restrictions_request(protection.restrictions.as_ref()),
        required_linear_history: is_enabled(protection.required_linear_history),
        allow_force_pushes: is_enabled(protection.allow_force_pushes),
        allow_deletions: is_enabled(protection.allow_deletions),
        required_conversation_resolution: is_enabled(protection.required_conversation_resolution),
    }
}

fn is_enabled(setting: Option<EnabledSetting>) -> bool {
    setting.map(|s| s.enabled).unwrap_or(false)
}

fn reviews_request(reviews: Option<&PullRequestReviews>) -> PullRequestReviewsRequest {
    let Some(reviews) = reviews else {
        return PullRequestReviewsRequest::default();
    };

    PullRequestReviewsRequest {
        dismissal_restrictions: dismissal_request(reviews.dismissal_restrictions.as_ref()),
        dismiss_stale_reviews: reviews.dismiss_stale_reviews,
        require_code_owner_reviews: reviews.require_code_owner_reviews,
        required_approving_review_count: reviews.required_approving_review_count,
        require_last_push_approval: reviews.require_last_push_approval,
    }
}

fn dismissal_request(
    restrictions: Option<&DismissalRestrictions>,
) -> DismissalRestrictionsRequest {
    match restrictions {
        Some(r) => DismissalRestrictionsRequest {
            users: logins(&r.users),
            teams: slugs(&r.teams),
            apps: slugs(&r.apps),
        },
        None => DismissalRestrictionsRequest::default(),
    }
}

fn restrictions_request(restrictions: Option<&BranchRestrictions>) -> BranchRestrictionsRequest {
    match restrictions {
        Some(r) => BranchRestrictionsRequest {
            users: logins(&r.users),
            teams: slugs(&r.teams),
            apps: slugs(&r.apps),
        },
        None => BranchRestrictionsRequest::default(),
    }
}

fn logins(users: &[UserRef]) -> Vec<String> {
    users.iter().map(|u| u.login.clone()).collect()
}

fn slugs(refs: &[SlugRef]) -> Vec<String> {
    refs.iter().map(|r| r.slug.clone()).collect()
}
