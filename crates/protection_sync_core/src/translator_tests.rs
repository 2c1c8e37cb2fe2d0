use super::*;
use github_client::{BranchProtection, RequiredStatusChecks, StatusCheck};
use serde_json::json;

fn config(protection: BranchProtection) -> ProtectionConfig {
    ProtectionConfig::new("octo/template".to_string(), "main".to_string(), protection)
}

fn full_protection() -> BranchProtection {
    BranchProtection {
        required_status_checks: Some(RequiredStatusChecks {
            strict: true,
            contexts: vec!["ci/build".to_string()],
            checks: vec![StatusCheck {
                context: "ci/build".to_string(),
                app_id: Some(15368),
            }],
        }),
        enforce_admins: Some(EnabledSetting { enabled: true }),
        required_pull_request_reviews: Some(PullRequestReviews {
            dismissal_restrictions: Some(DismissalRestrictions {
                users: vec![UserRef {
                    login: "octocat".to_string(),
                }],
                teams: vec![SlugRef {
                    slug: "maintainers".to_string(),
                }],
                apps: vec![],
            }),
            dismiss_stale_reviews: true,
            require_code_owner_reviews: true,
            required_approving_review_count: 2,
            require_last_push_approval: false,
        }),
        restrictions: Some(BranchRestrictions {
            users: vec![UserRef {
                login: "release-bot".to_string(),
            }],
            teams: vec![],
            apps: vec![SlugRef {
                slug: "deployer".to_string(),
            }],
        }),
        required_linear_history: Some(EnabledSetting { enabled: true }),
        allow_force_pushes: Some(EnabledSetting { enabled: false }),
        allow_deletions: Some(EnabledSetting { enabled: true }),
        required_conversation_resolution: Some(EnabledSetting { enabled: true }),
    }
}

#[test]
fn test_translation_is_idempotent() {
    let config = config(full_protection());

    let first = to_apply_payload(&config);
    let second = to_apply_payload(&config);

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap()
    );
}

#[test]
fn test_full_protection_is_copied() {
    let payload = to_apply_payload(&config(full_protection()));

    let checks = payload.required_status_checks.expect("status checks");
    assert!(checks.strict);
    assert_eq!(checks.contexts, vec!["ci/build".to_string()]);
    assert!(payload.enforce_admins);
    assert_eq!(
        payload.required_pull_request_reviews.dismissal_restrictions,
        DismissalRestrictionsRequest {
            users: vec!["octocat".to_string()],
            teams: vec!["maintainers".to_string()],
            apps: vec![],
        }
    );
    assert_eq!(
        payload
            .required_pull_request_reviews
            .required_approving_review_count,
        2
    );
    assert!(payload.required_pull_request_reviews.require_code_owner_reviews);
    assert_eq!(payload.restrictions.users, vec!["release-bot".to_string()]);
    assert_eq!(payload.restrictions.apps, vec!["deployer".to_string()]);
    assert!(payload.required_linear_history);
    assert!(!payload.allow_force_pushes);
    assert!(payload.allow_deletions);
    assert!(payload.required_conversation_resolution);
}

#[test]
fn test_absent_sections_become_explicit_empty_values() {
    let payload = to_apply_payload(&config(BranchProtection::default()));
    let body = serde_json::to_value(&payload).unwrap();

    assert_eq!(
        body,
        json!({
            "required_status_checks": null,
            "enforce_admins": false,
            "required_pull_request_reviews": {
                "dismissal_restrictions": { "users": [], "teams": [], "apps": [] },
                "dismiss_stale_reviews": false,
                "require_code_owner_reviews": false,
                "required_approving_review_count": 0,
                "require_last_push_approval": false
            },
            "restrictions": { "users": [], "teams": [], "apps": [] },
            "required_linear_history": false,
            "allow_force_pushes": false,
            "allow_deletions": false,
            "required_conversation_resolution": false
        })
    );
}

#[test]
fn test_missing_dismissal_restrictions_become_empty_lists() {
    let mut protection = full_protection();
    if let Some(reviews) = protection.required_pull_request_reviews.as_mut() {
        reviews.dismissal_restrictions = None;
    }

    let payload = to_apply_payload(&config(protection));
    let body = serde_json::to_value(&payload).unwrap();

    assert_eq!(
        body["required_pull_request_reviews"]["dismissal_restrictions"],
        json!({ "users": [], "teams": [], "apps": [] })
    );
}

#[test]
fn test_admins_and_approvals_without_restrictions() {
    let protection = BranchProtection {
        enforce_admins: Some(EnabledSetting { enabled: true }),
        required_pull_request_reviews: Some(PullRequestReviews {
            required_approving_review_count: 2,
            ..Default::default()
        }),
        restrictions: None,
        ..Default::default()
    };

    let payload = to_apply_payload(&config(protection));

    assert!(payload.enforce_admins);
    assert_eq!(
        payload
            .required_pull_request_reviews
            .required_approving_review_count,
        2
    );
    assert_eq!(
        serde_json::to_value(&payload.restrictions).unwrap(),
        json!({ "users": [], "teams": [], "apps": [] })
    );
}

#[test]
fn test_translation_from_api_json() {
    let protection: BranchProtection = serde_json::from_value(json!({
        "url": "https://api.github.com/repos/octo/template/branches/main/protection",
        "enforce_admins": { "url": "https://example", "enabled": true },
        "required_pull_request_reviews": {
            "dismiss_stale_reviews": false,
            "require_code_owner_reviews": false,
            "required_approving_review_count": 1
        },
        "allow_force_pushes": { "enabled": false }
    }))
    .expect("protection json");

    let payload = to_apply_payload(&config(protection));

    assert!(payload.enforce_admins);
    assert_eq!(
        payload
            .required_pull_request_reviews
            .required_approving_review_count,
        1
    );
    assert!(payload.required_status_checks.is_none());
    assert!(payload.restrictions.teams.is_empty());
}
