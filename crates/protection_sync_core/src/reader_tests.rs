use super::*;
use crate::test_support::MockProtectionClient;
use github_client::{BranchProtection, EnabledSetting, Repository, Ruleset};
use serde_json::json;

fn protection() -> BranchProtection {
    BranchProtection {
        enforce_admins: Some(EnabledSetting { enabled: true }),
        ..Default::default()
    }
}

fn ruleset(name: &str) -> Ruleset {
    serde_json::from_value(json!({ "id": 7, "name": name, "rules": [] })).unwrap()
}

#[tokio::test]
async fn test_fetch_reads_protection_and_rulesets() {
    let client = MockProtectionClient::new()
        .with_repository(Repository::new("octo", "template", "trunk"))
        .with_protection("octo/template", protection())
        .with_rulesets("octo/template", vec![ruleset("main-guard")]);
    let reader = ProtectionReader::new(Arc::new(client));

    let (config, rulesets) = reader.fetch("octo", "template").await.expect("fetch");

    assert_eq!(config.source(), "octo/template");
    assert_eq!(config.branch(), "trunk");
    assert_eq!(config.protection(), &protection());
    assert_eq!(rulesets.len(), 1);
}

#[tokio::test]
async fn test_fetch_missing_repository_is_not_found() {
    let reader = ProtectionReader::new(Arc::new(MockProtectionClient::new()));

    let result = reader.fetch("octo", "missing").await;

    match result {
        Err(SyncError::ConfigFetch { owner, repo, source }) => {
            assert_eq!(owner, "octo");
            assert_eq!(repo, "missing");
            assert!(matches!(source, Error::NotFound));
        }
        other => panic!("expected ConfigFetch, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_without_default_branch_is_not_found() {
    let client = MockProtectionClient::new().with_repository(Repository::from_parts(
        Some("octo"),
        Some("template"),
        None,
    ));
    let reader = ProtectionReader::new(Arc::new(client));

    let result = reader.fetch("octo", "template").await;

    assert!(matches!(
        result,
        Err(SyncError::ConfigFetch {
            source: Error::NotFound,
            ..
        })
    ));
}

#[tokio::test]
async fn test_fetch_fails_when_protection_is_rejected() {
    let client = MockProtectionClient::new()
        .with_repository(Repository::new("octo", "template", "main"))
        .with_protection_failure("octo/template", 401);
    let reader = ProtectionReader::new(Arc::new(client));

    let result = reader.fetch("octo", "template").await;

    assert!(matches!(
        result,
        Err(SyncError::ConfigFetch {
            source: Error::AuthError(_),
            ..
        })
    ));
}

#[tokio::test]
async fn test_fetch_fails_as_a_unit_when_rulesets_fail() {
    let client = MockProtectionClient::new()
        .with_repository(Repository::new("octo", "template", "main"))
        .with_protection("octo/template", protection())
        .with_rulesets_failure("octo/template", 500);
    let reader = ProtectionReader::new(Arc::new(client));

    let result = reader.fetch("octo", "template").await;

    assert!(matches!(
        result,
        Err(SyncError::ConfigFetch {
            source: Error::UpstreamError { status: 500, .. },
            ..
        })
    ));
}
