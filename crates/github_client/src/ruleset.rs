//! Repository ruleset types.
//!
//! Rulesets are named rule objects layered on top of branch protection. This
//! crate does not interpret them: the name and ID are typed because they are
//! needed to look rulesets up, everything else is kept verbatim so that a ruleset
//! read from one repository can be recreated on another without loss, whatever
//! rule types GitHub adds in the future.
//!
//! See: https://docs.github.com/en/rest/repos/rules

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[cfg(test)]
#[path = "ruleset_tests.rs"]
mod tests;

/// Fields assigned by GitHub that must not be sent when creating a ruleset.
const SERVER_ASSIGNED_FIELDS: &[&str] = &[
    "node_id",
    "source",
    "source_type",
    "created_at",
    "updated_at",
    "_links",
    "current_user_can_bypass",
];

/// A repository ruleset.
///
/// # Examples
///
/// ```rust
/// use github_client::Ruleset;
///
/// let ruleset: Ruleset = serde_json::from_str(
///     r#"{ "id": 42, "name": "main-protection", "enforcement": "active", "rules": [] }"#,
/// ).unwrap();
///
/// assert_eq!(ruleset.name, "main-protection");
/// assert_eq!(ruleset.field("enforcement"), Some(&serde_json::json!("active")));
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Ruleset {
    /// Ruleset ID; `None` when the ruleset has not been created yet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    /// Ruleset name, unique within a repository
    pub name: String,

    /// Every other field exactly as GitHub returned it
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Ruleset {
    /// Returns a pass-through field by name.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Returns true when the ruleset carries its rules.
    ///
    /// GitHub's LIST rulesets endpoint does not include rules in the response.
    /// Use GET /repos/{owner}/{repo}/rulesets/{ruleset_id} to fetch full ruleset details.
    pub fn has_rules(&self) -> bool {
        self.fields.contains_key("rules")
    }

    /// Builds the body for creating this ruleset on another repository.
    ///
    /// The ID and all server-assigned metadata are removed. Rulesets that are
    /// inherited from the organization (`source_type` of `Organization`) should
    /// not be recreated; see [`Ruleset::is_repository_owned`].
    pub fn to_create_payload(&self) -> Value {
        let mut body = self.fields.clone();
        for key in SERVER_ASSIGNED_FIELDS {
            body.remove(*key);
        }
        body.insert("name".to_string(), Value::String(self.name.clone()));
        Value::Object(body)
    }

    /// Returns true unless GitHub reports the ruleset as inherited from an
    /// organization.
    pub fn is_repository_owned(&self) -> bool {
        match self.field("source_type").and_then(Value::as_str) {
            Some(source_type) => source_type.eq_ignore_ascii_case("repository"),
            None => true,
        }
    }
}
