//! Repository domain types.
//!
//! This module contains the repository record returned by the repository and
//! repository-listing endpoints.

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "repository_tests.rs"]
mod tests;

/// Represents a GitHub repository.
///
/// Only the fields needed to address a repository's default branch are kept.
/// They are all optional so that one incomplete entry in an organization
/// listing does not make the whole listing unreadable; callers decide what
/// to do with incomplete records.
///
/// # Examples
///
/// ```rust
/// use github_client::Repository;
///
/// let repo = Repository::new("octo", "hello-world", "main");
///
/// assert_eq!(repo.owner_login(), Some("octo"));
/// assert_eq!(repo.name(), Some("hello-world"));
/// assert_eq!(repo.default_branch(), Some("main"));
/// ```
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Repository {
    /// The name of the repository
    name: Option<String>,
    /// The full name of the repository (owner/name)
    full_name: Option<String>,
    /// The account owning the repository
    owner: Option<Owner>,
    /// The branch that protection is applied to
    default_branch: Option<String>,
}

/// The owner of a repository.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Owner {
    /// The login name of the owning user or organization
    pub login: String,
}

impl Repository {
    /// Creates a new Repository instance with all identifying fields set.
    pub fn new(owner: &str, name: &str, default_branch: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            full_name: Some(format!("{}/{}", owner, name)),
            owner: Some(Owner {
                login: owner.to_string(),
            }),
            default_branch: Some(default_branch.to_string()),
        }
    }

    /// Creates a repository record from possibly missing parts.
    pub fn from_parts(
        owner: Option<&str>,
        name: Option<&str>,
        default_branch: Option<&str>,
    ) -> Self {
        Self {
            name: name.map(str::to_string),
            full_name: match (owner, name) {
                (Some(o), Some(n)) => Some(format!("{}/{}", o, n)),
                _ => None,
            },
            owner: owner.map(|login| Owner {
                login: login.to_string(),
            }),
            default_branch: default_branch.map(str::to_string),
        }
    }

    /// Returns the name of the repository, without the owner.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the full `owner/name` of the repository.
    pub fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }

    /// Returns the login of the owning account.
    pub fn owner_login(&self) -> Option<&str> {
        self.owner.as_ref().map(|o| o.login.as_str())
    }

    /// Returns the default branch of the repository.
    pub fn default_branch(&self) -> Option<&str> {
        self.default_branch.as_deref()
    }
}
