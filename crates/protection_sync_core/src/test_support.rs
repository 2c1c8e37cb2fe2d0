//! In-memory `ProtectionClient` used by the unit tests of this crate.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use github_client::{
    ApplyStatus, BranchProtection, Error, ProtectionClient, ProtectionRequest, RateLimit,
    Repository, Ruleset,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// A recorded branch protection update.
#[derive(Clone, Debug)]
pub struct ApplyCall {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub payload: ProtectionRequest,
    pub at: Instant,
}

/// Scripted reply for an update or create call.
#[derive(Clone, Copy, Debug)]
pub enum Reply {
    Status(ApplyStatus),
    Fail(u16),
}

fn failure(status: u16) -> Error {
    Error::from_status(status, "mock failure")
}

pub fn healthy_rate_limit() -> RateLimit {
    RateLimit {
        limit: 5000,
        remaining: 4999,
        reset_at: Utc::now() + ChronoDuration::hours(1),
    }
}

#[derive(Default)]
pub struct MockProtectionClient {
    repositories: HashMap<String, Repository>,
    protections: HashMap<String, Result<BranchProtection, u16>>,
    rulesets: HashMap<String, Result<Vec<Ruleset>, u16>>,
    owner_repositories: Option<Result<Vec<Repository>, u16>>,
    rate_limits: Mutex<VecDeque<Result<RateLimit, u16>>>,
    apply_replies: HashMap<String, Reply>,
    create_replies: HashMap<String, Reply>,
    apply_delay: Option<Duration>,
    apply_calls: Mutex<Vec<ApplyCall>>,
    created_rulesets: Mutex<Vec<(String, String)>>,
    rate_limit_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockProtectionClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repository(mut self, repo: Repository) -> Self {
        let key = repo.full_name().unwrap_or_default().to_string();
        self.repositories.insert(key, repo);
        self
    }

    pub fn with_protection(mut self, full_name: &str, protection: BranchProtection) -> Self {
        self.protections
            .insert(full_name.to_string(), Ok(protection));
        self
    }

    pub fn with_protection_failure(mut self, full_name: &str, status: u16) -> Self {
        self.protections.insert(full_name.to_string(), Err(status));
        self
    }

    pub fn with_rulesets(mut self, full_name: &str, rulesets: Vec<Ruleset>) -> Self {
        self.rulesets.insert(full_name.to_string(), Ok(rulesets));
        self
    }

    pub fn with_rulesets_failure(mut self, full_name: &str, status: u16) -> Self {
        self.rulesets.insert(full_name.to_string(), Err(status));
        self
    }

    pub fn with_owner_repositories(mut self, repositories: Vec<Repository>) -> Self {
        self.owner_repositories = Some(Ok(repositories));
        self
    }

    pub fn with_owner_repositories_failure(mut self, status: u16) -> Self {
        self.owner_repositories = Some(Err(status));
        self
    }

    /// Queues rate limit answers; once drained a healthy budget is reported.
    pub fn with_rate_limits(self, limits: Vec<Result<RateLimit, u16>>) -> Self {
        *self.rate_limits.lock().unwrap() = limits.into();
        self
    }

    pub fn with_apply_reply(mut self, repo: &str, reply: Reply) -> Self {
        self.apply_replies.insert(repo.to_string(), reply);
        self
    }

    pub fn with_create_reply(mut self, ruleset: &str, reply: Reply) -> Self {
        self.create_replies.insert(ruleset.to_string(), reply);
        self
    }

    pub fn with_apply_delay(mut self, delay: Duration) -> Self {
        self.apply_delay = Some(delay);
        self
    }

    pub fn apply_calls(&self) -> Vec<ApplyCall> {
        self.apply_calls.lock().unwrap().clone()
    }

    pub fn applied_repos(&self) -> Vec<String> {
        let mut repos: Vec<String> = self
            .apply_calls()
            .into_iter()
            .map(|c| c.repo)
            .collect();
        repos.sort();
        repos
    }

    pub fn created_rulesets(&self) -> Vec<(String, String)> {
        self.created_rulesets.lock().unwrap().clone()
    }

    pub fn rate_limit_calls(&self) -> usize {
        self.rate_limit_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn reply(reply: Option<&Reply>) -> Result<ApplyStatus, Error> {
        match reply {
            Some(Reply::Status(status)) => Ok(*status),
            Some(Reply::Fail(code)) => Err(failure(*code)),
            None => Ok(ApplyStatus::Updated),
        }
    }
}

#[async_trait]
impl ProtectionClient for MockProtectionClient {
    async fn get_repository(&self, owner: &str, repo: &str) -> Result<Repository, Error> {
        self.repositories
            .get(&format!("{}/{}", owner, repo))
            .cloned()
            .ok_or(Error::NotFound)
    }

    async fn get_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        _branch: &str,
    ) -> Result<BranchProtection, Error> {
        match self.protections.get(&format!("{}/{}", owner, repo)) {
            Some(Ok(protection)) => Ok(protection.clone()),
            Some(Err(code)) => Err(failure(*code)),
            None => Err(Error::NotFound),
        }
    }

    async fn list_ruleset_summaries(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<Ruleset>, Error> {
        match self.rulesets.get(&format!("{}/{}", owner, repo)) {
            Some(Ok(rulesets)) => Ok(rulesets.clone()),
            Some(Err(code)) => Err(failure(*code)),
            None => Ok(Vec::new()),
        }
    }

    async fn list_rulesets(&self, owner: &str, repo: &str) -> Result<Vec<Ruleset>, Error> {
        self.list_ruleset_summaries(owner, repo).await
    }

    async fn list_owner_repositories(&self, _owner: &str) -> Result<Vec<Repository>, Error> {
        match &self.owner_repositories {
            Some(Ok(repositories)) => Ok(repositories.clone()),
            Some(Err(code)) => Err(failure(*code)),
            None => Ok(Vec::new()),
        }
    }

    async fn get_rate_limit(&self) -> Result<RateLimit, Error> {
        self.rate_limit_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.rate_limits.lock().unwrap().pop_front();
        match next {
            Some(Ok(limit)) => Ok(limit),
            Some(Err(code)) => Err(failure(code)),
            None => Ok(healthy_rate_limit()),
        }
    }

    async fn update_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        protection: &ProtectionRequest,
    ) -> Result<ApplyStatus, Error> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        self.apply_calls.lock().unwrap().push(ApplyCall {
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch: branch.to_string(),
            payload: protection.clone(),
            at: Instant::now(),
        });

        if let Some(delay) = self.apply_delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Self::reply(self.apply_replies.get(repo))
    }

    async fn create_ruleset(
        &self,
        _owner: &str,
        repo: &str,
        ruleset: &Ruleset,
    ) -> Result<ApplyStatus, Error> {
        self.created_rulesets
            .lock()
            .unwrap()
            .push((repo.to_string(), ruleset.name.clone()));
        Self::reply(self.create_replies.get(&ruleset.name))
    }
}
