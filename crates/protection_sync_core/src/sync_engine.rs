//! Applies a protection configuration to many repositories in parallel.
//!
//! One task is spawned per target. Tasks wait for a slot in a semaphore sized
//! by [`concurrency_limit`], pass through the [`RateGovernor`] before every
//! mutating request and send their [`ApplyOutcome`] back over a channel to a
//! single aggregator, which logs each result and builds the [`SyncReport`].

use github_client::{ApplyStatus, ProtectionClient, Ruleset};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn, Instrument};

use crate::translator::to_apply_payload;
use crate::{
    ApplyOutcome, ProtectionConfig, RateGovernor, RulesetCollection, SyncError, SyncReport,
    SyncSettings, TargetReport, TargetRepository, ValidTarget,
};

#[cfg(test)]
#[path = "sync_engine_tests.rs"]
mod tests;

/// Number of targets per unit of parallelism.
const TARGETS_PER_SLOT: usize = 10;

/// Reason recorded for a target whose task ended without reporting.
const TASK_ABORTED: &str = "apply task aborted";

/// Degree of parallelism for a run over `targets` repositories.
///
/// Small runs stay sequential to keep bursts against the rate limit low.
pub fn concurrency_limit(targets: usize) -> usize {
    (targets / TARGETS_PER_SLOT).max(1)
}

/// Orchestrates the apply phase of a sync run.
pub struct SyncEngine {
    client: Arc<dyn ProtectionClient>,
    settings: SyncSettings,
    rulesets: RulesetCollection,
}

impl SyncEngine {
    pub fn new(client: Arc<dyn ProtectionClient>, settings: SyncSettings) -> Self {
        Self {
            client,
            settings,
            rulesets: RulesetCollection::default(),
        }
    }

    /// Rulesets to create on each target when ruleset sync is enabled.
    pub fn with_rulesets(mut self, rulesets: RulesetCollection) -> Self {
        self.rulesets = rulesets;
        self
    }

    /// Applies `config` to every target and reports one outcome per target,
    /// in input order.
    ///
    /// Failures of individual targets are recorded in the report. When
    /// `cancel` fires, targets that have not finished are reported as
    /// [`ApplyOutcome::Cancelled`].
    ///
    /// # Errors
    ///
    /// Returns `SyncError::RateBudget` if the rate limit cannot be read. The
    /// remaining tasks are cancelled before returning.
    #[instrument(skip_all, fields(owner = %owner, source = %config.source()))]
    pub async fn run(
        &self,
        owner: &str,
        config: &ProtectionConfig,
        targets: Vec<TargetRepository>,
        cancel: &CancellationToken,
    ) -> Result<SyncReport, SyncError> {
        let limit = concurrency_limit(targets.len());
        info!(
            owner = owner,
            targets = targets.len(),
            concurrency = limit,
            "Starting protection sync run"
        );

        let semaphore = Arc::new(Semaphore::new(limit));
        let context = Arc::new(ApplyContext {
            client: self.client.clone(),
            governor: RateGovernor::new(self.client.clone(), self.settings.safety_margin),
            config: config.clone(),
            rulesets: self.rulesets.clone(),
            sync_rulesets: self.settings.sync_rulesets,
            cancel: cancel.child_token(),
        });

        let (tx, mut rx) = mpsc::unbounded_channel::<(usize, ApplyOutcome)>();
        let mut handles = Vec::with_capacity(targets.len());

        for (index, target) in targets.iter().cloned().enumerate() {
            let context = context.clone();
            let semaphore = semaphore.clone();
            let tx = tx.clone();

            handles.push(tokio::spawn(async move {
                match context.run_target(&semaphore, &target).await {
                    Ok(outcome) => {
                        // The receiver outlives every task.
                        let _ = tx.send((index, outcome));
                        Ok(())
                    }
                    Err(e) => {
                        context.cancel.cancel();
                        Err(e)
                    }
                }
            }
            .in_current_span()));
        }
        drop(tx);

        let mut slots: Vec<Option<ApplyOutcome>> = vec![None; targets.len()];
        while let Some((index, outcome)) = rx.recv().await {
            log_outcome(&targets[index], &outcome);
            slots[index] = Some(outcome);
        }

        let mut fatal = None;
        for handle in handles {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    fatal.get_or_insert(e);
                }
                Err(e) => {
                    error!(error = %e, "Apply task ended abnormally");
                }
            }
        }

        if let Some(e) = fatal {
            error!(error = %e, "Protection sync run aborted");
            return Err(e);
        }

        let report = SyncReport {
            targets: targets
                .into_iter()
                .zip(slots)
                .map(|(target, outcome)| TargetReport {
                    target,
                    outcome: outcome.unwrap_or_else(|| ApplyOutcome::Failed {
                        reason: TASK_ABORTED.to_string(),
                    }),
                })
                .collect(),
            concurrency_limit: limit,
            was_cancelled: cancel.is_cancelled(),
        };

        info!(
            applied = report.applied(),
            skipped = report.skipped(),
            failed = report.failed(),
            cancelled = report.cancelled(),
            "Protection sync run finished"
        );
        Ok(report)
    }
}

fn log_outcome(target: &TargetRepository, outcome: &ApplyOutcome) {
    let repository = target.label();
    match outcome {
        ApplyOutcome::Applied => {
            info!(repository = repository.as_str(), "Branch protection applied")
        }
        ApplyOutcome::SkippedInvalid { reason } => warn!(
            repository = repository.as_str(),
            reason = reason.as_str(),
            "Skipped invalid repository"
        ),
        ApplyOutcome::Failed { reason } => error!(
            repository = repository.as_str(),
            reason = reason.as_str(),
            "Failed to apply branch protection"
        ),
        ApplyOutcome::Cancelled => {
            info!(repository = repository.as_str(), "Branch protection sync cancelled")
        }
    }
}

/// State shared by the apply tasks of one run.
struct ApplyContext {
    client: Arc<dyn ProtectionClient>,
    governor: RateGovernor,
    config: ProtectionConfig,
    rulesets: RulesetCollection,
    sync_rulesets: bool,
    cancel: CancellationToken,
}

impl ApplyContext {
    async fn run_target(
        &self,
        semaphore: &Arc<Semaphore>,
        target: &TargetRepository,
    ) -> Result<ApplyOutcome, SyncError> {
        let _permit = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Ok(ApplyOutcome::Cancelled),
            permit = semaphore.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => return Ok(ApplyOutcome::Cancelled),
            },
        };

        self.apply(target).await
    }

    async fn apply(&self, target: &TargetRepository) -> Result<ApplyOutcome, SyncError> {
        info!(
            repository = target.label().as_str(),
            "Starting branch protection sync"
        );

        let valid = match target.validate() {
            Ok(valid) => valid,
            Err(e) => {
                return Ok(ApplyOutcome::SkippedInvalid {
                    reason: e.to_string(),
                })
            }
        };
        debug!(repository = %valid, branch = valid.branch, "Target validated");

        if !self.admit().await? {
            return Ok(ApplyOutcome::Cancelled);
        }

        let payload = to_apply_payload(&self.config);
        let update = self.client.update_branch_protection(
            valid.owner,
            valid.name,
            valid.branch,
            &payload,
        );
        let Some(result) = self.until_cancelled(update).await else {
            return Ok(ApplyOutcome::Cancelled);
        };

        match result {
            Ok(ApplyStatus::Updated) => {}
            Ok(ApplyStatus::AlreadyExists) => {
                debug!(repository = %valid, "Protection pattern already present")
            }
            Err(e) => {
                return Ok(ApplyOutcome::Failed {
                    reason: e.to_string(),
                })
            }
        }

        if self.sync_rulesets && !self.rulesets.is_empty() {
            if let Some(outcome) = self.apply_rulesets(valid).await? {
                return Ok(outcome);
            }
        }

        Ok(ApplyOutcome::Applied)
    }

    /// Creates the source's repository rulesets that the target lacks.
    ///
    /// Returns an outcome only when the target cannot be counted as applied.
    async fn apply_rulesets(
        &self,
        target: ValidTarget<'_>,
    ) -> Result<Option<ApplyOutcome>, SyncError> {
        let listing = self
            .client
            .list_ruleset_summaries(target.owner, target.name);
        let existing: HashSet<String> = match self.until_cancelled(listing).await {
            None => return Ok(Some(ApplyOutcome::Cancelled)),
            Some(Ok(rulesets)) => rulesets.into_iter().map(|r| r.name).collect(),
            Some(Err(e)) => {
                return Ok(Some(ApplyOutcome::Failed {
                    reason: format!("listing rulesets: {}", e),
                }))
            }
        };

        for ruleset in self.rulesets.repository_owned() {
            if existing.contains(&ruleset.name) {
                debug!(
                    repository = %target,
                    ruleset = ruleset.name.as_str(),
                    "Ruleset already exists"
                );
                continue;
            }

            if let Some(outcome) = self.create_ruleset(target, ruleset).await? {
                return Ok(Some(outcome));
            }
        }

        Ok(None)
    }

    async fn create_ruleset(
        &self,
        target: ValidTarget<'_>,
        ruleset: &Ruleset,
    ) -> Result<Option<ApplyOutcome>, SyncError> {
        if !self.admit().await? {
            return Ok(Some(ApplyOutcome::Cancelled));
        }

        let create = self
            .client
            .create_ruleset(target.owner, target.name, ruleset);
        match self.until_cancelled(create).await {
            None => Ok(Some(ApplyOutcome::Cancelled)),
            Some(Ok(_)) => {
                info!(
                    repository = %target,
                    ruleset = ruleset.name.as_str(),
                    "Ruleset created"
                );
                Ok(None)
            }
            Some(Err(e)) => Ok(Some(ApplyOutcome::Failed {
                reason: format!("ruleset '{}': {}", ruleset.name, e),
            })),
        }
    }

    /// Waits for rate limit admission. Returns false if the run was cancelled.
    async fn admit(&self) -> Result<bool, SyncError> {
        match self.until_cancelled(self.governor.admit()).await {
            Some(result) => result.map(|()| true),
            None => Ok(false),
        }
    }

    async fn until_cancelled<F: Future>(&self, future: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            output = future => Some(output),
        }
    }
}
