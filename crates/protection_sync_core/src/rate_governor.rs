//! Admission control against GitHub's shared request budget.

use chrono::Utc;
use github_client::ProtectionClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::SyncError;

#[cfg(test)]
#[path = "rate_governor_tests.rs"]
mod tests;

/// Serializes access to the rate limit budget across apply tasks.
///
/// Every call to [`RateGovernor::admit`] reads the authoritative budget from
/// GitHub while holding the governor's lock, so two tasks can never both act
/// on the same unit of remaining budget.
pub struct RateGovernor {
    client: Arc<dyn ProtectionClient>,
    safety_margin: Duration,
    admission: Mutex<()>,
}

impl RateGovernor {
    pub fn new(client: Arc<dyn ProtectionClient>, safety_margin: Duration) -> Self {
        Self {
            client,
            safety_margin,
            admission: Mutex::new(()),
        }
    }

    /// Waits until a request may be issued.
    ///
    /// When the budget is exhausted the caller is suspended until the window
    /// resets plus the safety margin. Callers queue on the lock meanwhile.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::RateBudget` if the budget cannot be read.
    pub async fn admit(&self) -> Result<(), SyncError> {
        let _admission = self.admission.lock().await;

        let limit = self
            .client
            .get_rate_limit()
            .await
            .map_err(|source| SyncError::RateBudget { source })?;

        debug!(
            remaining = limit.remaining,
            limit = limit.limit,
            reset_at = %limit.reset_at,
            "Checked rate limit"
        );

        if limit.is_exhausted() {
            let until_reset = (limit.reset_at - Utc::now())
                .to_std()
                .unwrap_or(Duration::ZERO);
            let wait = until_reset + self.safety_margin;
            warn!(
                reset_at = %limit.reset_at,
                wait_secs = wait.as_secs_f64(),
                "Rate limit exhausted, waiting for the window to reset"
            );
            tokio::time::sleep(wait).await;
            info!("Rate limit window reset, resuming");
        }

        Ok(())
    }
}
