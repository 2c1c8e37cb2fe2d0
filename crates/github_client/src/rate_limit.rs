//! Rate limit accounting types.
//!
//! GitHub reports the request budget of the current window through
//! `GET /rate_limit`. Calling that endpoint does not count against the budget.

use chrono::{DateTime, Utc};
use serde::Deserialize;

#[cfg(test)]
#[path = "rate_limit_tests.rs"]
mod tests;

/// The request budget of the core REST API window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimit {
    /// Maximum requests allowed in the window
    pub limit: u64,
    /// Requests left in the window
    pub remaining: u64,
    /// When the window resets
    pub reset_at: DateTime<Utc>,
}

impl RateLimit {
    /// Returns true when no request can be made before the reset.
    pub fn is_exhausted(&self) -> bool {
        self.remaining < 1
    }
}

/// Wire shape of `GET /rate_limit`; only the core resource is read.
#[derive(Debug, Deserialize)]
pub(crate) struct RateLimitResponse {
    pub resources: RateLimitResources,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RateLimitResources {
    pub core: RateWindow,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RateWindow {
    pub limit: u64,
    pub remaining: u64,
    /// Reset time in seconds since the Unix epoch
    pub reset: i64,
}

impl TryFrom<RateLimitResponse> for RateLimit {
    type Error = crate::Error;

    fn try_from(value: RateLimitResponse) -> Result<Self, Self::Error> {
        let core = value.resources.core;
        let reset_at =
            DateTime::from_timestamp(core.reset, 0).ok_or(crate::Error::InvalidResponse)?;
        Ok(Self {
            limit: core.limit,
            remaining: core.remaining,
            reset_at,
        })
    }
}
