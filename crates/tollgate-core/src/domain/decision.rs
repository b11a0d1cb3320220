use std::time::Duration;

use chrono::{DateTime, Utc};

use super::Limit;

/// Outcome of one admission check, plus the metadata a caller surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub admitted: bool,
    pub limit: Limit,
    /// Requests counted in the current window, including this one if admitted.
    pub count: u64,
    /// `None` when the limit is unlimited.
    pub remaining: Option<u32>,
    /// Instant the current window ends.
    pub reset_at: DateTime<Utc>,
    /// Set on rejection only.
    pub retry_after: Option<Duration>,
}

impl Decision {
    /// Epoch seconds at which the current window ends.
    pub fn reset_epoch_secs(&self) -> i64 {
        self.reset_at.timestamp()
    }

    /// Seconds until the window resets, rounded up. `None` when admitted.
    pub fn retry_after_secs(&self) -> Option<u64> {
        self.retry_after
            .map(|wait| wait.as_secs() + u64::from(wait.subsec_nanos() > 0))
    }
}
