//! Rate limiting port.

use crate::domain::{Decision, Limit, TenantId};

/// Admission decision engine - abstraction over counting backends.
///
/// Implementations must run the whole check for one tenant atomically:
/// concurrent calls for the same tenant never both take the last slot.
/// Calls are in-memory and never suspend.
pub trait RateLimiter: Send + Sync {
    /// Count the request against `tenant` if `limit` allows it.
    ///
    /// Rejected requests are not counted.
    fn check_and_consume(&self, tenant: &TenantId, limit: Limit) -> Result<Decision, RateLimitError>;
}

/// Rate limit errors.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Backend error: {0}")]
    Backend(String),
}
