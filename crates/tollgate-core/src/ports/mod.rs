//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod clock;
mod plan_directory;
mod rate_limit;

pub use auth::{AuthError, TokenClaims, TokenService};
pub use clock::Clock;
pub use plan_directory::{PlanDirectory, PlanDirectoryError};
pub use rate_limit::{RateLimitError, RateLimiter};
