//! # Tollgate Infrastructure
//!
//! Concrete implementations of the ports defined in `tollgate-core`.
//! This crate contains the tenant window store, the stale-window sweeper,
//! plan directory backends and token validation.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory plan directory only
//! - `postgres` - PostgreSQL plan directory via SeaORM
//! - `auth` - JWT tenant tokens
//! - `rate-limit` - Fixed-window rate limiting via dashmap

pub mod clock;
pub mod database;
pub mod plan_directory;

#[cfg(feature = "auth")]
pub mod auth;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

// Re-exports
pub use clock::{ManualClock, SystemClock};
pub use database::DatabaseConfig;
pub use plan_directory::{CachedPlanDirectory, InMemoryPlanDirectory};

#[cfg(feature = "auth")]
pub use auth::{JwtConfig, JwtTokenService};

#[cfg(feature = "rate-limit")]
pub use rate_limit::{RateLimitConfig, SweepReport, WindowStore, WindowSweeper};

#[cfg(feature = "postgres")]
pub use plan_directory::PostgresPlanDirectory;
