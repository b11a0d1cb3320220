//! Domain-level error types.

use thiserror::Error;

/// Domain errors - invalid input reaching the core.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("Tenant id must not be empty")]
    EmptyTenantId,

    #[error("Unknown tier: {0}")]
    UnknownTier(String),

    #[error("Invalid limit: {0}")]
    InvalidLimit(String),

    #[error("Invalid plan entry, expected tenant=tier: {0}")]
    InvalidPlanEntry(String),
}
