//! Plan directory port - resolves a tenant's subscription tier.

use async_trait::async_trait;

use crate::domain::{TenantId, Tier};

/// Source of truth for tenant subscriptions (database, cache, static seed).
#[async_trait]
pub trait PlanDirectory: Send + Sync {
    /// Returns `Ok(None)` when the tenant does not exist.
    async fn tier_for(&self, tenant: &TenantId) -> Result<Option<Tier>, PlanDirectoryError>;
}

/// Plan directory errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PlanDirectoryError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),
}
