//! PostgreSQL plan directory.

use async_trait::async_trait;
use sea_orm::{DbConn, EntityTrait};

use tollgate_core::domain::{TenantId, Tier};
use tollgate_core::ports::{PlanDirectory, PlanDirectoryError};

use crate::database::entity::tenant::Entity as TenantEntity;

/// Reads tenant tiers from the `tenants` table.
pub struct PostgresPlanDirectory {
    db: DbConn,
}

impl PostgresPlanDirectory {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PlanDirectory for PostgresPlanDirectory {
    async fn tier_for(&self, tenant: &TenantId) -> Result<Option<Tier>, PlanDirectoryError> {
        tracing::debug!(tenant_id = %tenant, "Looking up tenant plan");

        let row = TenantEntity::find_by_id(tenant.as_str().to_owned())
            .one(&self.db)
            .await
            .map_err(|e| PlanDirectoryError::Query(e.to_string()))?;

        Ok(row.map(|row| {
            row.tier.parse().unwrap_or_else(|_| {
                tracing::warn!(
                    tenant_id = %tenant,
                    stored_tier = %row.tier,
                    "Unrecognised tier stored for tenant, applying most restrictive tier"
                );
                Tier::most_restrictive()
            })
        }))
    }
}
