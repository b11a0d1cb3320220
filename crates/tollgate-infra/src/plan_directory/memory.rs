//! In-memory plan directory - used when no database is configured.

use std::collections::HashMap;

use async_trait::async_trait;

use tollgate_core::DomainError;
use tollgate_core::domain::{TenantId, Tier};
use tollgate_core::ports::{PlanDirectory, PlanDirectoryError};

/// Tenant subscriptions seeded at startup and read-only afterwards.
///
/// Note: Plan changes require a restart with a new seed.
#[derive(Debug)]
pub struct InMemoryPlanDirectory {
    plans: HashMap<TenantId, Tier>,
}

impl InMemoryPlanDirectory {
    /// Parse a `tenant=tier,tenant=tier` seed string.
    pub fn from_seed(seed: &str) -> Result<Self, DomainError> {
        let mut plans = HashMap::new();
        for pair in seed.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (tenant, tier) = pair
                .split_once('=')
                .ok_or_else(|| DomainError::InvalidPlanEntry(pair.to_string()))?;
            plans.insert(TenantId::new(tenant.trim())?, tier.parse()?);
        }
        Ok(Self { plans })
    }
}

#[async_trait]
impl PlanDirectory for InMemoryPlanDirectory {
    async fn tier_for(&self, tenant: &TenantId) -> Result<Option<Tier>, PlanDirectoryError> {
        Ok(self.plans.get(tenant).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant(id: &str) -> TenantId {
        TenantId::new(id).unwrap()
    }

    #[tokio::test]
    async fn test_seed_parsing() {
        let directory = InMemoryPlanDirectory::from_seed(" acme=starter, bigco=ENTERPRISE ,").unwrap();

        assert_eq!(directory.tier_for(&tenant("acme")).await.unwrap(), Some(Tier::Starter));
        assert_eq!(directory.tier_for(&tenant("bigco")).await.unwrap(), Some(Tier::Enterprise));
        assert_eq!(directory.tier_for(&tenant("nobody")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_seed_rejects_bad_pairs() {
        assert!(InMemoryPlanDirectory::from_seed("acme").is_err());
        assert!(InMemoryPlanDirectory::from_seed("acme=gold").is_err());
        assert!(InMemoryPlanDirectory::from_seed("=trial").is_err());
    }

    #[tokio::test]
    async fn test_empty_seed_knows_nobody() {
        let directory = InMemoryPlanDirectory::from_seed("").unwrap();
        assert_eq!(directory.tier_for(&tenant("acme")).await.unwrap(), None);
    }
}
