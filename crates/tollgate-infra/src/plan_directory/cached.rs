//! TTL cache in front of another plan directory.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::RwLock;

use tollgate_core::domain::{TenantId, Tier};
use tollgate_core::ports::{Clock, PlanDirectory, PlanDirectoryError};

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    /// `None` caches a "tenant not found" answer.
    tier: Option<Tier>,
    expires_at: DateTime<Utc>,
}

/// Caches lookups from an inner directory for `ttl`.
///
/// Found and not-found answers are both cached; errors are not, so a
/// recovering backend is retried on the next request.
pub struct CachedPlanDirectory<P> {
    inner: P,
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<TenantId, CacheEntry>>,
}

impl<P: PlanDirectory> CachedPlanDirectory<P> {
    pub fn new(inner: P, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner,
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    async fn cached(&self, tenant: &TenantId, now: DateTime<Utc>) -> Option<Option<Tier>> {
        let entries = self.entries.read().await;
        let entry = entries.get(tenant)?;
        (now < entry.expires_at).then_some(entry.tier)
    }
}

#[async_trait]
impl<P: PlanDirectory> PlanDirectory for CachedPlanDirectory<P> {
    async fn tier_for(&self, tenant: &TenantId) -> Result<Option<Tier>, PlanDirectoryError> {
        let now = self.clock.now();
        if let Some(tier) = self.cached(tenant, now).await {
            return Ok(tier);
        }

        let tier = self.inner.tier_for(tenant).await?;
        let expires_at = now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);

        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| now < entry.expires_at);
        entries.insert(tenant.clone(), CacheEntry { tier, expires_at });

        Ok(tier)
    }
}
