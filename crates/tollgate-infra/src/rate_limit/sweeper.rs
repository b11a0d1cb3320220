//! Reclamation of stale counting windows.

use std::sync::Arc;
use std::time::Duration;

use super::{RateLimitConfig, WindowStore};

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub evicted: usize,
    pub retained: usize,
}

/// Periodically deletes windows that have been idle for at least
/// `stale_after`, bounding the store's memory.
///
/// A tenant whose window is swept gets a fresh one on its next request,
/// which is the same outcome as an expired window.
#[derive(Debug, Clone)]
pub struct WindowSweeper {
    store: Arc<WindowStore>,
    stale_after: Duration,
}

impl WindowSweeper {
    pub fn new(store: Arc<WindowStore>, config: &RateLimitConfig) -> Self {
        Self {
            store,
            stale_after: config.stale_after(),
        }
    }

    pub fn stale_after(&self) -> Duration {
        self.stale_after
    }

    pub fn run_once(&self) -> SweepReport {
        let evicted = self.store.evict_stale(self.stale_after);
        let report = SweepReport {
            evicted,
            retained: self.store.tracked_tenants(),
        };

        tracing::info!(
            evicted = report.evicted,
            retained = report.retained,
            stale_after_secs = self.stale_after.as_secs(),
            "Rate limit window sweep finished"
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use tollgate_core::domain::{Limit, TenantId};
    use tollgate_core::ports::RateLimiter;

    use crate::clock::ManualClock;

    fn setup() -> (Arc<WindowStore>, WindowSweeper, ManualClock) {
        let clock = ManualClock::new(DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap());
        let config = RateLimitConfig::default();
        let store = Arc::new(WindowStore::new(config.interval, Arc::new(clock.clone())));
        let sweeper = WindowSweeper::new(store.clone(), &config);
        (store, sweeper, clock)
    }

    fn hit(store: &WindowStore, id: &str) -> u64 {
        store
            .check_and_consume(&TenantId::new(id).unwrap(), Limit::requests(60).unwrap())
            .unwrap()
            .count
    }

    #[test]
    fn test_idle_tenant_swept_and_recreated() {
        let (store, sweeper, clock) = setup();
        for _ in 0..10 {
            hit(&store, "acme");
        }

        clock.advance(Duration::from_secs(130));
        let report = sweeper.run_once();
        assert_eq!(report, SweepReport { evicted: 1, retained: 0 });

        assert_eq!(hit(&store, "acme"), 1);
        assert_eq!(store.tracked_tenants(), 1);
    }

    #[test]
    fn test_sweep_is_idempotent() {
        let (store, sweeper, clock) = setup();
        hit(&store, "old-1");
        hit(&store, "old-2");
        clock.advance(Duration::from_secs(150));
        hit(&store, "fresh");

        let first = sweeper.run_once();
        let second = sweeper.run_once();

        assert_eq!(first, SweepReport { evicted: 2, retained: 1 });
        assert_eq!(second, SweepReport { evicted: 0, retained: 1 });
    }

    #[test]
    fn test_recently_expired_window_is_kept() {
        let (store, sweeper, clock) = setup();
        hit(&store, "acme");

        // Expired for counting purposes, but not yet two intervals old.
        clock.advance(Duration::from_secs(90));
        assert_eq!(sweeper.run_once().evicted, 0);
        assert_eq!(store.tracked_tenants(), 1);
    }
}
