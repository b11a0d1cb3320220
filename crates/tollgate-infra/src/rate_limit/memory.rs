//! In-memory fixed-window rate limiter keyed by tenant.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use tollgate_core::domain::{Decision, Limit, TenantId, Window};
use tollgate_core::ports::{Clock, RateLimitError, RateLimiter};

/// Minimum age, in intervals, before a window may be swept.
const MIN_STALE_INTERVALS: u32 = 2;

/// Fixed-window limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Counting interval.
    pub interval: Duration,
    /// Cadence of the stale-window sweep.
    pub sweep_interval: Duration,
    /// Windows this many intervals old are swept.
    pub stale_intervals: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            sweep_interval: Duration::from_secs(300),
            stale_intervals: MIN_STALE_INTERVALS,
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        let secs = |name: &str, default: u64| {
            std::env::var(name)
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(default))
        };

        Self {
            interval: secs("RATE_LIMIT_INTERVAL_SECS", 60),
            sweep_interval: secs("RATE_LIMIT_SWEEP_INTERVAL_SECS", 300),
            stale_intervals: std::env::var("RATE_LIMIT_STALE_INTERVALS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(MIN_STALE_INTERVALS),
        }
    }

    /// Age at which a window is considered stale. Never less than two intervals.
    pub fn stale_after(&self) -> Duration {
        self.interval
            .saturating_mul(self.stale_intervals.max(MIN_STALE_INTERVALS))
    }
}

/// Tenant-keyed store of counting windows; also the admission decision engine.
///
/// Each tenant's window lives in a `DashMap` shard. The whole
/// expire/check/increment sequence runs while holding that entry's guard, so
/// decisions for one tenant are serialized while distinct tenants proceed in
/// parallel.
///
/// Note: Limits are per-process, not shared across instances.
#[derive(Debug)]
pub struct WindowStore {
    windows: DashMap<TenantId, Window>,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl WindowStore {
    pub fn new(interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: DashMap::new(),
            clock,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of tenants currently holding a window.
    pub fn tracked_tenants(&self) -> usize {
        self.windows.len()
    }

    /// Remove every window at least `stale_after` old.
    ///
    /// Candidates are collected under per-shard read locks, then each one is
    /// removed under its own entry lock after re-checking staleness, so a
    /// window refreshed in between is kept.
    pub(crate) fn evict_stale(&self, stale_after: Duration) -> usize {
        let now = self.clock.now();
        let candidates: Vec<TenantId> = self
            .windows
            .iter()
            .filter(|entry| entry.value().is_stale(now, stale_after))
            .map(|entry| entry.key().clone())
            .collect();

        candidates
            .into_iter()
            .filter(|tenant| {
                self.windows
                    .remove_if(tenant, |_, window| window.is_stale(now, stale_after))
                    .is_some()
            })
            .count()
    }
}

impl RateLimiter for WindowStore {
    fn check_and_consume(&self, tenant: &TenantId, limit: Limit) -> Result<Decision, RateLimitError> {
        let decision = {
            let mut window = self
                .windows
                .entry(tenant.clone())
                .or_insert_with(|| Window::open(self.clock.now()));
            window.consume(self.clock.now(), self.interval, limit)
        };

        tracing::debug!(
            tenant_id = %tenant,
            admitted = decision.admitted,
            count = decision.count,
            limit = %decision.limit,
            "Rate limit decision"
        );

        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{DateTime, Utc};

    use crate::clock::ManualClock;

    const INTERVAL: Duration = Duration::from_secs(60);

    fn store() -> (WindowStore, ManualClock) {
        let clock = ManualClock::new(DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap());
        (WindowStore::new(INTERVAL, Arc::new(clock.clone())), clock)
    }

    fn tenant(id: &str) -> TenantId {
        TenantId::new(id).unwrap()
    }

    fn limit(max: u32) -> Limit {
        Limit::requests(max).unwrap()
    }

    #[test]
    fn test_starter_tenant_exhausts_quota() {
        let (store, clock) = store();
        let acme = tenant("acme");

        for expected in (0..60).rev() {
            let decision = store.check_and_consume(&acme, limit(60)).unwrap();
            assert!(decision.admitted);
            assert_eq!(decision.remaining, Some(expected));
        }

        clock.advance(Duration::from_secs(15));
        let decision = store.check_and_consume(&acme, limit(60)).unwrap();
        assert!(!decision.admitted);
        let retry = decision.retry_after_secs().unwrap();
        assert!(retry > 0 && retry <= 60);
        assert_eq!(retry, 45);
    }

    #[test]
    fn test_rejections_leave_remaining_unchanged() {
        let (store, _clock) = store();
        let acme = tenant("acme");
        store.check_and_consume(&acme, limit(2)).unwrap();
        store.check_and_consume(&acme, limit(2)).unwrap();

        for _ in 0..10 {
            let decision = store.check_and_consume(&acme, limit(2)).unwrap();
            assert!(!decision.admitted);
            assert_eq!(decision.remaining, Some(0));
            assert_eq!(decision.count, 2);
        }
    }

    #[test]
    fn test_tenants_are_counted_independently() {
        let (store, _clock) = store();
        store.check_and_consume(&tenant("acme"), limit(1)).unwrap();

        assert!(!store.check_and_consume(&tenant("acme"), limit(1)).unwrap().admitted);
        assert!(store.check_and_consume(&tenant("globex"), limit(1)).unwrap().admitted);
        assert_eq!(store.tracked_tenants(), 2);
    }

    #[test]
    fn test_window_reset_admits_next_request() {
        let (store, clock) = store();
        let acme = tenant("acme");
        for _ in 0..5 {
            store.check_and_consume(&acme, limit(5)).unwrap();
        }
        assert!(!store.check_and_consume(&acme, limit(5)).unwrap().admitted);

        clock.advance(INTERVAL);
        let decision = store.check_and_consume(&acme, limit(5)).unwrap();
        assert!(decision.admitted);
        assert_eq!(decision.count, 1);
        assert_eq!(decision.remaining, Some(4));
    }

    #[test]
    fn test_boundary_straddle_admits_at_most_twice_the_limit() {
        let (store, clock) = store();
        let acme = tenant("acme");
        store.check_and_consume(&acme, limit(10)).unwrap();

        // Late in the first window.
        clock.advance(Duration::from_secs(59));
        let mut admitted = 1;
        for _ in 0..20 {
            if store.check_and_consume(&acme, limit(10)).unwrap().admitted {
                admitted += 1;
            }
        }

        // One second later the window rolls over.
        clock.advance(Duration::from_secs(1));
        for _ in 0..20 {
            if store.check_and_consume(&acme, limit(10)).unwrap().admitted {
                admitted += 1;
            }
        }

        assert_eq!(admitted, 20);
    }

    #[test]
    fn test_enterprise_never_rejected() {
        let (store, clock) = store();
        let bigco = tenant("bigco");

        for i in 0..10_000u64 {
            if i % 1_000 == 0 {
                clock.advance(Duration::from_millis(100));
            }
            let decision = store.check_and_consume(&bigco, Limit::Unlimited).unwrap();
            assert!(decision.admitted);
            assert_eq!(decision.remaining, None);
            assert_eq!(decision.count, i + 1);
        }
    }

    #[test]
    fn test_concurrent_requests_never_double_admit() {
        let (store, _clock) = store();
        let acme = tenant("acme");
        let max = 50;
        let extra = 30;
        let threads = (max + extra) as usize;

        let barrier = Barrier::new(threads);
        let admitted = AtomicUsize::new(0);
        let rejected = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for _ in 0..threads {
                scope.spawn(|| {
                    barrier.wait();
                    let decision = store.check_and_consume(&acme, limit(max)).unwrap();
                    if decision.admitted {
                        admitted.fetch_add(1, Ordering::SeqCst);
                    } else {
                        rejected.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(admitted.load(Ordering::SeqCst), max as usize);
        assert_eq!(rejected.load(Ordering::SeqCst), extra as usize);
    }

    #[test]
    fn test_eviction_racing_requests_loses_no_increment() {
        let (store, clock) = store();
        let acme = tenant("acme");
        let max = 100;
        let workers = 8;
        let per_worker = 25;

        store.check_and_consume(&acme, limit(max)).unwrap();
        clock.advance(Duration::from_secs(130));

        let barrier = Barrier::new(workers + 1);
        let admitted = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                barrier.wait();
                for _ in 0..1_000 {
                    store.evict_stale(INTERVAL * 2);
                }
            });
            for _ in 0..workers {
                scope.spawn(|| {
                    barrier.wait();
                    for _ in 0..per_worker {
                        if store.check_and_consume(&acme, limit(max)).unwrap().admitted {
                            admitted.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                });
            }
        });

        let admitted = admitted.load(Ordering::SeqCst);
        assert_eq!(admitted, max as usize);

        let window = store.windows.get(&acme).unwrap();
        assert_eq!(window.count(), admitted as u64);
        assert_eq!(window.started_at(), clock.now());
    }

    #[test]
    fn test_evict_stale_only_removes_old_windows() {
        let (store, clock) = store();
        store.check_and_consume(&tenant("idle"), limit(5)).unwrap();
        clock.advance(Duration::from_secs(100));
        store.check_and_consume(&tenant("busy"), limit(5)).unwrap();

        clock.advance(Duration::from_secs(20));
        assert_eq!(store.evict_stale(INTERVAL * 2), 1);
        assert_eq!(store.tracked_tenants(), 1);
    }

    #[test]
    fn test_stale_after_has_two_interval_floor() {
        let config = RateLimitConfig {
            stale_intervals: 1,
            ..RateLimitConfig::default()
        };
        assert_eq!(config.stale_after(), Duration::from_secs(120));

        let config = RateLimitConfig {
            stale_intervals: 5,
            ..RateLimitConfig::default()
        };
        assert_eq!(config.stale_after(), Duration::from_secs(300));
    }
}
