use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use super::{Decision, Limit};

/// Fixed counting window for one tenant.
///
/// `started_at` is the instant the current epoch began and `count` is the
/// number of requests counted since then. Only admitted requests are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    count: u64,
    started_at: DateTime<Utc>,
}

impl Window {
    pub fn open(now: DateTime<Utc>) -> Self {
        Self {
            count: 0,
            started_at: now,
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn resets_at(&self, interval: Duration) -> DateTime<Utc> {
        TimeDelta::from_std(interval)
            .ok()
            .and_then(|delta| self.started_at.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Time since the window opened. A clock that stepped backwards reads as zero.
    fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.started_at).to_std().unwrap_or(Duration::ZERO)
    }

    pub fn is_expired(&self, now: DateTime<Utc>, interval: Duration) -> bool {
        self.age(now) >= interval
    }

    /// True once the window is at least `stale_after` old.
    pub fn is_stale(&self, now: DateTime<Utc>, stale_after: Duration) -> bool {
        self.age(now) >= stale_after
    }

    /// Reset if expired, check the threshold, then count.
    ///
    /// Callers must hold exclusive access to the window for the whole call.
    pub fn consume(&mut self, now: DateTime<Utc>, interval: Duration, limit: Limit) -> Decision {
        if self.is_expired(now, interval) {
            *self = Window::open(now);
        }
        let reset_at = self.resets_at(interval);

        let max = match limit {
            Limit::Unlimited => {
                self.count = self.count.saturating_add(1);
                return Decision {
                    admitted: true,
                    limit,
                    count: self.count,
                    remaining: None,
                    reset_at,
                    retry_after: None,
                };
            }
            Limit::Requests(max) => u64::from(max.get()),
        };

        if self.count >= max {
            let wait = (reset_at - now).to_std().unwrap_or(Duration::ZERO);
            return Decision {
                admitted: false,
                limit,
                count: self.count,
                remaining: Some(0),
                reset_at,
                retry_after: Some(wait),
            };
        }

        self.count += 1;
        Decision {
            admitted: true,
            limit,
            count: self.count,
            remaining: Some(u32::try_from(max - self.count).unwrap_or(u32::MAX)),
            reset_at,
            retry_after: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_secs(60);

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn limit(max: u32) -> Limit {
        Limit::requests(max).unwrap()
    }

    #[test]
    fn test_admits_until_limit_then_rejects() {
        let mut window = Window::open(t(0));

        for expected_remaining in (0..3).rev() {
            let decision = window.consume(t(1), INTERVAL, limit(3));
            assert!(decision.admitted);
            assert_eq!(decision.remaining, Some(expected_remaining));
        }

        let decision = window.consume(t(10), INTERVAL, limit(3));
        assert!(!decision.admitted);
        assert_eq!(decision.remaining, Some(0));
        assert_eq!(decision.reset_at, t(60));
        assert_eq!(decision.retry_after, Some(Duration::from_secs(50)));
    }

    #[test]
    fn test_rejections_are_not_counted() {
        let mut window = Window::open(t(0));
        window.consume(t(0), INTERVAL, limit(1));

        for _ in 0..5 {
            let decision = window.consume(t(5), INTERVAL, limit(1));
            assert!(!decision.admitted);
            assert_eq!(decision.count, 1);
        }
        assert_eq!(window.count(), 1);
    }

    #[test]
    fn test_expired_window_resets_before_deciding() {
        let mut window = Window::open(t(0));
        for _ in 0..3 {
            window.consume(t(1), INTERVAL, limit(3));
        }
        assert!(!window.consume(t(59), INTERVAL, limit(3)).admitted);

        let decision = window.consume(t(60), INTERVAL, limit(3));
        assert!(decision.admitted);
        assert_eq!(decision.count, 1);
        assert_eq!(window.started_at(), t(60));
        assert_eq!(decision.reset_at, t(120));
    }

    #[test]
    fn test_unlimited_counts_but_never_rejects() {
        let mut window = Window::open(t(0));
        for _ in 0..1_000 {
            let decision = window.consume(t(1), INTERVAL, Limit::Unlimited);
            assert!(decision.admitted);
            assert_eq!(decision.remaining, None);
        }
        assert_eq!(window.count(), 1_000);
    }

    #[test]
    fn test_clock_stepping_backwards_keeps_window() {
        let mut window = Window::open(t(10));
        window.consume(t(10), INTERVAL, limit(5));

        let decision = window.consume(t(5), INTERVAL, limit(5));
        assert!(decision.admitted);
        assert_eq!(decision.count, 2);
        assert!(!window.is_stale(t(0), INTERVAL * 2));
    }

    #[test]
    fn test_staleness_threshold_is_inclusive() {
        let window = Window::open(t(0));
        assert!(!window.is_stale(t(119), INTERVAL * 2));
        assert!(window.is_stale(t(120), INTERVAL * 2));
    }
}
