//! Time source port.

use chrono::{DateTime, Utc};

/// Wall-clock abstraction so window expiry and sweeps can be driven by tests.
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}
