//! Background processing - the stale-window sweep.

#[cfg(feature = "scheduler")]
mod scheduler;

#[cfg(feature = "scheduler")]
pub use scheduler::{Scheduler, start_sweeper};

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Enable scheduler.
    pub enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl SchedulerConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: std::env::var("SCHEDULER_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
        }
    }
}
