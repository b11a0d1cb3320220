//! Rate limiting implementations - fixed-window counting and stale-window sweeping.

mod memory;
mod sweeper;

pub use memory::{RateLimitConfig, WindowStore};
pub use sweeper::{SweepReport, WindowSweeper};
