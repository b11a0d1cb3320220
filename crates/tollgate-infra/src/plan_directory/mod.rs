//! Plan directory implementations - in-memory seed, TTL cache and PostgreSQL.

mod cached;
mod memory;

pub use cached::CachedPlanDirectory;
pub use memory::InMemoryPlanDirectory;

#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "postgres")]
pub use postgres::PostgresPlanDirectory;
