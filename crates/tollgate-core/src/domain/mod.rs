//! Domain entities - tenants, tiers, policy and counting windows.

mod decision;
mod policy;
mod tenant;
mod window;

pub use decision::Decision;
pub use policy::{Limit, PolicyTable, UNLIMITED_MARKER};
pub use tenant::{TenantId, Tier};
pub use window::Window;
