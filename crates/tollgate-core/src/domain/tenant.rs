use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Opaque, stable identifier of a tenant (one customer account).
///
/// Resolved upstream by authentication; this crate never inspects its shape
/// beyond rejecting blank values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::EmptyTenantId);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TenantId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TenantId> for String {
    fn from(id: TenantId) -> Self {
        id.0
    }
}

/// Subscription plan controlling a tenant's quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    Trial,
    Starter,
    Professional,
    Business,
    Enterprise,
}

impl Tier {
    pub const ALL: [Tier; 5] = [
        Tier::Trial,
        Tier::Starter,
        Tier::Professional,
        Tier::Business,
        Tier::Enterprise,
    ];

    /// The tier with the smallest quota. Anything that cannot be resolved
    /// to a known tier is treated as this one.
    pub const fn most_restrictive() -> Self {
        Tier::Trial
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Tier::Trial => "TRIAL",
            Tier::Starter => "STARTER",
            Tier::Professional => "PROFESSIONAL",
            Tier::Business => "BUSINESS",
            Tier::Enterprise => "ENTERPRISE",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim();
        Tier::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(normalized))
            .ok_or_else(|| DomainError::UnknownTier(s.to_string()))
    }
}
