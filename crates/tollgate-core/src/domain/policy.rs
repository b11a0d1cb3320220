use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use super::Tier;
use crate::error::DomainError;

/// Marker rendered wherever an unlimited quota is reported.
pub const UNLIMITED_MARKER: &str = "unlimited";

/// Requests allowed per counting interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Requests(NonZeroU32),
    /// Never rejects; requests are still counted.
    Unlimited,
}

impl Limit {
    /// Returns `None` for zero, which is not a valid ceiling.
    pub fn requests(max: u32) -> Option<Self> {
        NonZeroU32::new(max).map(Limit::Requests)
    }

    pub fn is_unlimited(&self) -> bool {
        matches!(self, Limit::Unlimited)
    }

    pub fn max_requests(&self) -> Option<u32> {
        match self {
            Limit::Requests(max) => Some(max.get()),
            Limit::Unlimited => None,
        }
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Requests(max) => write!(f, "{max}"),
            Limit::Unlimited => f.write_str(UNLIMITED_MARKER),
        }
    }
}

impl FromStr for Limit {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(UNLIMITED_MARKER) {
            return Ok(Limit::Unlimited);
        }
        s.parse::<u32>()
            .ok()
            .and_then(Limit::requests)
            .ok_or_else(|| DomainError::InvalidLimit(s.to_string()))
    }
}

/// Process-wide tier to limit mapping. Immutable once built.
#[derive(Debug, Clone)]
pub struct PolicyTable {
    limits: HashMap<Tier, Limit>,
    fallback: Limit,
}

impl PolicyTable {
    pub fn new(limits: impl IntoIterator<Item = (Tier, Limit)>) -> Self {
        let limits: HashMap<Tier, Limit> = limits.into_iter().collect();
        let restrictive = Tier::most_restrictive();
        let fallback = limits
            .get(&restrictive)
            .copied()
            .unwrap_or_else(|| default_limit(restrictive));
        Self { limits, fallback }
    }

    /// Start from the default table and apply `(tier, limit)` overrides given
    /// as raw strings, e.g. `("starter", "90")` or `("trial", "unlimited")`.
    pub fn from_overrides<K, V>(overrides: impl IntoIterator<Item = (K, V)>) -> Result<Self, DomainError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut limits = Self::default().limits;
        for (tier, limit) in overrides {
            let tier: Tier = tier.as_ref().parse()?;
            let limit: Limit = limit.as_ref().parse()?;
            limits.insert(tier, limit);
        }
        Ok(Self::new(limits))
    }

    /// Never fails: a tier without an entry gets the limit of the most
    /// restrictive tier rather than unlimited access.
    pub fn limit_for(&self, tier: Tier) -> Limit {
        self.limits.get(&tier).copied().unwrap_or(self.fallback)
    }
}

/// Built-in requests-per-interval ceiling of each tier.
fn default_limit(tier: Tier) -> Limit {
    let max = match tier {
        Tier::Trial => 30,
        Tier::Starter => 60,
        Tier::Professional => 120,
        Tier::Business => 300,
        Tier::Enterprise => return Limit::Unlimited,
    };
    Limit::Requests(NonZeroU32::new(max).unwrap_or(NonZeroU32::MIN))
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::new(Tier::ALL.iter().map(|&tier| (tier, default_limit(tier))))
    }
}
