//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use tollgate_core::DomainError;
use tollgate_core::domain::PolicyTable;
use tollgate_infra::{DatabaseConfig, JwtConfig, RateLimitConfig};

use crate::background::SchedulerConfig;

/// Prefix of per-tier limit overrides, e.g. `RATE_LIMIT_TIER_STARTER=90`.
const TIER_OVERRIDE_PREFIX: &str = "RATE_LIMIT_TIER_";

/// Configuration errors. Startup aborts on any of these.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {var}: {source}")]
    Invalid {
        var: String,
        #[source]
        source: DomainError,
    },
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    pub rate_limit: RateLimitConfig,
    pub policy: PolicyTable,
    /// `tenant=tier` pairs for the in-memory plan directory.
    pub tenant_seed: String,
    pub plan_cache_ttl: Duration,
    pub scheduler: SchedulerConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            database: DatabaseConfig::from_env(),
            jwt: JwtConfig::from_env(),
            rate_limit: RateLimitConfig::from_env(),
            policy: Self::parse_policy()?,
            tenant_seed: env::var("TENANT_TIERS").unwrap_or_default(),
            plan_cache_ttl: Duration::from_secs(
                env::var("PLAN_CACHE_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            scheduler: SchedulerConfig::from_env(),
        })
    }

    /// Build the tier policy from the defaults plus `RATE_LIMIT_TIER_<TIER>` overrides.
    /// Format: RATE_LIMIT_TIER_<TIER>=<LIMIT|unlimited>
    /// Example: RATE_LIMIT_TIER_STARTER=90
    fn parse_policy() -> Result<PolicyTable, ConfigError> {
        let overrides: Vec<(String, String)> = env::vars()
            .filter_map(|(key, value)| {
                key.strip_prefix(TIER_OVERRIDE_PREFIX)
                    .map(|tier| (tier.to_string(), value))
            })
            .collect();

        for (tier, limit) in &overrides {
            tracing::info!(tier = %tier, limit = %limit, "Tier limit override");
        }

        PolicyTable::from_overrides(overrides).map_err(|source| ConfigError::Invalid {
            var: format!("{TIER_OVERRIDE_PREFIX}*"),
            source,
        })
    }
}
