//! Application state - shared across all handlers.

use std::sync::Arc;

use tollgate_core::domain::PolicyTable;
use tollgate_core::ports::{Clock, PlanDirectory, TokenService};
use tollgate_infra::{InMemoryPlanDirectory, JwtTokenService, RateLimitConfig, SystemClock, WindowStore};

#[cfg(feature = "postgres")]
use tollgate_infra::{CachedPlanDirectory, PostgresPlanDirectory};

use crate::config::{AppConfig, ConfigError};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub plans: Arc<dyn PlanDirectory>,
    pub policy: Arc<PolicyTable>,
    pub limiter: Arc<WindowStore>,
    pub tokens: Arc<dyn TokenService>,
    pub rate_limit: RateLimitConfig,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Result<Self, ConfigError> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let plans = Self::plan_directory(config, clock.clone()).await?;
        let limiter = Arc::new(WindowStore::new(config.rate_limit.interval, clock));

        tracing::info!(
            interval_secs = config.rate_limit.interval.as_secs(),
            stale_after_secs = config.rate_limit.stale_after().as_secs(),
            "Application state initialized"
        );

        Ok(Self {
            plans,
            policy: Arc::new(config.policy.clone()),
            limiter,
            tokens: Arc::new(JwtTokenService::new(config.jwt.clone())),
            rate_limit: config.rate_limit.clone(),
        })
    }

    fn seeded_directory(config: &AppConfig) -> Result<InMemoryPlanDirectory, ConfigError> {
        InMemoryPlanDirectory::from_seed(&config.tenant_seed).map_err(|source| {
            ConfigError::Invalid {
                var: "TENANT_TIERS".to_string(),
                source,
            }
        })
    }

    #[cfg(feature = "postgres")]
    async fn plan_directory(
        config: &AppConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Arc<dyn PlanDirectory>, ConfigError> {
        let Some(db_config) = config.database.as_ref() else {
            tracing::warn!("DATABASE_URL not set. Using in-memory plan directory.");
            return Ok(Arc::new(Self::seeded_directory(config)?));
        };

        match db_config.connect().await {
            Ok(conn) => Ok(Arc::new(CachedPlanDirectory::new(
                PostgresPlanDirectory::new(conn),
                config.plan_cache_ttl,
                clock,
            ))),
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory plan directory.",
                    e
                );
                Ok(Arc::new(Self::seeded_directory(config)?))
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn plan_directory(
        config: &AppConfig,
        _clock: Arc<dyn Clock>,
    ) -> Result<Arc<dyn PlanDirectory>, ConfigError> {
        tracing::info!("Running without postgres feature - using in-memory plan directory");
        Ok(Arc::new(Self::seeded_directory(config)?))
    }
}
