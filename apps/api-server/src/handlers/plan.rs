//! Plan introspection for the calling tenant.

use actix_web::{HttpResponse, web};
use tollgate_shared::{ApiResponse, PlanResponse};

use crate::middleware::error::{AppError, AppResult};
use crate::middleware::tenant::AuthenticatedTenant;
use crate::state::AppState;

/// GET /api/v1/plan - the tenant's tier and its configured quota.
pub async fn current_plan(
    state: web::Data<AppState>,
    tenant: AuthenticatedTenant,
) -> AppResult<HttpResponse> {
    let AuthenticatedTenant(tenant) = tenant;

    let tier = state
        .plans
        .tier_for(&tenant)
        .await?
        .ok_or_else(|| AppError::TenantNotFound(tenant.clone()))?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(PlanResponse {
        tenant_id: tenant.to_string(),
        tier: tier.to_string(),
        limit: state.policy.limit_for(tier).to_string(),
        interval_secs: state.rate_limit.interval.as_secs(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, http::header, test};
    use chrono::{DateTime, Utc};
    use serde_json::Value;

    use tollgate_core::domain::PolicyTable;
    use tollgate_infra::{
        InMemoryPlanDirectory, JwtConfig, JwtTokenService, ManualClock, RateLimitConfig, WindowStore,
    };

    use crate::middleware::tenant::{TenantResolver, test_bearer};

    fn state() -> AppState {
        let rate_limit = RateLimitConfig::default();
        let clock = ManualClock::new(DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap());
        AppState {
            plans: Arc::new(InMemoryPlanDirectory::from_seed("acme=professional").unwrap()),
            policy: Arc::new(PolicyTable::default()),
            limiter: Arc::new(WindowStore::new(rate_limit.interval, Arc::new(clock))),
            tokens: Arc::new(JwtTokenService::new(JwtConfig::default())),
            rate_limit,
        }
    }

    #[actix_web::test]
    async fn test_plan_for_tenant() {
        let state = state();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .wrap(TenantResolver::new(state.tokens.clone()))
                .configure(|cfg| crate::handlers::configure_routes(cfg, &state)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/plan")
            .insert_header((header::AUTHORIZATION, test_bearer(&JwtConfig::default(), "acme")))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers().get("x-ratelimit-remaining").unwrap().to_str().unwrap(),
            "119"
        );

        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["data"]["tier"], "PROFESSIONAL");
        assert_eq!(body["data"]["limit"], "120");
        assert_eq!(body["data"]["interval_secs"], 60);
    }

    #[actix_web::test]
    async fn test_plan_requires_tenant() {
        let state = state();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .wrap(TenantResolver::new(state.tokens.clone()))
                .configure(|cfg| crate::handlers::configure_routes(cfg, &state)),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/plan").to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
