//! HTTP handlers and route configuration.

mod health;
mod plan;

use actix_web::web;

use crate::middleware::rate_limit::RateLimitMiddleware;
use crate::state::AppState;

/// Configure all application routes.
///
/// Everything under `/api/v1` is tenant traffic and passes through the rate limiter.
pub fn configure_routes(cfg: &mut web::ServiceConfig, state: &AppState) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            // Tenant routes
            .service(
                web::scope("/v1")
                    .wrap(RateLimitMiddleware::new(
                        state.limiter.clone(),
                        state.plans.clone(),
                        state.policy.clone(),
                    ))
                    .route("/plan", web::get().to(plan::current_plan)),
            ),
    );
}
