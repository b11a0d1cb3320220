//! Rate limiting middleware - the HTTP boundary of the admission engine.
//!
//! For each request with a resolved tenant: look up the tier, map it to a
//! limit, ask the limiter, then either forward (with quota headers) or reply
//! 429 (with quota headers and `Retry-After`). Requests without a tenant pass
//! through. Plan directory and limiter failures fail open.

use actix_web::{
    Error, HttpMessage, HttpResponse, ResponseError,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header::{self, HeaderMap, HeaderName, HeaderValue},
};
use futures::future::LocalBoxFuture;
use std::future::{Ready, ready};
use std::rc::Rc;
use std::sync::Arc;
use tracing_actix_web::RequestId;

use tollgate_core::domain::{Decision, PolicyTable, TenantId, Tier, UNLIMITED_MARKER};
use tollgate_core::ports::{PlanDirectory, RateLimiter};
use tollgate_shared::RateLimitExceededResponse;

use super::error::AppError;

pub static RATE_LIMIT_LIMIT: &str = "x-ratelimit-limit";
pub static RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
pub static RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

/// Write the quota headers for `decision`; `Retry-After` only on rejection.
fn apply_headers(headers: &mut HeaderMap, decision: &Decision) {
    let limit = match decision.limit.max_requests() {
        Some(max) => HeaderValue::from(max),
        None => HeaderValue::from_static(UNLIMITED_MARKER),
    };
    let remaining = match decision.remaining {
        Some(remaining) => HeaderValue::from(remaining),
        None => HeaderValue::from_static(UNLIMITED_MARKER),
    };

    headers.insert(HeaderName::from_static(RATE_LIMIT_LIMIT), limit);
    headers.insert(HeaderName::from_static(RATE_LIMIT_REMAINING), remaining);
    headers.insert(
        HeaderName::from_static(RATE_LIMIT_RESET),
        HeaderValue::from(decision.reset_epoch_secs()),
    );

    if let Some(secs) = decision.retry_after_secs() {
        headers.insert(header::RETRY_AFTER, HeaderValue::from(secs));
    }
}

fn rejection(req: &ServiceRequest, decision: &Decision, tier: Tier) -> HttpResponse {
    let retry_after = decision.retry_after_secs().unwrap_or(1);
    let limit = decision.limit.max_requests().unwrap_or_default();
    let request_id = req.extensions().get::<RequestId>().map(|id| id.to_string());

    let mut body = RateLimitExceededResponse::new(retry_after, limit, tier.to_string());
    body.problem = body.problem.with_request_id(request_id);

    let mut response = HttpResponse::TooManyRequests().json(body);
    apply_headers(response.headers_mut(), decision);
    response
}

/// Rate limiting middleware factory.
pub struct RateLimitMiddleware {
    limiter: Arc<dyn RateLimiter>,
    plans: Arc<dyn PlanDirectory>,
    policy: Arc<PolicyTable>,
}

impl RateLimitMiddleware {
    pub fn new(
        limiter: Arc<dyn RateLimiter>,
        plans: Arc<dyn PlanDirectory>,
        policy: Arc<PolicyTable>,
    ) -> Self {
        Self {
            limiter,
            plans,
            policy,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
            plans: self.plans.clone(),
            policy: self.policy.clone(),
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
    limiter: Arc<dyn RateLimiter>,
    plans: Arc<dyn PlanDirectory>,
    policy: Arc<PolicyTable>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let limiter = self.limiter.clone();
        let plans = self.plans.clone();
        let policy = self.policy.clone();

        Box::pin(async move {
            // No tenant: authentication decides what happens to this request.
            let tenant = req.extensions().get::<TenantId>().cloned();
            let Some(tenant) = tenant else {
                let res = service.call(req).await?;
                return Ok(res.map_into_left_body());
            };

            let tier = match plans.tier_for(&tenant).await {
                Ok(Some(tier)) => tier,
                Ok(None) => {
                    tracing::warn!(tenant_id = %tenant, "Rate limit skipped, tenant has no plan");
                    let response = AppError::TenantNotFound(tenant).error_response();
                    let (http_req, _payload) = req.into_parts();
                    return Ok(ServiceResponse::new(http_req, response).map_into_right_body());
                }
                Err(e) => {
                    tracing::error!(tenant_id = %tenant, error = %e, "Plan lookup failed, failing open");
                    let res = service.call(req).await?;
                    return Ok(res.map_into_left_body());
                }
            };

            let limit = policy.limit_for(tier);
            let decision = match limiter.check_and_consume(&tenant, limit) {
                Ok(decision) => decision,
                Err(e) => {
                    tracing::error!(tenant_id = %tenant, error = %e, "Rate limiter error, failing open");
                    let res = service.call(req).await?;
                    return Ok(res.map_into_left_body());
                }
            };

            if !decision.admitted {
                tracing::warn!(
                    tenant_id = %tenant,
                    tier = %tier,
                    limit = %decision.limit,
                    retry_after = ?decision.retry_after_secs(),
                    "Rate limit exceeded"
                );

                let response = rejection(&req, &decision, tier);
                let (http_req, _payload) = req.into_parts();
                return Ok(ServiceResponse::new(http_req, response).map_into_right_body());
            }

            let mut res = service.call(req).await?;
            apply_headers(res.headers_mut(), &decision);
            Ok(res.map_into_left_body())
        })
    }
}
