//! Tenant resolution middleware and extractor.
//!
//! The resolver validates the Bearer token and stores the tenant in request
//! extensions. Requests without a valid token pass through unresolved; routes
//! that need a tenant reject them via [`AuthenticatedTenant`].

use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest,
    dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header,
};
use futures::future::LocalBoxFuture;
use std::future::{Ready, ready};
use std::sync::Arc;

use tollgate_core::domain::TenantId;
use tollgate_core::ports::{AuthError, TokenService};

use super::error::AppError;

fn bearer_token(req: &ServiceRequest) -> Result<&str, AuthError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?;

    value
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))
}

/// Tenant resolver middleware factory.
pub struct TenantResolver {
    tokens: Arc<dyn TokenService>,
}

impl TenantResolver {
    pub fn new(tokens: Arc<dyn TokenService>) -> Self {
        Self { tokens }
    }
}

impl<S, B> Transform<S, ServiceRequest> for TenantResolver
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = TenantResolverService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TenantResolverService {
            service,
            tokens: self.tokens.clone(),
        }))
    }
}

pub struct TenantResolverService<S> {
    service: S,
    tokens: Arc<dyn TokenService>,
}

impl<S, B> Service<ServiceRequest> for TenantResolverService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match bearer_token(&req).and_then(|token| self.tokens.validate_token(token)) {
            Ok(claims) => {
                tracing::debug!(tenant_id = %claims.tenant_id, "Tenant resolved");
                req.extensions_mut().insert(claims.tenant_id);
            }
            Err(AuthError::MissingAuth) => {}
            Err(e) => tracing::debug!(error = %e, "Tenant not resolved"),
        }

        Box::pin(self.service.call(req))
    }
}

/// Extractor for handlers that require a resolved tenant.
#[derive(Debug, Clone)]
pub struct AuthenticatedTenant(pub TenantId);

impl FromRequest for AuthenticatedTenant {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let tenant = req.extensions().get::<TenantId>().cloned();

        ready(tenant.map(AuthenticatedTenant).ok_or_else(|| {
            AppError::Unauthorized(
                "Please provide a valid Bearer token in the Authorization header.".to_string(),
            )
        }))
    }
}

/// Mint a token the way the identity provider does, for handler tests.
#[cfg(test)]
pub(crate) fn test_bearer(config: &tollgate_infra::JwtConfig, tenant: &str) -> String {
    use jsonwebtoken::{EncodingKey, Header, encode};

    let now = chrono::Utc::now();
    let claims = serde_json::json!({
        "sub": tenant,
        "iat": now.timestamp(),
        "exp": (now + chrono::TimeDelta::hours(1)).timestamp(),
        "iss": config.issuer,
    });
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .unwrap();
    format!("Bearer {token}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, http::StatusCode, test, web};
    use tollgate_infra::{JwtConfig, JwtTokenService};

    async fn whoami(tenant: AuthenticatedTenant) -> HttpResponse {
        HttpResponse::Ok().body(tenant.0.to_string())
    }

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .wrap(TenantResolver::new(Arc::new(JwtTokenService::new(
                        JwtConfig::default(),
                    ))))
                    .route("/whoami", web::get().to(whoami)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_resolves_tenant_from_bearer() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header((header::AUTHORIZATION, test_bearer(&JwtConfig::default(), "acme")))
            .to_request();

        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(test::read_body(res).await, "acme");
    }

    #[actix_web::test]
    async fn test_foreign_issuer_is_unresolved() {
        let app = app!();
        let foreign = JwtConfig {
            issuer: "someone-else".to_string(),
            ..JwtConfig::default()
        };
        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header((header::AUTHORIZATION, test_bearer(&foreign, "acme")))
            .to_request();

        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
