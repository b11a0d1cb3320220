//! JWT tenant token validation.

use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::Deserialize;

use tollgate_core::domain::TenantId;
use tollgate_core::ports::{AuthError, TokenClaims, TokenService};

const DEV_SECRET: &str = "change-me-in-production";

/// JWT token service configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEV_SECRET.to_string(),
            issuer: "tollgate-api".to_string(),
        }
    }
}

impl JwtConfig {
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| DEV_SECRET.to_string());

        if secret == DEV_SECRET {
            let is_production = std::env::var("RUST_ENV")
                .map(|v| v == "production" || v == "prod")
                .unwrap_or(false);

            if is_production {
                tracing::error!(
                    "SECURITY: Using default JWT secret in production! Set JWT_SECRET environment variable."
                );
            } else {
                tracing::warn!("Using default JWT secret. Set JWT_SECRET for production use.");
            }
        }

        Self {
            secret,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "tollgate-api".to_string()),
        }
    }
}

/// Wire format of the token payload. `exp` and `iss` are checked by
/// [`Validation`] against the raw claims.
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String, // tenant id
}

/// Validates tenant access tokens issued by the identity provider.
pub struct JwtTokenService {
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer,
        }
    }
}

impl TokenService for JwtTokenService {
    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        let tenant_id = TenantId::new(token_data.claims.sub)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(TokenClaims { tenant_id })
    }
}
