//! Tenant authentication port.

use crate::domain::TenantId;

/// Claims carried by a tenant access token.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub tenant_id: TenantId,
}

/// Validates access tokens minted by the identity provider.
pub trait TokenService: Send + Sync {
    /// Validate and decode a token.
    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Missing authorization header")]
    MissingAuth,
}
