use crate::domain_model::UserId;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("no access token provided")]
    TokenMissing,
    #[error("token invalid")]
    TokenInvalid,
    #[error("token expired")]
    TokenExpired,
    #[error("internal error: {0}")]
    InternalError(String),
}

/// Resolves the caller of a request. Everything behind it trusts the returned id.
#[async_trait::async_trait]
pub trait AccessGuard: Send + Sync {
    async fn verify_token(&self, token: &str) -> Result<UserId, AuthError>;
}
