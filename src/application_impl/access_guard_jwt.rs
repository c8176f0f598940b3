use crate::application_port::*;
use crate::domain_model::UserId;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub signing_key: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String, // user id as string
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub aud: String,
}

/// Verifies HS256 access tokens minted by the identity service.
pub struct JwtAccessGuard {
    key: DecodingKey,
    validation: Validation,
}

impl JwtAccessGuard {
    pub fn new(cfg: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_audience(&[cfg.audience.clone()]);
        validation.set_issuer(&[cfg.issuer.clone()]);
        JwtAccessGuard {
            key: DecodingKey::from_secret(&cfg.signing_key),
            validation,
        }
    }
}

#[async_trait::async_trait]
impl AccessGuard for JwtAccessGuard {
    async fn verify_token(&self, token: &str) -> Result<UserId, AuthError> {
        let data = decode::<AccessClaims>(token, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid,
            }
        })?;
        data.claims
            .sub
            .parse::<UserId>()
            .map_err(|_| AuthError::TokenInvalid)
    }
}
