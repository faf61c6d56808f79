use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;
use crate::domain::{Role, TenantType};
use crate::error::{ApiError, ApiResult};

/// Session token claims. The tenant binding (`tenant_id` / `tenant_slug`)
/// is cross-checked against the resolved tenant context on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub tenant_slug: String,
    pub role: Role,
    pub email: String,
    pub tenant_type: TenantType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: Uuid,
        tenant_id: Uuid,
        tenant_slug: String,
        role: Role,
        email: String,
        tenant_type: TenantType,
        brand: Option<String>,
        segment: Option<String>,
    ) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        Self {
            user_id,
            tenant_id,
            tenant_slug,
            role,
            email,
            tenant_type,
            brand,
            segment,
            exp: (now + Duration::hours(expiry_hours)).timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Token-signing collaborator. The core only depends on the claim shape;
/// expiry and refresh policy live behind this seam.
pub trait TokenSigner: Send + Sync {
    fn sign(&self, claims: &Claims) -> ApiResult<String>;
    fn verify(&self, token: &str) -> ApiResult<Claims>;
}

/// Credential-verification collaborator.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plain: &str) -> ApiResult<String>;
    fn verify(&self, plain: &str, hash: &str) -> ApiResult<bool>;
}

/// HMAC-signed JWT implementation of [`TokenSigner`].
pub struct JwtSigner {
    secret: String,
}

impl JwtSigner {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn from_config() -> Self {
        Self::new(config::config().security.jwt_secret.clone())
    }
}

impl TokenSigner for JwtSigner {
    fn sign(&self, claims: &Claims) -> ApiResult<String> {
        if self.secret.is_empty() {
            return Err(ApiError::internal("JWT secret not configured"));
        }
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::internal(format!("token generation failed: {}", e)))
    }

    fn verify(&self, token: &str) -> ApiResult<Claims> {
        if self.secret.is_empty() {
            return Err(ApiError::internal("JWT secret not configured"));
        }
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| ApiError::unauthorized(format!("invalid token: {}", e)))?;
        Ok(data.claims)
    }
}

/// Bcrypt implementation of [`PasswordHasher`].
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn from_config() -> Self {
        Self::new(config::config().security.bcrypt_cost)
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, plain: &str) -> ApiResult<String> {
        if plain.is_empty() {
            return Err(ApiError::validation("Password cannot be empty"));
        }
        bcrypt::hash(plain, self.cost)
            .map_err(|e| ApiError::internal(format!("password hashing failed: {}", e)))
    }

    fn verify(&self, plain: &str, hash: &str) -> ApiResult<bool> {
        bcrypt::verify(plain, hash)
            .map_err(|e| ApiError::internal(format!("password verification failed: {}", e)))
    }
}
