//! Credential verification, session token issuance and user registration,
//! including the one-time crown bootstrap.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{Claims, PasswordHasher, TokenSigner};
use crate::domain::{NewLogEntry, Role, Tenant, TenantType, User};
use crate::error::{ApiError, ApiResult};
use crate::services::{AccessResolver, Caller};
use crate::store::Store;

/// Fixed identity of the auto-created root tenant.
const CROWN_SLUG: &str = "crown";
const CROWN_TAX_ID: &str = "00.000.000/0001-00";

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub tenant_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    signer: Arc<dyn TokenSigner>,
    hasher: Arc<dyn PasswordHasher>,
    resolver: AccessResolver,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn Store>,
        signer: Arc<dyn TokenSigner>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        let resolver = AccessResolver::new(store.clone());
        Self {
            store,
            signer,
            hasher,
            resolver,
        }
    }

    /// Verify credentials against the given tenant and issue a token
    /// bound to it. The lookup is tenant-scoped since emails are only
    /// unique per tenant; the same address may exist under several
    /// tenants as distinct users. All credential failures share one
    /// message so callers cannot probe for registered emails.
    pub async fn login(&self, tenant_id: Uuid, req: LoginRequest) -> ApiResult<LoginResponse> {
        let invalid = || ApiError::unauthorized("Invalid credentials");

        let tenant = self
            .store
            .tenant_by_id(tenant_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Tenant not found"))?;
        if !tenant.is_active {
            return Err(ApiError::unauthorized("Tenant is inactive"));
        }

        let user = self
            .store
            .user_by_email_in_tenant(tenant.id, &req.email)
            .await?
            .ok_or_else(invalid)?;
        if !user.is_active {
            return Err(invalid());
        }
        if !self.hasher.verify(&req.password, &user.password_hash)? {
            return Err(invalid());
        }

        let claims = Claims::new(
            user.id,
            tenant.id,
            tenant.slug.clone(),
            user.role,
            user.email.clone(),
            tenant.tenant_type,
            tenant.brand.clone(),
            tenant.segment.clone(),
        );
        let token = self.signer.sign(&claims)?;

        self.store
            .insert_log(
                NewLogEntry::new(
                    "USER_LOGIN",
                    "USER",
                    user.id,
                    format!("User '{}' logged in", user.email),
                    tenant.id,
                )
                .by_user(user.id),
            )
            .await?;
        tracing::info!(user = %user.email, tenant = %tenant.slug, "login");

        Ok(LoginResponse { token, user })
    }

    /// Register a user. A `CROWN_ADMIN` registration with no tenant
    /// bootstraps the crown tenant on first use; every other role must
    /// name an existing tenant whose type admits the role.
    pub async fn register(&self, req: RegisterUser) -> ApiResult<User> {
        if req.password.len() < 6 {
            return Err(ApiError::validation(
                "Password must be at least 6 characters",
            ));
        }

        let tenant = match req.tenant_id {
            Some(tenant_id) => self
                .store
                .tenant_by_id(tenant_id)
                .await?
                .ok_or_else(|| ApiError::not_found("Tenant not found"))?,
            None if req.role == Role::CrownAdmin => self.ensure_crown_tenant().await?,
            None => {
                return Err(ApiError::validation(
                    "tenant_id is required for this role",
                ))
            }
        };

        if !req.role.allowed_in(tenant.tenant_type) {
            return Err(ApiError::validation(format!(
                "Role {} is not allowed in a {} tenant",
                req.role, tenant.tenant_type
            )));
        }

        if self
            .store
            .user_by_email_in_tenant(tenant.id, &req.email)
            .await?
            .is_some()
        {
            return Err(ApiError::conflict(
                "A user with this email already exists in this tenant",
            ));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: req.name,
            email: req.email,
            password_hash: self.hasher.hash(&req.password)?,
            role: req.role,
            tenant_id: tenant.id,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let user = self.store.insert_user(user).await?;

        self.store
            .insert_log(
                NewLogEntry::new(
                    "USER_REGISTERED",
                    "USER",
                    user.id,
                    format!("User '{}' registered with role {}", user.email, user.role),
                    tenant.id,
                ),
            )
            .await?;

        Ok(user)
    }

    /// Re-validate a token bearer against current store state. Catches
    /// users deactivated or moved after the token was issued.
    pub async fn validate_user(&self, user_id: Uuid, claims_tenant_id: Uuid) -> ApiResult<User> {
        let user = self
            .store
            .user_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::unauthorized("User no longer exists"))?;
        if !user.is_active {
            return Err(ApiError::unauthorized("User is deactivated"));
        }
        if user.tenant_id != claims_tenant_id {
            return Err(ApiError::unauthorized("Token tenant no longer matches"));
        }
        Ok(user)
    }

    /// Tenants visible to a user, for the post-login tenant picker.
    pub async fn get_accessible_tenants(&self, user_id: Uuid) -> ApiResult<Vec<Tenant>> {
        let user = self
            .store
            .user_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        let caller = Caller {
            user_id: user.id,
            role: user.role,
            tenant_id: user.tenant_id,
        };
        self.resolver.accessible_tenants(&caller).await
    }

    async fn ensure_crown_tenant(&self) -> ApiResult<Tenant> {
        if let Some(existing) = self.store.first_tenant_of_type(TenantType::Crown).await? {
            return Ok(existing);
        }
        let now = Utc::now();
        let crown = Tenant {
            id: Uuid::new_v4(),
            name: "Crown".to_string(),
            tax_id: CROWN_TAX_ID.to_string(),
            slug: CROWN_SLUG.to_string(),
            domain: None,
            tenant_type: TenantType::Crown,
            brand: None,
            segment: None,
            is_active: true,
            parent_tenant_id: None,
            created_at: now,
            updated_at: now,
        };
        let crown = self.store.insert_tenant(crown).await?;
        tracing::info!(tenant = %crown.slug, "crown tenant bootstrapped");
        Ok(crown)
    }
}
