use axum::{
    extract::{Extension, State},
    response::Json,
};

use crate::domain::{Tenant, User};
use crate::error::ApiResult;
use crate::middleware::{ApiResponse, AuthUser, TenantContext};
use crate::services::{LoginRequest, LoginResponse, RegisterUser};
use crate::state::AppState;

/// POST /auth/:tenant/login
///
/// Credentials are checked against the tenant in the path; the same
/// email may exist as separate users under different tenants.
pub async fn login(
    State(state): State<AppState>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<ApiResponse<LoginResponse>> {
    let resp = state.auth.login(tenant.id, req).await?;
    Ok(ApiResponse::success(resp))
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterUser>,
) -> ApiResult<ApiResponse<User>> {
    let user = state.auth.register(req).await?;
    Ok(ApiResponse::created(user))
}

/// GET /auth/me
pub async fn whoami(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<ApiResponse<User>> {
    let user = state
        .auth
        .validate_user(auth_user.claims.user_id, auth_user.claims.tenant_id)
        .await?;
    Ok(ApiResponse::success(user))
}

/// GET /auth/tenants
pub async fn accessible_tenants(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<ApiResponse<Vec<Tenant>>> {
    let tenants = state
        .auth
        .get_accessible_tenants(auth_user.claims.user_id)
        .await?;
    Ok(ApiResponse::success(tenants))
}
