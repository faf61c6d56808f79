use axum::{
    extract::{Extension, Path, State},
    response::Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::domain::TicketCategory;
use crate::error::{ApiError, ApiResult};
use crate::middleware::{ApiResponse, AuthUser, TenantContext};
use crate::services::{CreateCategory, UpdateCategory};
use crate::state::AppState;

fn ensure_agent_or_admin(auth_user: &AuthUser) -> ApiResult<()> {
    if auth_user.claims.role == crate::domain::Role::User {
        return Err(ApiError::forbidden(
            "You do not have permission to manage categories",
        ));
    }
    Ok(())
}

/// POST /api/:tenant/categories
pub async fn create(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Json(dto): Json<CreateCategory>,
) -> ApiResult<ApiResponse<TicketCategory>> {
    ensure_agent_or_admin(&auth_user)?;
    let category = state.categories.create(tenant.id, dto).await?;
    Ok(ApiResponse::created(category))
}

/// GET /api/:tenant/categories
pub async fn list(
    State(state): State<AppState>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
) -> ApiResult<ApiResponse<Vec<TicketCategory>>> {
    let categories = state.categories.list_active(tenant.id).await?;
    Ok(ApiResponse::success(categories))
}

/// GET /api/:tenant/categories/all
pub async fn list_all(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
) -> ApiResult<ApiResponse<Vec<TicketCategory>>> {
    ensure_agent_or_admin(&auth_user)?;
    let categories = state.categories.list(tenant.id).await?;
    Ok(ApiResponse::success(categories))
}

/// GET /api/:tenant/categories/:id
pub async fn show(
    State(state): State<AppState>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path((_tenant, id)): Path<(String, Uuid)>,
) -> ApiResult<ApiResponse<TicketCategory>> {
    let category = state.categories.get(tenant.id, id).await?;
    Ok(ApiResponse::success(category))
}

/// PUT /api/:tenant/categories/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path((_tenant, id)): Path<(String, Uuid)>,
    Json(dto): Json<UpdateCategory>,
) -> ApiResult<ApiResponse<TicketCategory>> {
    ensure_agent_or_admin(&auth_user)?;
    let category = state.categories.update(tenant.id, id, dto).await?;
    Ok(ApiResponse::success(category))
}

/// DELETE /api/:tenant/categories/:id
///
/// Categories still referenced by tickets are deactivated instead of
/// removed; the response says which happened.
pub async fn remove(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path((_tenant, id)): Path<(String, Uuid)>,
) -> ApiResult<ApiResponse<Value>> {
    ensure_agent_or_admin(&auth_user)?;
    let outcome = state.categories.remove(tenant.id, id).await?;
    let body = match outcome {
        Some(category) => json!({ "deactivated": true, "category": category }),
        None => json!({ "deleted": true }),
    };
    Ok(ApiResponse::success(body))
}
