use axum::{
    extract::{Extension, Path, State},
    response::Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Role, Tenant};
use crate::error::{ApiError, ApiResult};
use crate::middleware::{ApiResponse, AuthUser};
use crate::services::{Caller, CreateTenant, UpdateTenant};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct BrandEntry {
    pub brand: String,
    pub segment: Option<String>,
}

/// Directory mutations are admin work. Crown admins reach everything;
/// franchisor admins only their own subtree.
async fn ensure_admin_over(state: &AppState, caller: &Caller, target: Uuid) -> ApiResult<()> {
    if !caller.role.is_admin() {
        return Err(ApiError::forbidden(
            "Administrator role required for tenant management",
        ));
    }
    state.resolver.ensure_can_access_tenant(caller, target).await
}

/// POST /api/tenants
pub async fn create(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(dto): Json<CreateTenant>,
) -> ApiResult<ApiResponse<Tenant>> {
    let caller = auth_user.caller();
    match caller.role {
        Role::CrownAdmin => {}
        Role::FranchisorAdmin => {
            // May only create franchises under their own tenant
            if dto.parent_tenant_id != Some(caller.tenant_id) {
                return Err(ApiError::forbidden(
                    "Franchisor administrators may only create their own franchises",
                ));
            }
        }
        _ => {
            return Err(ApiError::forbidden(
                "You do not have permission to create tenants",
            ))
        }
    }
    let tenant = state.tenants.create(dto).await?;
    Ok(ApiResponse::created(tenant))
}

/// GET /api/tenants
pub async fn list(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<ApiResponse<Vec<Tenant>>> {
    let tenants = state.resolver.accessible_tenants(&auth_user.caller()).await?;
    Ok(ApiResponse::success(tenants))
}

/// GET /api/tenants/:id
pub async fn show(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Tenant>> {
    let tenant = state.tenants.resolve(&id).await?;
    state
        .resolver
        .ensure_can_access_tenant(&auth_user.caller(), tenant.id)
        .await?;
    Ok(ApiResponse::success(tenant))
}

/// GET /api/tenants/:id/children
pub async fn children(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<ApiResponse<Vec<Tenant>>> {
    state
        .resolver
        .ensure_can_access_tenant(&auth_user.caller(), id)
        .await?;
    let children = state.tenants.children_of(id).await?;
    Ok(ApiResponse::success(children))
}

/// PUT /api/tenants/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(dto): Json<UpdateTenant>,
) -> ApiResult<ApiResponse<Tenant>> {
    ensure_admin_over(&state, &auth_user.caller(), id).await?;
    let tenant = state.tenants.update(id, dto).await?;
    Ok(ApiResponse::success(tenant))
}

/// PUT /api/tenants/:id/toggle-active
pub async fn toggle_active(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<ApiResponse<Tenant>> {
    ensure_admin_over(&state, &auth_user.caller(), id).await?;
    let tenant = state.tenants.toggle_active(id).await?;
    Ok(ApiResponse::success(tenant))
}

/// DELETE /api/tenants/:id
pub async fn remove(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    ensure_admin_over(&state, &auth_user.caller(), id).await?;
    state.tenants.remove(id).await?;
    Ok(ApiResponse::no_content())
}

/// GET /api/brands
pub async fn list_brands(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<ApiResponse<Vec<BrandEntry>>> {
    state
        .resolver
        .ensure_can_view_cross_brand(&auth_user.caller())?;
    let brands = state
        .tenants
        .list_brands()
        .await?
        .into_iter()
        .map(|(brand, segment)| BrandEntry { brand, segment })
        .collect();
    Ok(ApiResponse::success(brands))
}

/// GET /api/brands/:brand/tenants
pub async fn tenants_by_brand(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(brand): Path<String>,
) -> ApiResult<ApiResponse<Vec<Tenant>>> {
    state
        .resolver
        .ensure_can_view_cross_brand(&auth_user.caller())?;
    let tenants = state.tenants.find_by_brand(&brand).await?;
    Ok(ApiResponse::success(tenants))
}

/// GET /api/segments
pub async fn list_segments(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<ApiResponse<Vec<String>>> {
    state
        .resolver
        .ensure_can_view_cross_brand(&auth_user.caller())?;
    let segments = state.tenants.list_segments().await?;
    Ok(ApiResponse::success(segments))
}
