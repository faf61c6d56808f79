use axum::extract::{Extension, Path, State};
use uuid::Uuid;

use crate::domain::LogEntry;
use crate::error::ApiResult;
use crate::middleware::{ApiResponse, AuthUser, TenantContext};
use crate::state::AppState;

/// GET /api/:tenant/logs
pub async fn list(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
) -> ApiResult<ApiResponse<Vec<LogEntry>>> {
    let entries = state
        .logs
        .list_for_tenant(tenant.id, auth_user.caller())
        .await?;
    Ok(ApiResponse::success(entries))
}

/// GET /api/:tenant/logs/ticket/:id
pub async fn list_for_ticket(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path((_tenant, ticket_id)): Path<(String, Uuid)>,
) -> ApiResult<ApiResponse<Vec<LogEntry>>> {
    let entries = state
        .logs
        .list_for_ticket(ticket_id, auth_user.caller())
        .await?;
    Ok(ApiResponse::success(entries))
}

/// GET /api/:tenant/logs/user/:id
pub async fn list_for_user(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path((_tenant, user_id)): Path<(String, Uuid)>,
) -> ApiResult<ApiResponse<Vec<LogEntry>>> {
    let entries = state
        .logs
        .list_for_user(user_id, auth_user.caller())
        .await?;
    Ok(ApiResponse::success(entries))
}
