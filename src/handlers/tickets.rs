use axum::{
    extract::{Extension, Path, State},
    response::Json,
};
use uuid::Uuid;

use crate::domain::{Ticket, TicketComment};
use crate::error::ApiResult;
use crate::middleware::{ApiResponse, AuthUser, TenantContext};
use crate::services::ticket_service::BrandTicketCount;
use crate::services::{CreateGuestTicket, CreateTicket, NewComment, TicketStats, UpdateTicket};
use crate::state::AppState;

/// POST /api/:tenant/tickets
pub async fn create(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(dto): Json<CreateTicket>,
) -> ApiResult<ApiResponse<Ticket>> {
    let ticket = state.tickets.create(dto, auth_user.claims.user_id).await?;
    Ok(ApiResponse::created(ticket))
}

/// POST /public/:tenant/tickets
pub async fn create_guest(
    State(state): State<AppState>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Json(dto): Json<CreateGuestTicket>,
) -> ApiResult<ApiResponse<Ticket>> {
    let ticket = state.tickets.create_guest(tenant.id, dto).await?;
    Ok(ApiResponse::created(ticket))
}

/// GET /api/:tenant/tickets
pub async fn list(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
) -> ApiResult<ApiResponse<Vec<Ticket>>> {
    let tickets = state
        .tickets
        .list_for_tenant(tenant.id, auth_user.caller())
        .await?;
    Ok(ApiResponse::success(tickets))
}

/// GET /api/tickets
pub async fn list_all(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<ApiResponse<Vec<Ticket>>> {
    let tickets = state.tickets.list_all(auth_user.caller()).await?;
    Ok(ApiResponse::success(tickets))
}

/// GET /api/brands/:brand/tickets
pub async fn list_by_brand(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(brand): Path<String>,
) -> ApiResult<ApiResponse<Vec<Ticket>>> {
    let tickets = state
        .tickets
        .list_by_brand(&brand, auth_user.caller())
        .await?;
    Ok(ApiResponse::success(tickets))
}

/// GET /api/:tenant/tickets/:id
pub async fn show(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path((_tenant, id)): Path<(String, Uuid)>,
) -> ApiResult<ApiResponse<Ticket>> {
    let ticket = state.tickets.get(id, auth_user.caller()).await?;
    Ok(ApiResponse::success(ticket))
}

/// PUT /api/:tenant/tickets/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path((_tenant, id)): Path<(String, Uuid)>,
    Json(dto): Json<UpdateTicket>,
) -> ApiResult<ApiResponse<Ticket>> {
    let ticket = state.tickets.update(id, dto, auth_user.caller()).await?;
    Ok(ApiResponse::success(ticket))
}

/// DELETE /api/:tenant/tickets/:id
pub async fn remove(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path((_tenant, id)): Path<(String, Uuid)>,
) -> ApiResult<ApiResponse<()>> {
    state.tickets.remove(id, auth_user.caller()).await?;
    Ok(ApiResponse::no_content())
}

/// GET /api/tickets/stats
pub async fn stats(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<ApiResponse<TicketStats>> {
    let stats = state.tickets.stats(auth_user.caller()).await?;
    Ok(ApiResponse::success(stats))
}

/// GET /api/tickets/stats/brands
pub async fn stats_by_brand(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<ApiResponse<Vec<BrandTicketCount>>> {
    let stats = state.tickets.stats_by_brand(auth_user.caller()).await?;
    Ok(ApiResponse::success(stats))
}

/// POST /api/:tenant/tickets/:id/comments
pub async fn add_comment(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path((_tenant, id)): Path<(String, Uuid)>,
    Json(dto): Json<NewComment>,
) -> ApiResult<ApiResponse<TicketComment>> {
    let comment = state
        .tickets
        .add_comment(id, dto, auth_user.caller())
        .await?;
    Ok(ApiResponse::created(comment))
}

/// GET /api/:tenant/tickets/:id/comments
pub async fn list_comments(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path((_tenant, id)): Path<(String, Uuid)>,
) -> ApiResult<ApiResponse<Vec<TicketComment>>> {
    let comments = state.tickets.list_comments(id, auth_user.caller()).await?;
    Ok(ApiResponse::success(comments))
}
