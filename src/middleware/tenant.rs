use std::collections::HashMap;

use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};

use crate::domain::Tenant;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

use super::auth::AuthUser;

/// Resolved tenant for the `/:tenant/...` path segment, injected by
/// [`tenant_context_middleware`].
#[derive(Clone, Debug)]
pub struct TenantContext(pub Tenant);

fn valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Resolves the tenant slug from the path into a [`TenantContext`].
/// When the request also carries an [`AuthUser`], the token's tenant is
/// bound against the path tenant: an exact match or an accessible
/// descendant passes, anything else is rejected before the handler runs.
pub async fn tenant_context_middleware(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let slug = params
        .get("tenant")
        .ok_or_else(|| ApiError::validation("Missing tenant path segment"))?;
    if !valid_slug(slug) {
        return Err(ApiError::validation(format!(
            "Invalid tenant identifier '{}'",
            slug
        )));
    }

    let tenant = state
        .store
        .tenant_by_slug(slug)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found(format!("Tenant '{}' not found", slug)))?;
    if !tenant.is_active {
        return Err(ApiError::forbidden(format!(
            "Tenant '{}' is not active",
            slug
        )));
    }

    if let Some(auth_user) = request.extensions().get::<AuthUser>() {
        let caller = auth_user.caller();
        if caller.tenant_id != tenant.id
            && !state.resolver.can_access_tenant(&caller, tenant.id).await?
        {
            tracing::warn!(
                user = %caller.user_id,
                token_tenant = %caller.tenant_id,
                path_tenant = %tenant.slug,
                "token tenant does not match request tenant"
            );
            return Err(ApiError::unauthorized(
                "Token was not issued for this tenant",
            ));
        }
    }

    request.extensions_mut().insert(TenantContext(tenant));
    Ok(next.run(request).await)
}
