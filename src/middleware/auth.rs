use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::Claims;
use crate::error::{ApiError, ApiResult};
use crate::services::Caller;
use crate::state::AppState;

/// Authenticated user context extracted from the JWT, injected as a
/// request extension for downstream handlers.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub claims: Claims,
}

impl AuthUser {
    pub fn caller(&self) -> Caller {
        Caller::from(&self.claims)
    }
}

/// Validates the Bearer token and re-checks the bearer against current
/// store state, so revoked or deactivated users are cut off even with a
/// token that has not expired yet.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = extract_bearer(&headers)?;
    let claims = state.signer.verify(&token)?;
    state
        .auth
        .validate_user(claims.user_id, claims.tenant_id)
        .await?;

    request.extensions_mut().insert(AuthUser { claims });
    Ok(next.run(request).await)
}

fn extract_bearer(headers: &HeaderMap) -> ApiResult<String> {
    let header = headers
        .get("authorization")
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;
    let value = header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header"))?;
    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.to_string()),
        _ => Err(ApiError::unauthorized(
            "Authorization header must use Bearer token format",
        )),
    }
}
