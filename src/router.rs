use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config;
use crate::handlers;
use crate::middleware::{jwt_auth_middleware, tenant_context_middleware};
use crate::state::AppState;

/// Assemble the full route tree. Tenant-scoped routes run the JWT layer
/// first, then the tenant-context layer which also enforces the
/// token-to-path tenant binding.
pub fn app(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/register", post(handlers::auth::register));

    // Unauthenticated but tenant-scoped: login and guest ticket intake
    let guest = Router::new()
        .route("/auth/:tenant/login", post(handlers::auth::login))
        .route(
            "/public/:tenant/tickets",
            post(handlers::tickets::create_guest),
        )
        .layer(from_fn_with_state(
            state.clone(),
            tenant_context_middleware,
        ));

    let protected = Router::new()
        .route("/auth/me", get(handlers::auth::whoami))
        .route("/auth/tenants", get(handlers::auth::accessible_tenants))
        .route(
            "/api/tenants",
            get(handlers::tenants::list).post(handlers::tenants::create),
        )
        .route(
            "/api/tenants/:id",
            get(handlers::tenants::show)
                .put(handlers::tenants::update)
                .delete(handlers::tenants::remove),
        )
        .route(
            "/api/tenants/:id/children",
            get(handlers::tenants::children),
        )
        .route(
            "/api/tenants/:id/toggle-active",
            put(handlers::tenants::toggle_active),
        )
        .route("/api/brands", get(handlers::tenants::list_brands))
        .route(
            "/api/brands/:brand/tenants",
            get(handlers::tenants::tenants_by_brand),
        )
        .route(
            "/api/brands/:brand/tickets",
            get(handlers::tickets::list_by_brand),
        )
        .route("/api/segments", get(handlers::tenants::list_segments))
        .route("/api/tickets", get(handlers::tickets::list_all))
        .route("/api/tickets/stats", get(handlers::tickets::stats))
        .route(
            "/api/tickets/stats/brands",
            get(handlers::tickets::stats_by_brand),
        )
        .layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    let tenant_scoped = Router::new()
        .route(
            "/api/:tenant/tickets",
            get(handlers::tickets::list).post(handlers::tickets::create),
        )
        .route(
            "/api/:tenant/tickets/:id",
            get(handlers::tickets::show)
                .put(handlers::tickets::update)
                .delete(handlers::tickets::remove),
        )
        .route(
            "/api/:tenant/tickets/:id/comments",
            get(handlers::tickets::list_comments).post(handlers::tickets::add_comment),
        )
        .route(
            "/api/:tenant/categories",
            get(handlers::categories::list).post(handlers::categories::create),
        )
        .route(
            "/api/:tenant/categories/all",
            get(handlers::categories::list_all),
        )
        .route(
            "/api/:tenant/categories/:id",
            get(handlers::categories::show)
                .put(handlers::categories::update)
                .delete(handlers::categories::remove),
        )
        .route("/api/:tenant/logs", get(handlers::logs::list))
        .route(
            "/api/:tenant/logs/ticket/:id",
            get(handlers::logs::list_for_ticket),
        )
        .route(
            "/api/:tenant/logs/user/:id",
            get(handlers::logs::list_for_user),
        )
        .layer(from_fn_with_state(
            state.clone(),
            tenant_context_middleware,
        ))
        .layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    let mut router = Router::new()
        .merge(public)
        .merge(guest)
        .merge(protected)
        .merge(tenant_scoped)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    if config::config().server.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }

    router.with_state(state)
}
