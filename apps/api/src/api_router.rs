use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{delete, get, put};
use meterline_core::AppError;
use tower_http::trace::TraceLayer;
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::PostgresStore;

use crate::state::AppState;
use crate::{handlers, middleware};

mod cors;

pub fn build_router(
    app_state: AppState,
    frontend_url: &str,
    session_layer: SessionManagerLayer<PostgresStore>,
) -> Result<Router, AppError> {
    let protected_routes = Router::new()
        .route("/api/me/context", get(handlers::me::context_handler))
        .route("/api/me/onboarding", get(handlers::me::onboarding_handler))
        .route(
            "/api/organization/roles",
            get(handlers::organization::list_roles_handler),
        )
        .route(
            "/api/organization/roles/assignable",
            get(handlers::organization::assignable_roles_handler),
        )
        .route(
            "/api/organization/members",
            get(handlers::organization::list_members_handler),
        )
        .route(
            "/api/organization/members/{principal_id}",
            delete(handlers::organization::remove_member_handler),
        )
        .route(
            "/api/organization/members/{principal_id}/role",
            put(handlers::organization::change_member_role_handler),
        )
        .route(
            "/api/organization/role-changes",
            get(handlers::organization::role_change_history_handler),
        )
        .route_layer(from_fn(middleware::require_auth));

    let cors_layer = cors::build_cors_layer(frontend_url)?;

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(protected_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state))
}
