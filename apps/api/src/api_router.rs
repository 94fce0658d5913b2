mod cors;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use tower_http::trace::TraceLayer;
use warden_core::AppError;

use crate::state::AppState;
use crate::{handlers, middleware};

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let protected_routes = Router::new()
        .route("/api/me", get(handlers::me::me_handler))
        .route(
            "/api/security/roles",
            get(handlers::security::list_roles_handler)
                .post(handlers::security::create_role_handler),
        )
        .route(
            "/api/security/roles/{role_id}",
            put(handlers::security::update_role_handler)
                .delete(handlers::security::delete_role_handler),
        )
        .route(
            "/api/security/roles/{role_id}/clone",
            post(handlers::security::clone_role_handler),
        )
        .route(
            "/api/security/principals/{principal_id}/assignments",
            get(handlers::security::list_principal_assignments_handler),
        )
        .route(
            "/api/security/role-assignments",
            post(handlers::security::assign_role_handler),
        )
        .route(
            "/api/security/role-revocations",
            post(handlers::security::revoke_role_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_auth,
        ));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors::build_cors_layer(frontend_url)?)
        .with_state(app_state))
}
