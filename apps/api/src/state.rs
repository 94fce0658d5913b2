use sqlx::PgPool;
use warden_application::{RequestAuthenticator, RoleAssignmentService, RoleService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub postgres_pool: PgPool,
    pub request_authenticator: RequestAuthenticator,
    pub role_service: RoleService,
    pub role_assignment_service: RoleAssignmentService,
}
