use std::sync::Arc;

use sqlx::PgPool;
use warden_application::{
    PermissionResolver, RequestAuthenticator, RoleAssignmentService, RoleService,
};
use warden_infrastructure::{
    InMemoryPermissionCache, JwtCredentialService, PostgresAuditRepository,
    PostgresAuthorizationRepository,
};

use crate::api_config::ApiConfig;
use crate::state::AppState;

pub fn build_app_state(config: &ApiConfig, pool: PgPool) -> AppState {
    let authorization_repository = Arc::new(PostgresAuthorizationRepository::new(pool.clone()));
    let audit_repository = Arc::new(PostgresAuditRepository::new(pool.clone()));
    let permission_cache = Arc::new(InMemoryPermissionCache::with_ttl(
        config.permission_cache_ttl,
    ));
    let credential_service = Arc::new(JwtCredentialService::new(
        config.credential_secret.as_bytes(),
        config.credential_issuer.clone(),
        config.credential_ttl,
    ));

    let permission_resolver = PermissionResolver::new(
        authorization_repository.clone(),
        authorization_repository.clone(),
        authorization_repository.clone(),
        permission_cache.clone(),
    );

    AppState {
        request_authenticator: RequestAuthenticator::new(
            credential_service.clone(),
            credential_service,
            authorization_repository.clone(),
            permission_resolver,
        ),
        role_service: RoleService::new(
            authorization_repository.clone(),
            permission_cache.clone(),
            audit_repository.clone(),
        ),
        role_assignment_service: RoleAssignmentService::new(
            authorization_repository.clone(),
            authorization_repository.clone(),
            authorization_repository,
            permission_cache,
            audit_repository,
        ),
        postgres_pool: pool,
    }
}
