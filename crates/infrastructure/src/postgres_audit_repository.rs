use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use warden_application::{AuditEvent, AuditRepository};
use warden_core::{AppError, AppResult};

/// Append-only audit sink over the `audit_log_entries` table.
///
/// Role and assignment changes land here with the acting principal as
/// `subject`; rows are never updated or deleted by the engine.
#[derive(Clone)]
pub struct PostgresAuditRepository {
    pool: PgPool,
}

impl PostgresAuditRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for PostgresAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        let action = event.action.as_str();
        let entry_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO audit_log_entries (
                tenant_id,
                subject,
                action,
                resource_type,
                resource_id,
                detail
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(event.tenant_id.as_uuid())
        .bind(event.subject.as_str())
        .bind(action)
        .bind(event.resource_type.as_str())
        .bind(event.resource_id.as_str())
        .bind(event.detail.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to append audit event '{action}': {error}"))
        })?;

        debug!(
            %entry_id,
            tenant_id = %event.tenant_id,
            action,
            resource_type = %event.resource_type,
            resource_id = %event.resource_id,
            "security audit entry recorded"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;
    use sqlx::migrate::Migrator;
    use sqlx::postgres::PgPoolOptions;
    use warden_application::{AuditEvent, AuditRepository};
    use warden_core::TenantId;
    use warden_domain::AuditAction;

    use super::PostgresAuditRepository;

    static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

    async fn test_pool() -> Option<PgPool> {
        let Ok(database_url) = std::env::var("DATABASE_URL") else {
            return None;
        };

        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(database_url.as_str())
            .await
            .unwrap_or_else(|error| panic!("failed to connect to DATABASE_URL in test: {error}"));
        MIGRATOR
            .run(&pool)
            .await
            .unwrap_or_else(|error| panic!("failed to run migrations in test: {error}"));
        Some(pool)
    }

    #[tokio::test]
    async fn appended_assignment_event_is_stored_under_its_tenant() {
        let Some(pool) = test_pool().await else {
            return;
        };

        let repository = PostgresAuditRepository::new(pool.clone());
        let tenant_id = TenantId::new();
        repository
            .append_event(AuditEvent {
                tenant_id,
                subject: "admin-1".to_owned(),
                action: AuditAction::SecurityRoleAssigned,
                resource_type: "role_assignment".to_owned(),
                resource_id: "principal-1:role-1".to_owned(),
                detail: Some("expires_at=none".to_owned()),
            })
            .await
            .unwrap_or_else(|error| panic!("append failed: {error}"));

        let rows: Vec<(String, String, Option<String>)> = sqlx::query_as(
            "SELECT subject, action, detail FROM audit_log_entries WHERE tenant_id = $1",
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&pool)
        .await
        .unwrap_or_else(|error| panic!("failed to read audit rows: {error}"));

        assert_eq!(
            rows,
            vec![(
                "admin-1".to_owned(),
                AuditAction::SecurityRoleAssigned.as_str().to_owned(),
                Some("expires_at=none".to_owned()),
            )]
        );
    }
}
