use warden_application::AssignmentState;

use super::*;

const ASSIGNMENT_COLUMNS: &str = "id, principal_id, role_id, tenant_id, is_active, expires_at, \
     additional_grants, revocations, granted_by, scope";

impl PostgresAuthorizationRepository {
    pub(super) async fn find_assignments_impl(
        &self,
        filter: AssignmentFilter,
    ) -> AppResult<Vec<RoleAssignment>> {
        let (active_only, effective_at) = match filter.state {
            AssignmentState::Any => (false, None),
            AssignmentState::Active => (true, None),
            AssignmentState::EffectiveAt(now) => (true, Some(now)),
        };

        let rows = sqlx::query_as::<_, AssignmentRow>(&format!(
            r#"
            SELECT {ASSIGNMENT_COLUMNS}
            FROM role_assignments
            WHERE ($1::uuid IS NULL OR principal_id = $1)
                AND ($2::uuid IS NULL OR role_id = $2)
                AND ($3::uuid IS NULL OR tenant_id = $3)
                AND (NOT $4 OR is_active)
                AND ($5::timestamptz IS NULL OR expires_at IS NULL OR expires_at > $5)
            ORDER BY created_at, id
            "#
        ))
        .bind(filter.principal_id.map(|principal_id| principal_id.as_uuid()))
        .bind(filter.role_id.map(|role_id| role_id.as_uuid()))
        .bind(filter.tenant_id.map(|tenant_id| tenant_id.as_uuid()))
        .bind(active_only)
        .bind(effective_at)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list role assignments: {error}")))?;

        rows.into_iter().map(RoleAssignment::try_from).collect()
    }

    pub(super) async fn upsert_assignment_impl(
        &self,
        key: AssignmentKey,
        patch: AssignmentPatch,
    ) -> AppResult<RoleAssignment> {
        let row = sqlx::query_as::<_, AssignmentRow>(&format!(
            r#"
            INSERT INTO role_assignments (
                id,
                principal_id,
                role_id,
                tenant_id,
                is_active,
                expires_at,
                additional_grants,
                revocations,
                granted_by,
                scope
            )
            VALUES ($1, $2, $3, $4, true, $5, $6, $7, $8, $9)
            ON CONFLICT (principal_id, role_id, tenant_id) DO UPDATE
            SET is_active = true,
                expires_at = EXCLUDED.expires_at,
                additional_grants = EXCLUDED.additional_grants,
                revocations = EXCLUDED.revocations,
                granted_by = EXCLUDED.granted_by,
                scope = EXCLUDED.scope,
                updated_at = now()
            RETURNING {ASSIGNMENT_COLUMNS}
            "#
        ))
        .bind(AssignmentId::new().as_uuid())
        .bind(key.principal_id.as_uuid())
        .bind(key.role_id.as_uuid())
        .bind(key.tenant_id.as_uuid())
        .bind(patch.expires_at)
        .bind(key_strings(&patch.additional_grants))
        .bind(key_strings(&patch.revocations))
        .bind(patch.granted_by.as_uuid())
        .bind(patch.scope)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to upsert role assignment: {error}")))?;

        RoleAssignment::try_from(row)
    }

    pub(super) async fn update_assignment_impl(
        &self,
        assignment_id: AssignmentId,
        update: AssignmentUpdate,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE role_assignments
            SET is_active = COALESCE($2, is_active),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(assignment_id.as_uuid())
        .bind(update.is_active)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update role assignment: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "role assignment '{assignment_id}' was not found"
            )));
        }

        Ok(())
    }
}
