use super::*;

impl PostgresAuthorizationRepository {
    /// Inserts or updates a principal record.
    pub async fn save_principal(&self, principal: &Principal) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO principals (
                id,
                tenant_id,
                display_name,
                legacy_role,
                direct_permissions,
                is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET display_name = EXCLUDED.display_name,
                legacy_role = EXCLUDED.legacy_role,
                direct_permissions = EXCLUDED.direct_permissions,
                is_active = EXCLUDED.is_active,
                updated_at = now()
            "#,
        )
        .bind(principal.id().as_uuid())
        .bind(principal.tenant_id().as_uuid())
        .bind(principal.display_name())
        .bind(principal.legacy_role().as_str())
        .bind(key_strings(principal.direct_permissions()))
        .bind(principal.is_active())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to save principal: {error}")))?;

        Ok(())
    }

    pub(super) async fn find_principal_impl(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Option<Principal>> {
        let row = sqlx::query_as::<_, PrincipalRow>(
            r#"
            SELECT id, tenant_id, display_name, legacy_role, direct_permissions, is_active
            FROM principals
            WHERE id = $1
            "#,
        )
        .bind(principal_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load principal: {error}")))?;

        row.map(Principal::try_from).transpose()
    }
}
