use super::*;

const ROLE_COLUMNS: &str = "id, name, slug, module, permissions, is_system, tenant_id, is_active";

impl PostgresAuthorizationRepository {
    pub(super) async fn find_role_impl(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1"
        ))
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role: {error}")))?;

        row.map(Role::try_from).transpose()
    }

    pub(super) async fn list_roles_impl(&self, filter: RoleFilter) -> AppResult<Vec<Role>> {
        let role_ids = filter
            .role_ids
            .map(|role_ids| role_ids.iter().map(RoleId::as_uuid).collect::<Vec<_>>());

        let rows = sqlx::query_as::<_, RoleRow>(&format!(
            r#"
            SELECT {ROLE_COLUMNS}
            FROM roles
            WHERE ($1::uuid[] IS NULL OR id = ANY($1))
                AND ($2::uuid IS NULL OR tenant_id IS NULL OR tenant_id = $2)
                AND ($3::text IS NULL OR slug = $3)
                AND ($4 OR is_active)
            ORDER BY name, id
            "#
        ))
        .bind(role_ids)
        .bind(filter.available_to.map(|tenant_id| tenant_id.as_uuid()))
        .bind(filter.slug)
        .bind(filter.include_inactive)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        rows.into_iter().map(Role::try_from).collect()
    }

    pub(super) async fn insert_role_impl(&self, role: Role) -> AppResult<Role> {
        sqlx::query(
            r#"
            INSERT INTO roles (
                id,
                name,
                slug,
                module,
                permissions,
                is_system,
                tenant_id,
                is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(role.id().as_uuid())
        .bind(role.name())
        .bind(role.slug())
        .bind(role.module().as_str())
        .bind(key_strings(role.permissions()))
        .bind(role.is_system())
        .bind(role.tenant_id().map(|tenant_id| tenant_id.as_uuid()))
        .bind(role.is_active())
        .execute(&self.pool)
        .await
        .map_err(|error| map_role_conflict(error, role.slug()))?;

        Ok(role)
    }

    pub(super) async fn save_role_impl(&self, role: Role) -> AppResult<Role> {
        let result = sqlx::query(
            r#"
            UPDATE roles
            SET name = $2,
                module = $3,
                permissions = $4,
                is_active = $5,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(role.id().as_uuid())
        .bind(role.name())
        .bind(role.module().as_str())
        .bind(key_strings(role.permissions()))
        .bind(role.is_active())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to save role: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "role '{}' was not found",
                role.id()
            )));
        }

        Ok(role)
    }
}

fn map_role_conflict(error: sqlx::Error, slug: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!("role slug '{slug}' already exists"));
    }

    AppError::Internal(format!("failed to create role: {error}"))
}
