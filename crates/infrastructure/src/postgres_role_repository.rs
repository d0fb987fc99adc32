use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use meterline_application::RoleRepository;
use meterline_core::{AppError, AppResult};
use meterline_domain::{Permission, Role, RoleId, RoleKey, RoleLevel};

/// PostgreSQL-backed read-only role registry.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: uuid::Uuid,
    key: String,
    display_name: String,
    level: i16,
}

impl RoleRow {
    fn into_role(self) -> AppResult<Role> {
        let key = RoleKey::from_str(self.key.as_str()).map_err(|error| {
            AppError::Internal(format!("role '{}' has an unknown key: {error}", self.id))
        })?;
        let level = u8::try_from(self.level)
            .map_err(|_| {
                AppError::Internal(format!("role '{}' has level {}", self.id, self.level))
            })
            .and_then(RoleLevel::new)?;

        Ok(Role::new(
            RoleId::from_uuid(self.id),
            key,
            self.display_name,
            level,
        ))
    }
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, key, display_name, level
            FROM roles
            ORDER BY level, key
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        rows.into_iter().map(RoleRow::into_role).collect()
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, key, display_name, level
            FROM roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find role '{role_id}': {error}"))
        })?;

        row.map(RoleRow::into_role).transpose()
    }

    async fn find_role_by_key(&self, key: RoleKey) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, key, display_name, level
            FROM roles
            WHERE key = $1
            "#,
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find role '{key}': {error}")))?;

        row.map(RoleRow::into_role).transpose()
    }

    async fn list_permissions_for_role(&self, role_id: RoleId) -> AppResult<Vec<Permission>> {
        let keys = sqlx::query_scalar::<_, String>(
            r#"
            SELECT permissions.key
            FROM role_permissions
            JOIN permissions ON permissions.id = role_permissions.permission_id
            WHERE role_permissions.role_id = $1
            ORDER BY permissions.key
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list permissions for role '{role_id}': {error}"
            ))
        })?;

        keys.iter()
            .map(|key| {
                Permission::from_str(key).map_err(|_| {
                    AppError::Internal(format!(
                        "role '{role_id}' is granted unknown permission '{key}'"
                    ))
                })
            })
            .collect()
    }
}
