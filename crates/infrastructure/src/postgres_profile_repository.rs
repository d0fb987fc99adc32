use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use meterline_application::ProfileRepository;
use meterline_core::{AppError, AppResult, OrganizationId, PrincipalId};
use meterline_domain::{BranchId, Profile, RoleId};

/// PostgreSQL-backed principal profile repository.
#[derive(Clone)]
pub struct PostgresProfileRepository {
    pool: PgPool,
}

impl PostgresProfileRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ProfileRow {
    principal_id: Uuid,
    email: String,
    full_name: Option<String>,
    role_id: Option<Uuid>,
    organization_id: Option<Uuid>,
    branch_id: Option<Uuid>,
    deleted_at: Option<DateTime<Utc>>,
    deleted_by: Option<Uuid>,
}

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
    async fn find_profile(&self, principal_id: PrincipalId) -> AppResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT
                principal_id,
                email,
                full_name,
                role_id,
                organization_id,
                branch_id,
                deleted_at,
                deleted_by
            FROM profiles
            WHERE principal_id = $1
            "#,
        )
        .bind(principal_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to find profile of principal '{principal_id}': {error}"
            ))
        })?;

        Ok(row.map(|row| Profile {
            principal_id: PrincipalId::from_uuid(row.principal_id),
            email: row.email,
            full_name: row.full_name,
            role_id: row.role_id.map(RoleId::from_uuid),
            organization_id: row.organization_id.map(OrganizationId::from_uuid),
            branch_id: row.branch_id.map(BranchId::from_uuid),
            deleted_at: row.deleted_at,
            deleted_by: row.deleted_by.map(PrincipalId::from_uuid),
        }))
    }
}
