use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use meterline_application::{
    RoleChangeAudit, RoleChangeAuditEntry, RoleChangeAuditRepository, RoleChangeLogRepository,
    RoleChangeQuery,
};
use meterline_core::{AppError, AppResult, OrganizationId, PrincipalId};
use meterline_domain::RoleId;

/// PostgreSQL-backed append-only role-change audit trail.
#[derive(Clone)]
pub struct PostgresRoleChangeAuditRepository {
    pool: PgPool,
}

impl PostgresRoleChangeAuditRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleChangeRow {
    event_id: uuid::Uuid,
    target_principal_id: uuid::Uuid,
    from_role_id: uuid::Uuid,
    to_role_id: uuid::Uuid,
    changed_by: uuid::Uuid,
    description: String,
    changed_at: DateTime<Utc>,
}

#[async_trait]
impl RoleChangeAuditRepository for PostgresRoleChangeAuditRepository {
    async fn append_role_change(&self, audit: RoleChangeAudit) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO role_change_audit (
                organization_id,
                target_principal_id,
                from_role_id,
                to_role_id,
                changed_by,
                description,
                changed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(audit.organization_id.as_uuid())
        .bind(audit.target_principal_id.as_uuid())
        .bind(audit.from_role_id.as_uuid())
        .bind(audit.to_role_id.as_uuid())
        .bind(audit.changed_by.as_uuid())
        .bind(audit.description)
        .bind(audit.changed_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append role change: {error}")))?;

        Ok(())
    }
}

#[async_trait]
impl RoleChangeLogRepository for PostgresRoleChangeAuditRepository {
    async fn list_role_changes(
        &self,
        organization_id: OrganizationId,
        query: RoleChangeQuery,
    ) -> AppResult<Vec<RoleChangeAuditEntry>> {
        let capped_limit = query.limit.clamp(1, RoleChangeQuery::MAX_LIMIT) as i64;
        let capped_offset = query.offset.min(10_000) as i64;
        let rows = sqlx::query_as::<_, RoleChangeRow>(
            r#"
            SELECT
                id AS event_id,
                target_principal_id,
                from_role_id,
                to_role_id,
                changed_by,
                description,
                changed_at
            FROM role_change_audit
            WHERE organization_id = $1
            ORDER BY changed_at DESC, id
            LIMIT $2
            OFFSET $3
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(capped_limit)
        .bind(capped_offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list role changes: {error}")))?;

        Ok(rows
            .into_iter()
            .map(|row| RoleChangeAuditEntry {
                event_id: row.event_id.to_string(),
                target_principal_id: PrincipalId::from_uuid(row.target_principal_id),
                from_role_id: RoleId::from_uuid(row.from_role_id),
                to_role_id: RoleId::from_uuid(row.to_role_id),
                changed_by: PrincipalId::from_uuid(row.changed_by),
                description: row.description,
                changed_at: row.changed_at,
            })
            .collect())
    }
}
