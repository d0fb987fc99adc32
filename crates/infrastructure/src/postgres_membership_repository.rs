use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use meterline_application::{
    GuardedMutation, MemberRecord, MemberRemoval, MembershipRepository, RoleUpdate,
};
use meterline_core::{AppError, AppResult, OrganizationId, PrincipalId};
use meterline_domain::{BranchId, Membership, MembershipStatus, RoleId};

mod guarded;

/// PostgreSQL-backed organization membership repository.
///
/// A membership counts as active only while its status is `active` and the
/// member's profile has not been soft-deleted.
#[derive(Clone)]
pub struct PostgresMembershipRepository {
    pool: PgPool,
}

impl PostgresMembershipRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct MembershipRow {
    principal_id: Uuid,
    organization_id: Uuid,
    branch_id: Option<Uuid>,
    role_id: Uuid,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MembershipRow {
    fn into_membership(self) -> AppResult<Membership> {
        let status = MembershipStatus::from_str(self.status.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "membership of principal '{}' has invalid status: {error}",
                self.principal_id
            ))
        })?;

        Ok(Membership {
            principal_id: PrincipalId::from_uuid(self.principal_id),
            organization_id: OrganizationId::from_uuid(self.organization_id),
            branch_id: self.branch_id.map(BranchId::from_uuid),
            role_id: RoleId::from_uuid(self.role_id),
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct MemberRow {
    #[sqlx(flatten)]
    membership: MembershipRow,
    email: String,
    full_name: Option<String>,
}

#[async_trait]
impl MembershipRepository for PostgresMembershipRepository {
    async fn list_active_memberships_for_principal(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Vec<Membership>> {
        let rows = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT
                members.principal_id,
                members.organization_id,
                members.branch_id,
                members.role_id,
                members.status,
                members.created_at,
                members.updated_at
            FROM organization_members members
            JOIN profiles ON profiles.principal_id = members.principal_id
            WHERE members.principal_id = $1
                AND members.status = 'active'
                AND profiles.deleted_at IS NULL
            ORDER BY members.created_at
            "#,
        )
        .bind(principal_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list memberships for principal '{principal_id}': {error}"
            ))
        })?;

        rows.into_iter()
            .map(MembershipRow::into_membership)
            .collect()
    }

    async fn find_active_membership(
        &self,
        organization_id: OrganizationId,
        principal_id: PrincipalId,
    ) -> AppResult<Option<Membership>> {
        let row = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT
                members.principal_id,
                members.organization_id,
                members.branch_id,
                members.role_id,
                members.status,
                members.created_at,
                members.updated_at
            FROM organization_members members
            JOIN profiles ON profiles.principal_id = members.principal_id
            WHERE members.organization_id = $1
                AND members.principal_id = $2
                AND members.status = 'active'
                AND profiles.deleted_at IS NULL
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(principal_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to find membership of principal '{principal_id}' in organization '{organization_id}': {error}"
            ))
        })?;

        row.map(MembershipRow::into_membership).transpose()
    }

    async fn list_active_members(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<MemberRecord>> {
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT
                members.principal_id,
                members.organization_id,
                members.branch_id,
                members.role_id,
                members.status,
                members.created_at,
                members.updated_at,
                profiles.email,
                profiles.full_name
            FROM organization_members members
            JOIN profiles ON profiles.principal_id = members.principal_id
            WHERE members.organization_id = $1
                AND members.status = 'active'
                AND profiles.deleted_at IS NULL
            ORDER BY profiles.email
            "#,
        )
        .bind(organization_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list members of organization '{organization_id}': {error}"
            ))
        })?;

        rows.into_iter()
            .map(|row| {
                Ok(MemberRecord {
                    membership: row.membership.into_membership()?,
                    email: row.email,
                    full_name: row.full_name,
                })
            })
            .collect()
    }

    async fn count_active_role_holders(
        &self,
        organization_id: OrganizationId,
        role_id: RoleId,
    ) -> AppResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM organization_members members
            JOIN profiles ON profiles.principal_id = members.principal_id
            WHERE members.organization_id = $1
                AND members.role_id = $2
                AND members.status = 'active'
                AND profiles.deleted_at IS NULL
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(role_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to count holders of role '{role_id}' in organization '{organization_id}': {error}"
            ))
        })?;

        u64::try_from(count)
            .map_err(|_| AppError::Internal(format!("holder count {count} is negative")))
    }

    async fn update_member_role(
        &self,
        input: RoleUpdate,
    ) -> AppResult<GuardedMutation<Membership>> {
        guarded::update_member_role(&self.pool, input).await
    }

    async fn soft_delete_member(&self, input: MemberRemoval) -> AppResult<GuardedMutation<()>> {
        guarded::soft_delete_member(&self.pool, input).await
    }
}
