use sqlx::{PgPool, Postgres, Transaction};
use tracing::warn;
use uuid::Uuid;

use meterline_application::{GuardedMutation, LastHolderGuard, MemberRemoval, RoleUpdate};
use meterline_core::{AppError, AppResult, OrganizationId, PrincipalId};
use meterline_domain::Membership;

use super::MembershipRow;

pub(super) async fn update_member_role(
    pool: &PgPool,
    input: RoleUpdate,
) -> AppResult<GuardedMutation<Membership>> {
    let mut transaction = pool
        .begin()
        .await
        .map_err(|error| AppError::Internal(format!("failed to begin transaction: {error}")))?;

    lock_organizations(&mut transaction, input.organization_id, &[]).await?;
    let target =
        lock_target_membership(&mut transaction, input.organization_id, input.principal_id)
            .await?;

    if let Some(guard) = input.guard {
        let loses_role =
            target.role_id == guard.role_id.as_uuid() && input.role_id != guard.role_id;
        if loses_role
            && !other_holder_remains(&mut transaction, input.organization_id, guard).await?
        {
            warn!(
                organization_id = %input.organization_id,
                principal_id = %input.principal_id,
                "role update blocked by last-holder guard"
            );
            return Ok(GuardedMutation::LastHolderBlocked);
        }
    }

    let row = sqlx::query_as::<_, MembershipRow>(
        r#"
        UPDATE organization_members
        SET role_id = $3, updated_at = now()
        WHERE organization_id = $1
            AND principal_id = $2
            AND status = 'active'
        RETURNING
            principal_id,
            organization_id,
            branch_id,
            role_id,
            status,
            created_at,
            updated_at
        "#,
    )
    .bind(input.organization_id.as_uuid())
    .bind(input.principal_id.as_uuid())
    .bind(input.role_id.as_uuid())
    .fetch_one(&mut *transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to update member role: {error}")))?;

    sqlx::query(
        r#"
        UPDATE profiles
        SET role_id = $2, updated_at = now()
        WHERE principal_id = $1
            AND organization_id = $3
        "#,
    )
    .bind(input.principal_id.as_uuid())
    .bind(input.role_id.as_uuid())
    .bind(input.organization_id.as_uuid())
    .execute(&mut *transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to update profile role: {error}")))?;

    transaction
        .commit()
        .await
        .map_err(|error| AppError::Internal(format!("failed to commit transaction: {error}")))?;

    row.into_membership().map(GuardedMutation::Applied)
}

pub(super) async fn soft_delete_member(
    pool: &PgPool,
    input: MemberRemoval,
) -> AppResult<GuardedMutation<()>> {
    let mut transaction = pool
        .begin()
        .await
        .map_err(|error| AppError::Internal(format!("failed to begin transaction: {error}")))?;

    let guarded = match input.guard {
        Some(guard) => held_organizations(&mut transaction, input.principal_id, guard).await?,
        None => Vec::new(),
    };
    lock_organizations(&mut transaction, input.organization_id, &guarded).await?;
    lock_target_membership(&mut transaction, input.organization_id, input.principal_id).await?;

    if let Some(guard) = input.guard {
        for organization_id in
            held_organizations(&mut transaction, input.principal_id, guard).await?
        {
            if !other_holder_remains(&mut transaction, organization_id, guard).await? {
                warn!(
                    %organization_id,
                    principal_id = %input.principal_id,
                    "member removal blocked by last-holder guard"
                );
                return Ok(GuardedMutation::LastHolderBlocked);
            }
        }
    }

    sqlx::query(
        r#"
        UPDATE profiles
        SET deleted_at = now(), deleted_by = $2, updated_at = now()
        WHERE principal_id = $1
            AND deleted_at IS NULL
        "#,
    )
    .bind(input.principal_id.as_uuid())
    .bind(input.removed_by.as_uuid())
    .execute(&mut *transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to soft-delete profile: {error}")))?;

    transaction
        .commit()
        .await
        .map_err(|error| AppError::Internal(format!("failed to commit transaction: {error}")))?;

    Ok(GuardedMutation::Applied(()))
}

/// Serializes guarded mutations of the given organizations across processes.
///
/// Rows are locked in id order. Later statements in the transaction take their
/// snapshot after the locks are granted, so they observe every mutation
/// committed before them.
async fn lock_organizations(
    transaction: &mut Transaction<'_, Postgres>,
    organization_id: OrganizationId,
    others: &[OrganizationId],
) -> AppResult<()> {
    let ids: Vec<Uuid> = std::iter::once(organization_id)
        .chain(others.iter().copied())
        .map(|id| id.as_uuid())
        .collect();

    let locked = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT id
        FROM organizations
        WHERE id = ANY($1)
        ORDER BY id
        FOR UPDATE
        "#,
    )
    .bind(ids.as_slice())
    .fetch_all(&mut **transaction)
    .await
    .map_err(|error| {
        AppError::Internal(format!(
            "failed to lock organization '{organization_id}': {error}"
        ))
    })?;

    if !locked.contains(&organization_id.as_uuid()) {
        return Err(AppError::NotFound(format!(
            "organization '{organization_id}' not found"
        )));
    }

    Ok(())
}

/// Organizations in which the principal actively holds the guarded role.
async fn held_organizations(
    transaction: &mut Transaction<'_, Postgres>,
    principal_id: PrincipalId,
    guard: LastHolderGuard,
) -> AppResult<Vec<OrganizationId>> {
    let ids = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT members.organization_id
        FROM organization_members members
        JOIN profiles ON profiles.principal_id = members.principal_id
        WHERE members.principal_id = $1
            AND members.role_id = $2
            AND members.status = 'active'
            AND profiles.deleted_at IS NULL
        ORDER BY members.organization_id
        "#,
    )
    .bind(principal_id.as_uuid())
    .bind(guard.role_id.as_uuid())
    .fetch_all(&mut **transaction)
    .await
    .map_err(|error| {
        AppError::Internal(format!(
            "failed to list organizations held by '{principal_id}': {error}"
        ))
    })?;

    Ok(ids.into_iter().map(OrganizationId::from_uuid).collect())
}

async fn lock_target_membership(
    transaction: &mut Transaction<'_, Postgres>,
    organization_id: OrganizationId,
    principal_id: PrincipalId,
) -> AppResult<MembershipRow> {
    sqlx::query_as::<_, MembershipRow>(
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
        FOR UPDATE
        "#,
    )
    .bind(organization_id.as_uuid())
    .bind(principal_id.as_uuid())
    .fetch_optional(&mut **transaction)
    .await
    .map_err(|error| {
        AppError::Internal(format!(
            "failed to lock membership of principal '{principal_id}': {error}"
        ))
    })?
    .ok_or_else(|| {
        AppError::NotFound(format!(
            "principal '{principal_id}' has no active membership in organization '{organization_id}'"
        ))
    })
}

async fn other_holder_remains(
    transaction: &mut Transaction<'_, Postgres>,
    organization_id: OrganizationId,
    guard: LastHolderGuard,
) -> AppResult<bool> {
    let holders = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT members.principal_id
        FROM organization_members members
        JOIN profiles ON profiles.principal_id = members.principal_id
        WHERE members.organization_id = $1
            AND members.role_id = $2
            AND members.status = 'active'
            AND profiles.deleted_at IS NULL
        FOR UPDATE
        "#,
    )
    .bind(organization_id.as_uuid())
    .bind(guard.role_id.as_uuid())
    .fetch_all(&mut **transaction)
    .await
    .map_err(|error| {
        AppError::Internal(format!(
            "failed to lock holders of role '{}': {error}",
            guard.role_id
        ))
    })?;

    Ok(holders.len() > 1)
}
