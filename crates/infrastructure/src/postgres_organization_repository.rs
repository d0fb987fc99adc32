use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use meterline_application::OrganizationRepository;
use meterline_core::{AppError, AppResult, OrganizationId};
use meterline_domain::{Branch, BranchId, Organization};

/// PostgreSQL-backed organization and branch repository.
#[derive(Clone)]
pub struct PostgresOrganizationRepository {
    pool: PgPool,
}

impl PostgresOrganizationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct BranchRow {
    id: Uuid,
    organization_id: Uuid,
    name: Option<String>,
    city: Option<String>,
    country: Option<String>,
    currency: Option<String>,
    timezone: Option<String>,
    phone_number: Option<String>,
    is_active: bool,
}

#[async_trait]
impl OrganizationRepository for PostgresOrganizationRepository {
    async fn find_organization(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Option<Organization>> {
        let name = sqlx::query_scalar::<_, String>(
            r#"
            SELECT name
            FROM organizations
            WHERE id = $1
            "#,
        )
        .bind(organization_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to find organization '{organization_id}': {error}"
            ))
        })?;

        Ok(name.map(|name| Organization {
            id: organization_id,
            name,
        }))
    }

    async fn find_branch(&self, branch_id: BranchId) -> AppResult<Option<Branch>> {
        let row = sqlx::query_as::<_, BranchRow>(
            r#"
            SELECT
                id,
                organization_id,
                name,
                city,
                country,
                currency,
                timezone,
                phone_number,
                is_active
            FROM branches
            WHERE id = $1
            "#,
        )
        .bind(branch_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find branch '{branch_id}': {error}"))
        })?;

        Ok(row.map(|row| Branch {
            id: BranchId::from_uuid(row.id),
            organization_id: OrganizationId::from_uuid(row.organization_id),
            name: row.name,
            city: row.city,
            country: row.country,
            currency: row.currency,
            timezone: row.timezone,
            phone_number: row.phone_number,
            is_active: row.is_active,
        }))
    }
}
