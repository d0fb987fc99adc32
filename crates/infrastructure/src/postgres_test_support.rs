use chrono::Utc;
use meterline_core::{OrganizationId, PrincipalId};
use meterline_domain::{BranchId, RoleKey};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Connects to `DATABASE_URL` and applies migrations, or returns `None` when unset.
pub(crate) async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(4)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres tests: {error}");
    }

    Some(pool)
}

pub(crate) async fn seed_organization(pool: &PgPool, name: &str) -> (OrganizationId, BranchId) {
    let organization_id = OrganizationId::new();
    let branch_id = BranchId::new();

    let organization = sqlx::query("INSERT INTO organizations (id, name) VALUES ($1, $2)")
        .bind(organization_id.as_uuid())
        .bind(name)
        .execute(pool)
        .await;
    assert!(organization.is_ok());

    let branch = sqlx::query(
        r#"
        INSERT INTO branches (id, organization_id, name, city, country)
        VALUES ($1, $2, 'Harbour Substation', 'Aarhus', 'Denmark')
        "#,
    )
    .bind(branch_id.as_uuid())
    .bind(organization_id.as_uuid())
    .execute(pool)
    .await;
    assert!(branch.is_ok());

    (organization_id, branch_id)
}

pub(crate) async fn seed_member(
    pool: &PgPool,
    organization_id: OrganizationId,
    branch_id: BranchId,
    key: RoleKey,
) -> PrincipalId {
    let principal_id = PrincipalId::new();
    let role_id = role_id(pool, key).await;

    let profile = sqlx::query(
        r#"
        INSERT INTO profiles (principal_id, email, full_name, role_id, organization_id, branch_id)
        VALUES ($1, $2, 'Test Member', $3, $4, $5)
        "#,
    )
    .bind(principal_id.as_uuid())
    .bind(format!("{principal_id}@meterline.test"))
    .bind(role_id)
    .bind(organization_id.as_uuid())
    .bind(branch_id.as_uuid())
    .execute(pool)
    .await;
    assert!(profile.is_ok());

    seed_membership(pool, principal_id, organization_id, branch_id, key).await;

    principal_id
}

/// Adds an active membership for an already seeded principal.
pub(crate) async fn seed_membership(
    pool: &PgPool,
    principal_id: PrincipalId,
    organization_id: OrganizationId,
    branch_id: BranchId,
    key: RoleKey,
) {
    let role_id = role_id(pool, key).await;
    let membership = sqlx::query(
        r#"
        INSERT INTO organization_members (
            principal_id,
            organization_id,
            branch_id,
            role_id,
            status,
            created_at
        )
        VALUES ($1, $2, $3, $4, 'active', $5)
        "#,
    )
    .bind(principal_id.as_uuid())
    .bind(organization_id.as_uuid())
    .bind(branch_id.as_uuid())
    .bind(role_id)
    .bind(Utc::now())
    .execute(pool)
    .await;
    assert!(membership.is_ok());
}

async fn role_id(pool: &PgPool, key: RoleKey) -> uuid::Uuid {
    let role_id = sqlx::query_scalar::<_, uuid::Uuid>("SELECT id FROM roles WHERE key = $1")
        .bind(key.as_str())
        .fetch_one(pool)
        .await;
    let Ok(role_id) = role_id else {
        panic!("role {key} should be seeded by migrations");
    };

    role_id
}
