use std::sync::Arc;

use meterline_core::{AppError, PrincipalId};
use meterline_domain::{Permission, RoleKey, RoleLevel};
use tokio::sync::Mutex;

use crate::authorization_guard::PermissionRequirement;
use crate::test_support::{FakeTenancyStore, resolver};

use super::AuthorizationService;

async fn seeded_service() -> (
    Arc<FakeTenancyStore>,
    AuthorizationService,
    PrincipalId,
    PrincipalId,
) {
    let store = FakeTenancyStore::seeded();
    let (organization_id, branch_id) = store.add_organization("Northwind Grid").await;
    let executive = store
        .add_member(organization_id, branch_id, RoleKey::Executive)
        .await;
    let operator = store
        .add_member(organization_id, branch_id, RoleKey::GridAdministrator)
        .await;
    let service = AuthorizationService::new(resolver(&store));

    (
        store,
        service,
        executive.principal_id(),
        operator.principal_id(),
    )
}

#[tokio::test]
async fn check_answers_from_resolved_grants() {
    let (_, service, executive, operator) = seeded_service().await;

    assert!(service.has_permission(executive, Permission::ViewAuditLog).await);
    assert!(!service.has_permission(operator, Permission::ViewAuditLog).await);
    assert!(
        !service
            .check(operator, &PermissionRequirement::RoleLevel(RoleLevel::TOP))
            .await
    );
}

#[tokio::test]
async fn check_is_false_without_context() {
    let (_, service, _, _) = seeded_service().await;

    let allowed = service
        .check(
            PrincipalId::new(),
            &PermissionRequirement::AllOf(Vec::new()),
        )
        .await;

    assert!(!allowed);
}

#[tokio::test]
async fn check_fails_closed_on_store_fault() {
    let (store, service, executive, _) = seeded_service().await;
    store.fail_reads().await;

    assert!(!service.has_permission(executive, Permission::ViewAuditLog).await);
}

#[tokio::test]
async fn require_distinguishes_unauthenticated_from_forbidden() {
    let (_, service, _, operator) = seeded_service().await;

    let anonymous = service
        .require_permission(PrincipalId::new(), Permission::ManageMeters)
        .await;
    let forbidden = service
        .require_permission(operator, Permission::ManageTariffs)
        .await;
    let granted = service
        .require_permission(operator, Permission::ManageMeters)
        .await;

    assert!(matches!(anonymous, Err(AppError::Unauthorized(_))));
    assert!(matches!(forbidden, Err(AppError::Forbidden(_))));
    assert!(granted.is_ok_and(|context| context.principal_id() == operator));
}

#[tokio::test]
async fn require_propagates_store_faults() {
    let (store, service, executive, _) = seeded_service().await;
    store.fail_reads().await;

    let result = service
        .require_permission(executive, Permission::ViewAuditLog)
        .await;

    assert!(matches!(result, Err(AppError::Internal(_))));
}

#[tokio::test]
async fn guarded_runs_operation_only_when_permitted() {
    let (_, service, executive, operator) = seeded_service().await;
    let calls = Arc::new(Mutex::new(Vec::new()));

    for principal_id in [executive, operator] {
        let calls = calls.clone();
        let _ = service
            .guarded(
                principal_id,
                PermissionRequirement::Permission(Permission::ManageOrganizationSettings),
                |context| async move {
                    calls.lock().await.push(context.principal_id());
                    Ok(())
                },
            )
            .await;
    }

    assert_eq!(*calls.lock().await, vec![executive]);
}

#[tokio::test]
async fn guarded_reports_denial_to_caller() {
    let (_, service, _, operator) = seeded_service().await;

    let result = service
        .guarded(
            operator,
            PermissionRequirement::ManageRole(RoleKey::GridAdministrator),
            |_| async { Ok("changed") },
        )
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}
