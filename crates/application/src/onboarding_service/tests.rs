use std::sync::Arc;

use chrono::Utc;
use meterline_core::{AppError, OrganizationId, PrincipalId};
use meterline_domain::{BranchId, Profile, RoleKey};

use crate::test_support::{FakeTenancyStore, complete_branch};

use super::{MissingField, OnboardingService};

fn build_service(store: &Arc<FakeTenancyStore>) -> OnboardingService {
    OnboardingService::new(store.clone(), store.clone())
}

#[tokio::test]
async fn onboarded_member_is_complete() {
    let store = FakeTenancyStore::seeded();
    let (organization_id, branch_id) = store.add_organization("Northwind Grid").await;
    let member = store
        .add_member(organization_id, branch_id, RoleKey::Executive)
        .await;

    let report = build_service(&store)
        .check_completeness(member.principal_id())
        .await;

    let Ok(report) = report else {
        panic!("check should succeed: {report:?}");
    };
    assert!(report.is_complete);
    assert!(report.missing_fields.is_empty());
    assert_eq!(
        report.organization.map(|organization| organization.id),
        Some(organization_id)
    );
    assert_eq!(report.branch.map(|branch| branch.id), Some(branch_id));
}

#[tokio::test]
async fn missing_profile_stops_the_walk() {
    let store = FakeTenancyStore::seeded();

    let report = build_service(&store)
        .check_completeness(PrincipalId::new())
        .await;

    assert!(report.is_ok_and(|report| !report.is_complete
        && report.missing_fields == vec![MissingField::Profile]
        && report.profile.is_none()));
}

#[tokio::test]
async fn deleted_profile_counts_as_missing() {
    let store = FakeTenancyStore::seeded();
    let principal_id = PrincipalId::new();
    let mut profile = Profile::new(principal_id, "gone@meterline.test");
    profile.deleted_at = Some(Utc::now());
    store.insert_profile(profile).await;

    let report = build_service(&store).check_completeness(principal_id).await;

    assert!(report.is_ok_and(|report| report.missing_fields == vec![MissingField::Profile]));
}

#[tokio::test]
async fn fresh_profile_reports_every_gap_up_to_organization() {
    let store = FakeTenancyStore::seeded();
    let principal_id = PrincipalId::new();
    store
        .insert_profile(Profile::new(principal_id, "new@meterline.test"))
        .await;

    let report = build_service(&store).check_completeness(principal_id).await;

    let Ok(report) = report else {
        panic!("check should succeed: {report:?}");
    };
    assert_eq!(
        report.missing_fields,
        vec![
            MissingField::FullName,
            MissingField::Role,
            MissingField::Organization
        ]
    );
    assert!(report.profile.is_some());
    assert!(report.organization.is_none());
    assert!(report.branch.is_none());
}

#[tokio::test]
async fn missing_organization_skips_branch_lookup() {
    let store = FakeTenancyStore::seeded();
    let (_, branch_id) = store.add_organization("Northwind Grid").await;
    let principal_id = PrincipalId::new();
    let mut profile = Profile::new(principal_id, "orphan@meterline.test");
    profile.full_name = Some("Ada Orphan".to_owned());
    profile.role_id = Some(store.role(RoleKey::GridAdministrator).await.id());
    profile.branch_id = Some(branch_id);
    store.insert_profile(profile).await;

    let report = build_service(&store).check_completeness(principal_id).await;

    let Ok(report) = report else {
        panic!("check should succeed: {report:?}");
    };
    assert_eq!(report.missing_fields, vec![MissingField::Organization]);
    assert!(report.organization.is_none());
    assert!(report.branch.is_none());
}

#[tokio::test]
async fn unresolvable_organization_is_missing() {
    let store = FakeTenancyStore::seeded();
    let principal_id = PrincipalId::new();
    let mut profile = Profile::new(principal_id, "lost@meterline.test");
    profile.full_name = Some("Lost Member".to_owned());
    profile.role_id = Some(store.role(RoleKey::GridAdministrator).await.id());
    profile.organization_id = Some(OrganizationId::new());
    store.insert_profile(profile).await;

    let report = build_service(&store).check_completeness(principal_id).await;

    assert!(report.is_ok_and(|report| report.missing_fields == vec![MissingField::Organization]));
}

#[tokio::test]
async fn branch_of_another_organization_is_missing() {
    let store = FakeTenancyStore::seeded();
    let (organization_id, _) = store.add_organization("Northwind Grid").await;
    let (_, foreign_branch_id) = store.add_organization("Southgate Power").await;
    let member = store
        .add_member(organization_id, foreign_branch_id, RoleKey::BranchManager)
        .await;

    let report = build_service(&store)
        .check_completeness(member.principal_id())
        .await;

    let Ok(report) = report else {
        panic!("check should succeed: {report:?}");
    };
    assert_eq!(report.missing_fields, vec![MissingField::Branch]);
    assert!(report.organization.is_some());
    assert!(report.branch.is_none());
}

#[tokio::test]
async fn unknown_branch_is_missing() {
    let store = FakeTenancyStore::seeded();
    let (organization_id, _) = store.add_organization("Northwind Grid").await;
    let member = store
        .add_member(organization_id, BranchId::new(), RoleKey::BranchManager)
        .await;

    let report = build_service(&store)
        .check_completeness(member.principal_id())
        .await;

    assert!(report.is_ok_and(|report| report.missing_fields == vec![MissingField::Branch]));
}

#[tokio::test]
async fn blank_branch_attributes_are_reported() {
    let store = FakeTenancyStore::seeded();
    let (organization_id, _) = store.add_organization("Northwind Grid").await;
    let mut branch = complete_branch(organization_id);
    branch.name = Some("   ".to_owned());
    branch.country = None;
    let branch_id = branch.id;
    store.insert_branch(branch).await;
    let member = store
        .add_member(organization_id, branch_id, RoleKey::BranchManager)
        .await;

    let report = build_service(&store)
        .check_completeness(member.principal_id())
        .await;

    let Ok(report) = report else {
        panic!("check should succeed: {report:?}");
    };
    assert!(!report.is_complete);
    assert_eq!(
        report.missing_fields,
        vec![MissingField::BranchName, MissingField::BranchCountry]
    );
    assert!(report.branch.is_some());
}

#[tokio::test]
async fn store_faults_propagate() {
    let store = FakeTenancyStore::seeded();
    store.fail_reads().await;

    let report = build_service(&store)
        .check_completeness(PrincipalId::new())
        .await;

    assert!(matches!(report, Err(AppError::Internal(_))));
}

#[test]
fn missing_field_keys_are_stable() {
    assert_eq!(MissingField::FullName.as_str(), "full_name");
    assert_eq!(MissingField::BranchCountry.to_string(), "branch_country");
}
