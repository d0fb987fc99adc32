//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_tenancy_store;
mod postgres_membership_repository;
mod postgres_organization_repository;
mod postgres_profile_repository;
mod postgres_role_change_audit_repository;
mod postgres_role_repository;

#[cfg(test)]
mod postgres_test_support;

pub use in_memory_tenancy_store::InMemoryTenancyStore;
pub use postgres_membership_repository::PostgresMembershipRepository;
pub use postgres_organization_repository::PostgresOrganizationRepository;
pub use postgres_profile_repository::PostgresProfileRepository;
pub use postgres_role_change_audit_repository::PostgresRoleChangeAuditRepository;
pub use postgres_role_repository::PostgresRoleRepository;
