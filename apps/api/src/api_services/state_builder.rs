use std::sync::Arc;

use meterline_application::{
    AuthorizationService, ContextResolver, MembershipRepository, MembershipService,
    OnboardingService, OrganizationRepository, ProfileRepository, RoleChangeAuditRepository,
    RoleChangeLogRepository, RoleRepository,
};
use meterline_infrastructure::{
    PostgresMembershipRepository, PostgresOrganizationRepository, PostgresProfileRepository,
    PostgresRoleChangeAuditRepository, PostgresRoleRepository,
};
use sqlx::PgPool;

use crate::state::AppState;

/// Port implementations the services are wired from.
pub struct TenancyPorts {
    pub roles: Arc<dyn RoleRepository>,
    pub memberships: Arc<dyn MembershipRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub organizations: Arc<dyn OrganizationRepository>,
    pub audit_repository: Arc<dyn RoleChangeAuditRepository>,
    pub audit_log_repository: Arc<dyn RoleChangeLogRepository>,
}

impl TenancyPorts {
    pub fn postgres(pool: &PgPool) -> Self {
        let audit_repository = Arc::new(PostgresRoleChangeAuditRepository::new(pool.clone()));

        Self {
            roles: Arc::new(PostgresRoleRepository::new(pool.clone())),
            memberships: Arc::new(PostgresMembershipRepository::new(pool.clone())),
            profiles: Arc::new(PostgresProfileRepository::new(pool.clone())),
            organizations: Arc::new(PostgresOrganizationRepository::new(pool.clone())),
            audit_repository: audit_repository.clone(),
            audit_log_repository: audit_repository,
        }
    }

    #[cfg(test)]
    pub fn in_memory(store: Arc<meterline_infrastructure::InMemoryTenancyStore>) -> Self {
        Self {
            roles: store.clone(),
            memberships: store.clone(),
            profiles: store.clone(),
            organizations: store.clone(),
            audit_repository: store.clone(),
            audit_log_repository: store,
        }
    }
}

pub fn build_app_state(ports: TenancyPorts, frontend_url: String) -> AppState {
    let resolver = ContextResolver::new(
        ports.memberships.clone(),
        ports.profiles.clone(),
        ports.roles.clone(),
        ports.organizations.clone(),
    );

    let authorization_service = AuthorizationService::new(resolver);

    AppState {
        membership_service: MembershipService::new(
            authorization_service.clone(),
            ports.roles,
            ports.memberships,
            ports.audit_repository,
            ports.audit_log_repository,
        ),
        onboarding_service: OnboardingService::new(ports.profiles, ports.organizations),
        authorization_service,
        frontend_url,
    }
}
