use std::future::Future;

use meterline_core::{AppResult, PrincipalId};
use meterline_domain::{Permission, UserContext};
use tracing::{debug, error};

use crate::ContextResolver;
use crate::authorization_guard::{self, PermissionRequirement};

/// Application service for organization-scoped authorization checks.
///
/// Each call resolves the principal's context once. Handlers running several
/// checks should call [`AuthorizationService::resolve_context`] and use the
/// pure guard functions on the result instead.
#[derive(Clone)]
pub struct AuthorizationService {
    resolver: ContextResolver,
}

impl AuthorizationService {
    /// Creates a new authorization service from a context resolver.
    #[must_use]
    pub fn new(resolver: ContextResolver) -> Self {
        Self { resolver }
    }

    /// Resolves the current context for a principal.
    pub async fn resolve_context(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<Option<UserContext>> {
        self.resolver.resolve(principal_id).await
    }

    /// Returns whether the principal currently satisfies `requirement`.
    ///
    /// Store faults are logged and answered with `false`.
    pub async fn check(
        &self,
        principal_id: PrincipalId,
        requirement: &PermissionRequirement,
    ) -> bool {
        match self.resolver.resolve(principal_id).await {
            Ok(context) => context.is_some_and(|context| requirement.is_satisfied_by(&context)),
            Err(fault) => {
                error!(
                    %principal_id,
                    %fault,
                    "context resolution failed during authorization check"
                );
                false
            }
        }
    }

    /// Returns whether the principal currently holds `permission`.
    pub async fn has_permission(&self, principal_id: PrincipalId, permission: Permission) -> bool {
        self.check(principal_id, &PermissionRequirement::Permission(permission))
            .await
    }

    /// Ensures the principal satisfies `requirement` and returns its context.
    pub async fn require(
        &self,
        principal_id: PrincipalId,
        requirement: &PermissionRequirement,
    ) -> AppResult<UserContext> {
        match self.resolver.resolve(principal_id).await? {
            Some(context) if requirement.is_satisfied_by(&context) => Ok(context),
            context => {
                let denied = authorization_guard::denial(context.as_ref(), requirement);
                debug!(%principal_id, %denied, "authorization denied");
                Err(denied)
            }
        }
    }

    /// Ensures the principal holds `permission`.
    pub async fn require_permission(
        &self,
        principal_id: PrincipalId,
        permission: Permission,
    ) -> AppResult<UserContext> {
        self.require(principal_id, &PermissionRequirement::Permission(permission))
            .await
    }

    /// Runs `operation` with the resolved context once `requirement` holds.
    ///
    /// The operation never starts when resolution fails or the requirement is
    /// not met.
    pub async fn guarded<T, F, Fut>(
        &self,
        principal_id: PrincipalId,
        requirement: PermissionRequirement,
        operation: F,
    ) -> AppResult<T>
    where
        F: FnOnce(UserContext) -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let context = self.require(principal_id, &requirement).await?;
        operation(context).await
    }
}

#[cfg(test)]
mod tests;
