use meterline_core::AppError;
use thiserror::Error;
use tracing::error;

/// Business-rule rejections and normalized faults of membership workflows.
///
/// `Display` yields the reason shown to the acting principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MembershipError {
    /// The actor has no resolvable organization context.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The actor lacks the permission or authority for the operation.
    #[error("insufficient permissions")]
    InsufficientPermissions,

    /// The actor targeted their own membership for a role change.
    #[error("cannot change your own role")]
    SelfRoleChange,

    /// The actor targeted their own membership for removal.
    #[error("cannot remove yourself")]
    SelfRemoval,

    /// The requested role does not exist in the registry.
    #[error("invalid role")]
    InvalidRole,

    /// The target has no active membership in the actor's organization.
    #[error("user not found in organization")]
    MemberNotFound,

    /// Removing the target would leave the organization without an executive.
    #[error("cannot remove the last executive — promote another user first")]
    LastExecutive,

    /// Demoting the target would leave the organization without an executive.
    #[error("cannot demote the last executive — promote another user first")]
    LastExecutiveDemotion,

    /// A backing-store fault occurred; details are logged, never returned.
    #[error("an unexpected error occurred")]
    Unexpected,
}

impl MembershipError {
    /// Logs a backing-store fault and normalizes it for the caller.
    pub(crate) fn unexpected(operation: &'static str, fault: &AppError) -> Self {
        error!(operation, %fault, "membership workflow failed on a backing-store fault");
        Self::Unexpected
    }
}

impl From<MembershipError> for AppError {
    fn from(value: MembershipError) -> Self {
        let reason = value.to_string();
        match value {
            MembershipError::NotAuthenticated => Self::Unauthorized(reason),
            MembershipError::InsufficientPermissions => Self::Forbidden(reason),
            MembershipError::SelfRoleChange
            | MembershipError::SelfRemoval
            | MembershipError::InvalidRole => Self::Validation(reason),
            MembershipError::MemberNotFound => Self::NotFound(reason),
            MembershipError::LastExecutive | MembershipError::LastExecutiveDemotion => {
                Self::Conflict(reason)
            }
            MembershipError::Unexpected => Self::Internal(reason),
        }
    }
}
