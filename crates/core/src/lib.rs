//! Shared primitives for all Rust crates in Meterline.

#![forbid(unsafe_code)]

/// Authentication primitives shared across services.
pub mod auth;

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use auth::PrincipalIdentity;

/// Result type used across Meterline crates.
pub type AppResult<T> = Result<T, AppError>;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID value.
            #[must_use]
            pub fn from_uuid(value: Uuid) -> Self {
                Self(value)
            }

            /// Parses an identifier from its hyphenated transport form.
            pub fn parse(value: &str) -> AppResult<Self> {
                Uuid::parse_str(value.trim())
                    .map(Self)
                    .map_err(|error| {
                        AppError::Validation(format!(
                            "invalid {} '{value}': {error}",
                            stringify!($name)
                        ))
                    })
            }

            /// Returns the underlying UUID value.
            #[must_use]
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
                write!(formatter, "{}", self.0)
            }
        }
    };
}

uuid_identifier!(
    /// Organization identifier used as the partition key for every tenant-scoped resource.
    OrganizationId
);

uuid_identifier!(
    /// Stable identifier of an authenticated principal, issued by the auth provider.
    PrincipalId
);

/// Common application error categories.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// User is not authenticated or has no resolvable organization context.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but blocked by authorization policy.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::{OrganizationId, PrincipalId};

    #[test]
    fn organization_id_formats_as_uuid() {
        let organization_id = OrganizationId::new();
        assert_eq!(organization_id.to_string().len(), 36);
    }

    #[test]
    fn principal_id_parses_its_display_form() {
        let principal_id = PrincipalId::new();
        let parsed = PrincipalId::parse(principal_id.to_string().as_str());
        assert!(matches!(parsed, Ok(value) if value == principal_id));
    }

    #[test]
    fn principal_id_rejects_garbage() {
        assert!(PrincipalId::parse("not-a-uuid").is_err());
    }
}
