use serde::{Deserialize, Serialize};

use crate::PrincipalId;

/// Trusted principal handed over by the external authentication layer.
///
/// Session or token verification happens before this value exists; holding one
/// says nothing about organization membership or permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalIdentity {
    principal_id: PrincipalId,
    email: String,
}

impl PrincipalIdentity {
    /// Creates a principal identity from verified authentication data.
    #[must_use]
    pub fn new(principal_id: PrincipalId, email: impl Into<String>) -> Self {
        Self {
            principal_id,
            email: email.into(),
        }
    }

    /// Returns the stable principal identifier.
    #[must_use]
    pub fn principal_id(&self) -> PrincipalId {
        self.principal_id
    }

    /// Returns the verified email address.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }
}
