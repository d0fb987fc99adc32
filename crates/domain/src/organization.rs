use std::fmt::{Display, Formatter};

use meterline_core::{AppError, AppResult, OrganizationId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a branch inside one organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchId(Uuid);

impl BranchId {
    /// Creates a random branch identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a branch identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Parses a branch identifier from its transport form.
    pub fn parse(value: &str) -> AppResult<Self> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|error| AppError::Validation(format!("invalid branch id '{value}': {error}")))
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for BranchId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for BranchId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Tenant organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Organization identifier.
    pub id: OrganizationId,
    /// Display name.
    pub name: String,
}

/// Physical site owned by exactly one organization.
///
/// Descriptive fields stay optional because onboarding fills them in
/// progressively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// Branch identifier.
    pub id: BranchId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Branch name.
    pub name: Option<String>,
    /// City the branch operates in.
    pub city: Option<String>,
    /// Country the branch operates in.
    pub country: Option<String>,
    /// ISO currency code used for tariffs.
    pub currency: Option<String>,
    /// IANA timezone name.
    pub timezone: Option<String>,
    /// Contact phone number.
    pub phone_number: Option<String>,
    /// Whether the branch is active.
    pub is_active: bool,
}

impl Branch {
    /// Returns whether the branch belongs to `organization_id`.
    #[must_use]
    pub fn belongs_to(&self, organization_id: OrganizationId) -> bool {
        self.organization_id == organization_id
    }

    /// Returns whether the branch name is populated.
    #[must_use]
    pub fn has_name(&self) -> bool {
        is_filled(self.name.as_deref())
    }

    /// Returns whether the branch city is populated.
    #[must_use]
    pub fn has_city(&self) -> bool {
        is_filled(self.city.as_deref())
    }

    /// Returns whether the branch country is populated.
    #[must_use]
    pub fn has_country(&self) -> bool {
        is_filled(self.country.as_deref())
    }
}

/// Returns whether an optional text field holds a non-blank value.
pub(crate) fn is_filled(value: Option<&str>) -> bool {
    value.is_some_and(|value| !value.trim().is_empty())
}
