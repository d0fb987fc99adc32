use std::fmt::{Display, Formatter};
use std::str::FromStr;

use meterline_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Permission;

/// Stable identifier of a role row in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Creates a random role identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a role identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Stable role keys known to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKey {
    /// Top authority role with unconditional access across the organization.
    Executive,
    /// Second-tier role scoped to one branch.
    BranchManager,
    /// Third-tier operational role scoped to one branch.
    GridAdministrator,
}

impl RoleKey {
    /// Returns a stable storage value for this role key.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Executive => "executive",
            Self::BranchManager => "branch_manager",
            Self::GridAdministrator => "grid_administrator",
        }
    }

    /// Returns all known role keys.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[Self::Executive, Self::BranchManager, Self::GridAdministrator]
    }

    /// Returns whether this is the designated top-authority role.
    #[must_use]
    pub fn is_top_authority(&self) -> bool {
        matches!(self, Self::Executive)
    }

    /// Returns the display name used when seeding the registry.
    #[must_use]
    pub fn default_display_name(&self) -> &'static str {
        match self {
            Self::Executive => "Executive",
            Self::BranchManager => "Branch Manager",
            Self::GridAdministrator => "Grid Administrator",
        }
    }

    /// Returns the authority level used when seeding the registry.
    #[must_use]
    pub fn default_level(&self) -> RoleLevel {
        match self {
            Self::Executive => RoleLevel(1),
            Self::BranchManager => RoleLevel(2),
            Self::GridAdministrator => RoleLevel(3),
        }
    }

    /// Returns the permissions granted when seeding the registry.
    #[must_use]
    pub fn default_grants(&self) -> &'static [Permission] {
        match self {
            Self::Executive => Permission::all(),
            Self::BranchManager => &[
                Permission::ViewBranchDashboard,
                Permission::ManageGridAdministrators,
                Permission::ManageMeters,
                Permission::ViewMeterReadings,
                Permission::ManageTariffs,
            ],
            Self::GridAdministrator => &[
                Permission::ViewBranchDashboard,
                Permission::ManageMeters,
                Permission::ViewMeterReadings,
            ],
        }
    }

    /// Returns whether a holder of this role may manage holders of `target`.
    ///
    /// Executives manage every role. Branch managers manage grid
    /// administrators only. Every other pairing is denied.
    #[must_use]
    pub fn can_manage(&self, target: RoleKey) -> bool {
        match self {
            Self::Executive => true,
            Self::BranchManager => target == Self::GridAdministrator,
            Self::GridAdministrator => false,
        }
    }
}

impl Display for RoleKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for RoleKey {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|key| key.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown role '{value}'")))
    }
}

/// Numeric authority level. `1` is the highest authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct RoleLevel(u8);

impl RoleLevel {
    /// Highest authority level.
    pub const TOP: RoleLevel = RoleLevel(1);

    /// Creates a validated role level.
    pub fn new(value: u8) -> AppResult<Self> {
        if value == 0 {
            return Err(AppError::Validation(
                "role level must be a positive integer".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the raw level value.
    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Returns whether this level carries the same or greater authority than `required`.
    #[must_use]
    pub fn satisfies(&self, required: RoleLevel) -> bool {
        self.0 <= required.0
    }
}

impl TryFrom<u8> for RoleLevel {
    type Error = AppError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoleLevel> for u8 {
    fn from(value: RoleLevel) -> Self {
        value.0
    }
}

/// Role registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    id: RoleId,
    key: RoleKey,
    display_name: String,
    level: RoleLevel,
}

impl Role {
    /// Creates a role registry entry.
    #[must_use]
    pub fn new(id: RoleId, key: RoleKey, display_name: impl Into<String>, level: RoleLevel) -> Self {
        Self {
            id,
            key,
            display_name: display_name.into(),
            level,
        }
    }

    /// Returns the role identifier.
    #[must_use]
    pub fn id(&self) -> RoleId {
        self.id
    }

    /// Returns the stable role key.
    #[must_use]
    pub fn key(&self) -> RoleKey {
        self.key
    }

    /// Returns the human-readable name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the authority level.
    #[must_use]
    pub fn level(&self) -> RoleLevel {
        self.level
    }
}
