use std::fmt::{Display, Formatter};
use std::sync::Arc;

use meterline_core::{AppResult, PrincipalId};
use meterline_domain::{Branch, Organization, Profile};
use tracing::debug;

use crate::{OrganizationRepository, ProfileRepository};

/// Onboarding gap reported by the completeness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MissingField {
    /// No live profile exists for the principal.
    Profile,
    /// The profile has no full name.
    FullName,
    /// The profile has no role.
    Role,
    /// The profile has no resolvable organization.
    Organization,
    /// The profile has no branch resolvable inside its organization.
    Branch,
    /// The branch has no name.
    BranchName,
    /// The branch has no city.
    BranchCity,
    /// The branch has no country.
    BranchCountry,
}

impl MissingField {
    /// Returns the stable key reported to clients.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::FullName => "full_name",
            Self::Role => "role",
            Self::Organization => "organization",
            Self::Branch => "branch",
            Self::BranchName => "branch_name",
            Self::BranchCity => "branch_city",
            Self::BranchCountry => "branch_country",
        }
    }
}

impl Display for MissingField {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Result of the onboarding completeness check.
///
/// Carries whatever was resolved before the first blocking gap so clients can
/// resume onboarding where it stopped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompletenessReport {
    /// Whether no gap was found.
    pub is_complete: bool,
    /// Gaps in walk order.
    pub missing_fields: Vec<MissingField>,
    /// Live profile, when one exists.
    pub profile: Option<Profile>,
    /// Resolved organization.
    pub organization: Option<Organization>,
    /// Resolved branch.
    pub branch: Option<Branch>,
}

impl CompletenessReport {
    fn finish(mut self) -> Self {
        self.is_complete = self.missing_fields.is_empty();
        self
    }

    fn blocked(mut self, field: MissingField) -> Self {
        self.missing_fields.push(field);
        self.finish()
    }
}

/// Read-only diagnostic over a principal's onboarding progress.
#[derive(Clone)]
pub struct OnboardingService {
    profiles: Arc<dyn ProfileRepository>,
    organizations: Arc<dyn OrganizationRepository>,
}

impl OnboardingService {
    /// Creates a new onboarding service from required dependencies.
    #[must_use]
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        organizations: Arc<dyn OrganizationRepository>,
    ) -> Self {
        Self {
            profiles,
            organizations,
        }
    }

    /// Walks the onboarding chain and reports every gap up to the first
    /// blocking one.
    ///
    /// A missing profile, organization or branch stops the walk because the
    /// later checks have nothing to inspect.
    pub async fn check_completeness(
        &self,
        principal_id: PrincipalId,
    ) -> AppResult<CompletenessReport> {
        let mut report = CompletenessReport::default();

        let profile = self
            .profiles
            .find_profile(principal_id)
            .await?
            .filter(|profile| !profile.is_deleted());
        let Some(profile) = profile else {
            debug!(%principal_id, "onboarding blocked on missing profile");
            return Ok(report.blocked(MissingField::Profile));
        };

        if !profile.has_full_name() {
            report.missing_fields.push(MissingField::FullName);
        }
        if profile.role_id.is_none() {
            report.missing_fields.push(MissingField::Role);
        }

        let organization_id = profile.organization_id;
        let branch_id = profile.branch_id;
        report.profile = Some(profile);

        let Some(organization_id) = organization_id else {
            return Ok(report.blocked(MissingField::Organization));
        };
        let Some(organization) = self.organizations.find_organization(organization_id).await?
        else {
            debug!(%principal_id, %organization_id, "onboarding organization does not resolve");
            return Ok(report.blocked(MissingField::Organization));
        };
        report.organization = Some(organization);

        let Some(branch_id) = branch_id else {
            return Ok(report.blocked(MissingField::Branch));
        };
        let branch = self
            .organizations
            .find_branch(branch_id)
            .await?
            .filter(|branch| branch.belongs_to(organization_id));
        let Some(branch) = branch else {
            debug!(%principal_id, %branch_id, "onboarding branch does not resolve");
            return Ok(report.blocked(MissingField::Branch));
        };

        if !branch.has_name() {
            report.missing_fields.push(MissingField::BranchName);
        }
        if !branch.has_city() {
            report.missing_fields.push(MissingField::BranchCity);
        }
        if !branch.has_country() {
            report.missing_fields.push(MissingField::BranchCountry);
        }
        report.branch = Some(branch);

        Ok(report.finish())
    }
}

#[cfg(test)]
mod tests;
