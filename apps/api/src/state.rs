use meterline_application::{AuthorizationService, MembershipService, OnboardingService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub authorization_service: AuthorizationService,
    pub membership_service: MembershipService,
    pub onboarding_service: OnboardingService,
    pub frontend_url: String,
}
