// Session/access gate
//
// Two independent state machines decide which screens are reachable:
//
//   AuthState:    Unknown -> { Authenticated, Unauthenticated }
//   PaymentState: Unknown -> { Paid, Unpaid }
//
// Until the load probe resolves, no route renders. Every probe failure takes
// the negative branch: the gate fails closed, never open. The transitions
// here are pure; the async probing lives with the caller so the machine can
// be tested without a network.

use crate::api::ApiError;

/// Authentication status as seen by the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Unknown,
    Authenticated,
    Unauthenticated,
}

/// Payment status as seen by the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentState {
    #[default]
    Unknown,
    Paid,
    Unpaid,
}

/// Navigable screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Landing,
    CardPayment,
    PaymentSuccess,
    AddSources,
    Dashboard,
    SentimentAnalysis,
    FeatureIdentification,
    CompetitorAnalysis,
}

impl Route {
    /// Protected routes require a live session
    pub fn is_protected(&self) -> bool {
        matches!(
            self,
            Route::AddSources
                | Route::Dashboard
                | Route::SentimentAnalysis
                | Route::FeatureIdentification
                | Route::CompetitorAnalysis
        )
    }

    /// Routes additionally gated on completed payment
    pub fn requires_payment(&self) -> bool {
        self.is_protected()
    }

    /// Display name for the title bar
    pub fn title(&self) -> &'static str {
        match self {
            Route::Landing => "Welcome",
            Route::CardPayment => "Card Payment",
            Route::PaymentSuccess => "Payment Complete",
            Route::AddSources => "Add Sources",
            Route::Dashboard => "Dashboard",
            Route::SentimentAnalysis => "Sentiment Analysis",
            Route::FeatureIdentification => "Feature Identification",
            Route::CompetitorAnalysis => "Competitor Analysis",
        }
    }
}

/// Outcome of asking the gate whether a route may render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Mount the requested route
    Allow,
    /// Session missing: render landing instead; the protected view is never
    /// mounted and its fetch never fires
    RedirectLanding,
    /// Session live but payment incomplete: collect payment first
    RedirectPayment,
}

/// The gate itself: current auth and payment state plus the transitions
#[derive(Debug, Default)]
pub struct SessionGate {
    auth: AuthState,
    payment: PaymentState,
}

impl SessionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gate that is already open (demo mode)
    pub fn open() -> Self {
        Self {
            auth: AuthState::Authenticated,
            payment: PaymentState::Paid,
        }
    }

    pub fn auth(&self) -> AuthState {
        self.auth
    }

    pub fn payment(&self) -> PaymentState {
        self.payment
    }

    /// Whether the load probe has resolved; the UI stays behind a full-page
    /// loading indicator until it has
    pub fn is_resolved(&self) -> bool {
        self.auth != AuthState::Unknown
    }

    /// Apply the result of the auth-status probe. Any error, connectivity
    /// included, resolves to Unauthenticated.
    pub fn resolve_auth(&mut self, probe: Result<(), ApiError>) {
        self.auth = match probe {
            Ok(()) => AuthState::Authenticated,
            Err(e) => {
                tracing::debug!("Auth probe negative: {}", e);
                AuthState::Unauthenticated
            }
        };
    }

    /// Apply the result of the payment-status probe, failing closed
    pub fn resolve_payment(&mut self, probe: Result<bool, ApiError>) {
        self.payment = match probe {
            Ok(true) => PaymentState::Paid,
            Ok(false) => PaymentState::Unpaid,
            Err(e) => {
                tracing::debug!("Payment probe negative: {}", e);
                PaymentState::Unpaid
            }
        };
    }

    /// Mark the session authenticated after a successful sign-in
    pub fn record_login(&mut self) {
        self.auth = AuthState::Authenticated;
    }

    /// Latch payment as complete after a successful submission
    pub fn record_payment(&mut self) {
        self.payment = PaymentState::Paid;
    }

    /// Decide whether a route may render right now
    pub fn admit(&self, route: Route) -> Admission {
        if route.is_protected() && self.auth != AuthState::Authenticated {
            return Admission::RedirectLanding;
        }
        if route.requires_payment() && self.payment != PaymentState::Paid {
            return Admission::RedirectPayment;
        }
        Admission::Allow
    }

    /// Where a fresh sign-in lands: app selection when paid, payment
    /// collection otherwise (including when payment status is unknown)
    pub fn destination_after_login(&self) -> Route {
        match self.payment {
            PaymentState::Paid => Route::AddSources,
            _ => Route::CardPayment,
        }
    }

    /// Drop the session: called on logout, after the caller has cleared the
    /// persisted selection and payment flags
    pub fn logout(&mut self) {
        self.auth = AuthState::Unauthenticated;
        self.payment = PaymentState::Unknown;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network_err() -> ApiError {
        ApiError::Network("connection refused".into())
    }

    #[test]
    fn gate_starts_unresolved() {
        let gate = SessionGate::new();
        assert!(!gate.is_resolved());
        assert_eq!(gate.auth(), AuthState::Unknown);
        assert_eq!(gate.payment(), PaymentState::Unknown);
    }

    #[test]
    fn auth_probe_success_authenticates() {
        let mut gate = SessionGate::new();
        gate.resolve_auth(Ok(()));
        assert_eq!(gate.auth(), AuthState::Authenticated);
        assert!(gate.is_resolved());
    }

    #[test]
    fn auth_probe_failure_fails_closed() {
        let mut gate = SessionGate::new();
        gate.resolve_auth(Err(network_err()));
        assert_eq!(gate.auth(), AuthState::Unauthenticated);

        let mut gate = SessionGate::new();
        gate.resolve_auth(Err(ApiError::Http {
            status: 401,
            message: "HTTP 401".into(),
        }));
        assert_eq!(gate.auth(), AuthState::Unauthenticated);
    }

    #[test]
    fn payment_probe_failure_fails_closed() {
        let mut gate = SessionGate::new();
        gate.resolve_payment(Err(network_err()));
        assert_eq!(gate.payment(), PaymentState::Unpaid);
    }

    #[test]
    fn unauthenticated_protected_routes_redirect_to_landing() {
        let mut gate = SessionGate::new();
        gate.resolve_auth(Err(network_err()));

        for route in [
            Route::Dashboard,
            Route::AddSources,
            Route::SentimentAnalysis,
            Route::FeatureIdentification,
            Route::CompetitorAnalysis,
        ] {
            assert_eq!(gate.admit(route), Admission::RedirectLanding, "{:?}", route);
        }

        // Public routes stay reachable
        assert_eq!(gate.admit(Route::Landing), Admission::Allow);
        assert_eq!(gate.admit(Route::CardPayment), Admission::Allow);
    }

    #[test]
    fn authenticated_unpaid_redirects_to_payment() {
        let mut gate = SessionGate::new();
        gate.resolve_auth(Ok(()));
        gate.resolve_payment(Ok(false));

        assert_eq!(gate.admit(Route::Dashboard), Admission::RedirectPayment);
        assert_eq!(gate.admit(Route::AddSources), Admission::RedirectPayment);
        assert_eq!(gate.destination_after_login(), Route::CardPayment);
    }

    #[test]
    fn authenticated_paid_is_admitted_everywhere() {
        let mut gate = SessionGate::new();
        gate.resolve_auth(Ok(()));
        gate.resolve_payment(Ok(true));

        assert_eq!(gate.admit(Route::Dashboard), Admission::Allow);
        assert_eq!(gate.destination_after_login(), Route::AddSources);
    }

    #[test]
    fn unknown_payment_branches_to_payment_collection() {
        let mut gate = SessionGate::new();
        gate.resolve_auth(Ok(()));
        // Payment never probed: the gate must not guess open
        assert_eq!(gate.destination_after_login(), Route::CardPayment);
        assert_eq!(gate.admit(Route::AddSources), Admission::RedirectPayment);
    }

    #[test]
    fn payment_latch_opens_the_gated_family() {
        let mut gate = SessionGate::new();
        gate.resolve_auth(Ok(()));
        gate.resolve_payment(Ok(false));
        assert_eq!(gate.admit(Route::AddSources), Admission::RedirectPayment);

        gate.record_payment();
        assert_eq!(gate.admit(Route::AddSources), Admission::Allow);
    }

    #[test]
    fn logout_forces_unauthenticated_and_forgets_payment() {
        let mut gate = SessionGate::open();
        gate.logout();
        assert_eq!(gate.auth(), AuthState::Unauthenticated);
        assert_eq!(gate.payment(), PaymentState::Unknown);
        assert_eq!(gate.admit(Route::Dashboard), Admission::RedirectLanding);
    }
}
