// TUI application state
//
// App is the single explicit state object: route, gate, page states, forms,
// and chrome. Mutation goes through the methods here - key handlers and
// background tasks never reach into fields directly. Background work
// (probes, fetches, submits) runs in spawned tasks that report back over
// the event channel; a generation counter drops responses that arrive after
// the route has moved on.

use crate::api::csrf::CsrfToken;
use crate::api::models::AppEntry;
use crate::api::{ApiClient, ApiError};
use crate::config::Config;
use crate::forms::login::{self, LoginForm, LoginSuccess};
use crate::forms::payment::{self, PaymentForm, CONFIRMATION_PAUSE};
use crate::forms::signup::{self, SignupForm, SignupResult};
use crate::forms::FieldErrors;
use crate::logging::LogBuffer;
use crate::pages::competitor::CompetitorView;
use crate::pages::dashboard::{self, DashboardMetrics};
use crate::pages::features::{self, FeatureMetrics};
use crate::pages::sentiment::{self, SentimentMetrics};
use crate::pages::sources::{self, SelectionContext};
use crate::pages::PageState;
use crate::session::{Admission, Route, SessionGate};
use crate::store::SelectionStore;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// How long a toast stays on screen
const TOAST_DURATION: Duration = Duration::from_secs(3);

/// Pause before redirecting away from a failed payment verification
const VERIFY_REDIRECT_PAUSE: Duration = Duration::from_secs(2);

/// Messages from background tasks to the main loop
#[derive(Debug)]
pub enum AppEvent {
    /// Load probe against the auth-status endpoint finished
    AuthProbe(Result<(), ApiError>),
    /// Payment-status probe finished
    PaymentProbe(Result<bool, ApiError>),
    /// Page fetches; stale generations are dropped on arrival
    DashboardLoaded {
        generation: u64,
        state: PageState<DashboardMetrics>,
    },
    SentimentLoaded {
        generation: u64,
        state: PageState<SentimentMetrics>,
    },
    FeaturesLoaded {
        generation: u64,
        state: PageState<FeatureMetrics>,
    },
    /// Catalog search finished
    SearchResults {
        generation: u64,
        result: Result<Vec<AppEntry>, ApiError>,
    },
    /// An app selection or deselection finished
    SelectionDone {
        context: SelectionContext,
        app_name: String,
        removed: bool,
        result: Result<(), ApiError>,
    },
    /// Payment verification on add-sources entry
    PaymentVerified(bool),
    /// Form submits
    LoginDone(Result<LoginSuccess, ApiError>),
    SignupDone(Result<SignupResult, ApiError>),
    PaymentDone(Result<(), ApiError>),
    /// Deferred navigation (confirmation pauses, failed-verification redirect)
    Navigate(Route),
}

/// Which form, if any, currently owns the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormMode {
    #[default]
    None,
    Login,
    Signup,
    Payment,
    Search,
}

/// State of the add-sources panel
#[derive(Debug, Default)]
pub struct SourcesPanel {
    pub query: String,
    pub results: Vec<AppEntry>,
    pub selected: usize,
    pub context: SelectionContext,
    pub busy: bool,
    /// None until the entry payment check resolves
    pub verified: Option<bool>,
}

/// Main application state for the TUI
pub struct App {
    pub api: ApiClient,
    pub store: Arc<SelectionStore>,
    pub csrf: Arc<CsrfToken>,
    pub gate: SessionGate,
    pub route: Route,
    pub dark_mode: bool,
    pub should_quit: bool,
    pub demo_mode: bool,
    pub log_buffer: LogBuffer,

    // Page states
    pub dashboard: PageState<DashboardMetrics>,
    pub sentiment: PageState<SentimentMetrics>,
    pub features: PageState<FeatureMetrics>,
    pub competitor: CompetitorView,
    pub sources: SourcesPanel,

    // Forms
    pub form_mode: FormMode,
    pub form_focus: usize,
    pub login_form: LoginForm,
    pub login_errors: FieldErrors,
    pub signup_form: SignupForm,
    pub signup_errors: FieldErrors,
    pub payment_form: PaymentForm,
    pub payment_errors: FieldErrors,
    pub submitting: bool,

    // Chrome
    pub banner: Option<String>,
    toast: Option<(String, Instant)>,

    events_tx: mpsc::Sender<AppEvent>,
    generation: u64,
}

impl App {
    pub fn new(
        config: &Config,
        api: ApiClient,
        store: Arc<SelectionStore>,
        log_buffer: LogBuffer,
        events_tx: mpsc::Sender<AppEvent>,
    ) -> Self {
        // Dark mode is read before the first frame: no light-mode flash
        let dark_mode = store.dark_mode();

        let mut gate = if config.demo_mode {
            SessionGate::open()
        } else {
            SessionGate::new()
        };

        // The payment latch avoids re-querying the server on every load
        if store.payment_successful() {
            gate.record_payment();
        }

        let competitor = CompetitorView::from_store(&store);

        Self {
            api,
            store,
            csrf: Arc::new(CsrfToken::new()),
            gate,
            route: Route::Landing,
            dark_mode,
            should_quit: false,
            demo_mode: config.demo_mode,
            log_buffer,
            dashboard: PageState::sample(),
            sentiment: PageState::sample(),
            features: PageState::sample(),
            competitor,
            sources: SourcesPanel::default(),
            form_mode: FormMode::None,
            form_focus: 0,
            login_form: LoginForm::default(),
            login_errors: FieldErrors::new(),
            signup_form: SignupForm::default(),
            signup_errors: FieldErrors::new(),
            payment_form: PaymentForm::default(),
            payment_errors: FieldErrors::new(),
            submitting: false,
            banner: None,
            toast: None,
            events_tx,
            generation: 0,
        }
    }

    /// Kick off the load probe. Until AuthProbe arrives, the UI renders a
    /// full-page loading indicator and no route.
    pub fn bootstrap(&self) {
        if self.demo_mode {
            tracing::info!("Demo mode: gate open, no network");
            return;
        }
        let api = self.api.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(AppEvent::AuthProbe(api.auth_status().await)).await;
        });
    }

    // ── Navigation ──────────────────────────────────────────────────────────

    /// Route change, through the gate. A denied route is never mounted and
    /// its fetch never fires.
    pub fn navigate(&mut self, route: Route) {
        match self.gate.admit(route) {
            Admission::Allow => {
                self.route = route;
                self.enter_route();
            }
            Admission::RedirectLanding => {
                tracing::debug!("Gate: {:?} requires a session, redirecting", route);
                self.route = Route::Landing;
                self.enter_route();
                self.show_toast("Sign in to continue");
            }
            Admission::RedirectPayment => {
                tracing::debug!("Gate: {:?} requires payment, redirecting", route);
                self.route = Route::CardPayment;
                self.enter_route();
                self.show_toast("Complete payment to continue");
            }
        }
    }

    /// Re-run the current route's load (manual refresh)
    pub fn refresh(&mut self) {
        self.enter_route();
    }

    /// Per-route mount work: form ownership, fetches, store reads
    fn enter_route(&mut self) {
        self.banner = None;
        self.form_focus = 0;
        self.form_mode = match self.route {
            Route::CardPayment => FormMode::Payment,
            _ => FormMode::None,
        };

        match self.route {
            Route::Dashboard => self.load_dashboard(),
            Route::SentimentAnalysis => self.load_sentiment(),
            Route::FeatureIdentification => self.load_features(),
            Route::CompetitorAnalysis => {
                self.competitor = CompetitorView::from_store(&self.store);
            }
            Route::AddSources => self.enter_add_sources(),
            _ => {}
        }
    }

    fn load_dashboard(&mut self) {
        let generation = self.bump_generation();
        self.dashboard = PageState::loading();
        let api = self.api.clone();
        let app = self.store.current_app();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let state = dashboard::load(&api, app.as_ref()).await;
            let _ = tx.send(AppEvent::DashboardLoaded { generation, state }).await;
        });
    }

    fn load_sentiment(&mut self) {
        let generation = self.bump_generation();
        self.sentiment = PageState::loading();
        let api = self.api.clone();
        let app = self.store.current_app();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let state = sentiment::load(&api, app.as_ref()).await;
            let _ = tx.send(AppEvent::SentimentLoaded { generation, state }).await;
        });
    }

    fn load_features(&mut self) {
        let generation = self.bump_generation();
        self.features = PageState::loading();
        let api = self.api.clone();
        let app = self.store.current_app();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let state = features::load(&api, app.as_ref()).await;
            let _ = tx.send(AppEvent::FeaturesLoaded { generation, state }).await;
        });
    }

    fn enter_add_sources(&mut self) {
        self.sources.results.clear();
        self.sources.selected = 0;

        if self.demo_mode {
            self.sources.verified = Some(true);
            return;
        }

        self.sources.verified = None;
        let api = self.api.clone();
        let store = self.store.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let ok = sources::verify_payment(&api, &store).await;
            let _ = tx.send(AppEvent::PaymentVerified(ok)).await;
        });
    }

    fn bump_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Send a navigation event after a delay (confirmation pauses)
    fn navigate_after(&self, route: Route, delay: Duration) {
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(AppEvent::Navigate(route)).await;
        });
    }

    // ── Event application ───────────────────────────────────────────────────

    /// Apply a background-task event to the state
    pub fn apply(&mut self, event: AppEvent) {
        match event {
            AppEvent::AuthProbe(result) => {
                self.gate.resolve_auth(result);
                // With a session and no local latch, ask the server once
                if self.gate.auth() == crate::session::AuthState::Authenticated
                    && !self.store.payment_successful()
                {
                    let api = self.api.clone();
                    let tx = self.events_tx.clone();
                    tokio::spawn(async move {
                        let _ = tx.send(AppEvent::PaymentProbe(api.payment_status().await)).await;
                    });
                }
            }

            AppEvent::PaymentProbe(result) => {
                self.gate.resolve_payment(result);
                if self.gate.payment() == crate::session::PaymentState::Paid {
                    if let Err(e) = self.store.set_payment_successful() {
                        tracing::warn!("Could not persist payment flag: {}", e);
                    }
                }
            }

            AppEvent::DashboardLoaded { generation, state } => {
                if generation == self.generation {
                    self.dashboard = state;
                } else {
                    tracing::debug!("Dropping stale dashboard response");
                }
            }

            AppEvent::SentimentLoaded { generation, state } => {
                if generation == self.generation {
                    self.sentiment = state;
                } else {
                    tracing::debug!("Dropping stale sentiment response");
                }
            }

            AppEvent::FeaturesLoaded { generation, state } => {
                if generation == self.generation {
                    self.features = state;
                } else {
                    tracing::debug!("Dropping stale features response");
                }
            }

            AppEvent::SearchResults { generation, result } => {
                self.sources.busy = false;
                if generation != self.generation {
                    tracing::debug!("Dropping stale search response");
                    return;
                }
                match result {
                    Ok(results) if results.is_empty() => {
                        self.banner = Some("No apps found. Try a different search term.".into());
                    }
                    Ok(results) => {
                        self.sources.results = results;
                        self.sources.selected = 0;
                        self.banner = None;
                    }
                    Err(ApiError::Network(_)) => {
                        self.banner = Some("Network error - check backend server".into());
                    }
                    Err(e) => {
                        self.banner = Some(format!("Search temporarily unavailable: {}", e));
                    }
                }
            }

            AppEvent::SelectionDone {
                context,
                app_name,
                removed,
                result,
            } => {
                self.sources.busy = false;
                match result {
                    Ok(()) => {
                        if removed {
                            self.show_toast(format!("Removed {} ({})", app_name, context.label()));
                        } else {
                            self.show_toast(format!(
                                "Selected {} as {}",
                                app_name,
                                context.label()
                            ));
                        }
                        // Keep the comparison view in sync with the slots
                        self.competitor = CompetitorView::from_store(&self.store);
                    }
                    Err(e) if e.is_auth_failure() => {
                        // The session is the problem: back through the
                        // sign-in flow, no inline recovery
                        tracing::warn!("Selection rejected for auth reasons: {}", e);
                        self.logout();
                        self.show_toast("Session expired - sign in again");
                    }
                    Err(e) => {
                        self.banner = Some(format!("Failed to select {}: {}", app_name, e));
                    }
                }
            }

            AppEvent::PaymentVerified(ok) => {
                self.sources.verified = Some(ok);
                if !ok {
                    self.banner =
                        Some("Payment verification failed. Please complete payment.".into());
                    self.navigate_after(Route::CardPayment, VERIFY_REDIRECT_PAUSE);
                }
            }

            AppEvent::LoginDone(result) => {
                self.submitting = false;
                match result {
                    Ok(LoginSuccess { paid }) => {
                        self.gate.record_login();
                        self.gate.resolve_payment(Ok(paid));
                        if paid {
                            if let Err(e) = self.store.set_payment_successful() {
                                tracing::warn!("Could not persist payment flag: {}", e);
                            }
                        }
                        self.login_form = LoginForm::default();
                        self.form_mode = FormMode::None;
                        let destination = self.gate.destination_after_login();
                        self.navigate(destination);
                    }
                    Err(e) => {
                        self.banner = Some(login_error_message(&e));
                    }
                }
            }

            AppEvent::SignupDone(result) => {
                self.submitting = false;
                match result {
                    Ok(SignupResult::Created) => {
                        self.signup_form = SignupForm::default();
                        self.form_mode = FormMode::Login;
                        self.form_focus = 0;
                        self.show_toast("Account created - sign in to continue");
                    }
                    Ok(SignupResult::Rejected(fields)) => {
                        self.signup_errors = fields;
                    }
                    Err(e) => {
                        self.banner = Some(e.to_string());
                    }
                }
            }

            AppEvent::PaymentDone(result) => {
                self.submitting = false;
                match result {
                    Ok(()) => {
                        self.gate.record_payment();
                        self.payment_form = PaymentForm::default();
                        self.banner = Some(
                            "Payment successful! Redirecting to app selection...".into(),
                        );
                        // Confirmation screen first, app selection after the pause
                        self.route = Route::PaymentSuccess;
                        self.form_mode = FormMode::None;
                        self.navigate_after(Route::AddSources, CONFIRMATION_PAUSE);
                    }
                    Err(e) => {
                        self.banner = Some(format!("Payment failed: {}", e));
                    }
                }
            }

            AppEvent::Navigate(route) => self.navigate(route),
        }
    }

    // ── Form editing ────────────────────────────────────────────────────────

    /// Number of editable fields in the active form
    pub fn field_count(&self) -> usize {
        match self.form_mode {
            FormMode::None => 0,
            FormMode::Login => 2,
            FormMode::Signup => 4,
            FormMode::Payment => 8,
            FormMode::Search => 1,
        }
    }

    fn active_field_mut(&mut self) -> Option<&mut String> {
        match self.form_mode {
            FormMode::None => None,
            FormMode::Login => match self.form_focus {
                0 => Some(&mut self.login_form.username),
                1 => Some(&mut self.login_form.password),
                _ => None,
            },
            FormMode::Signup => match self.form_focus {
                0 => Some(&mut self.signup_form.username),
                1 => Some(&mut self.signup_form.email),
                2 => Some(&mut self.signup_form.password),
                3 => Some(&mut self.signup_form.password2),
                _ => None,
            },
            FormMode::Payment => match self.form_focus {
                0 => Some(&mut self.payment_form.cardholder_name),
                1 => Some(&mut self.payment_form.card_number),
                2 => Some(&mut self.payment_form.expiry_date),
                3 => Some(&mut self.payment_form.cvc),
                4 => Some(&mut self.payment_form.address_line),
                5 => Some(&mut self.payment_form.city),
                6 => Some(&mut self.payment_form.state),
                7 => Some(&mut self.payment_form.postal_code),
                _ => None,
            },
            FormMode::Search => Some(&mut self.sources.query),
        }
    }

    /// Open a form; keyboard input goes to it until Esc or submit
    pub fn open_form(&mut self, mode: FormMode) {
        self.form_mode = mode;
        self.form_focus = 0;
        self.banner = None;
    }

    pub fn form_input(&mut self, c: char) {
        if let Some(field) = self.active_field_mut() {
            field.push(c);
        }
    }

    pub fn form_backspace(&mut self) {
        if let Some(field) = self.active_field_mut() {
            field.pop();
        }
    }

    pub fn form_next(&mut self) {
        let count = self.field_count();
        if count > 0 {
            self.form_focus = (self.form_focus + 1) % count;
        }
    }

    pub fn form_prev(&mut self) {
        let count = self.field_count();
        if count > 0 {
            self.form_focus = (self.form_focus + count - 1) % count;
        }
    }

    /// Leave the form without submitting; the payment form stays bound to
    /// its route
    pub fn form_cancel(&mut self) {
        if self.form_mode != FormMode::Payment {
            self.form_mode = FormMode::None;
        }
        self.banner = None;
    }

    /// Validate and, when clean, spawn the submit for the active form
    pub fn form_submit(&mut self) {
        if self.submitting {
            return;
        }

        match self.form_mode {
            FormMode::None => {}
            FormMode::Login => {
                self.login_errors = login::validate(&self.login_form);
                if !self.login_errors.is_empty() {
                    return;
                }
                self.submitting = true;
                let api = self.api.clone();
                let csrf = self.csrf.clone();
                let form = self.login_form.clone();
                let tx = self.events_tx.clone();
                tokio::spawn(async move {
                    let result = login::submit(&api, &csrf, &form).await;
                    let _ = tx.send(AppEvent::LoginDone(result)).await;
                });
            }
            FormMode::Signup => {
                self.signup_errors = signup::validate(&self.signup_form);
                if !self.signup_errors.is_empty() {
                    return;
                }
                self.submitting = true;
                let api = self.api.clone();
                let csrf = self.csrf.clone();
                let form = self.signup_form.clone();
                let tx = self.events_tx.clone();
                tokio::spawn(async move {
                    let result = signup::submit(&api, &csrf, &form).await;
                    let _ = tx.send(AppEvent::SignupDone(result)).await;
                });
            }
            FormMode::Payment => {
                self.payment_errors = payment::validate(&self.payment_form);
                if !self.payment_errors.is_empty() {
                    return;
                }
                self.submitting = true;
                let api = self.api.clone();
                let csrf = self.csrf.clone();
                let store = self.store.clone();
                let form = self.payment_form.clone();
                let tx = self.events_tx.clone();
                tokio::spawn(async move {
                    let result = payment::submit(&api, &csrf, &store, &form).await;
                    let _ = tx.send(AppEvent::PaymentDone(result)).await;
                });
            }
            FormMode::Search => {
                self.run_search();
                self.form_mode = FormMode::None;
            }
        }
    }

    // ── Add-sources actions ─────────────────────────────────────────────────

    fn run_search(&mut self) {
        if self.sources.busy {
            return;
        }
        let query = self.sources.query.trim().to_string();
        if query.is_empty() {
            self.banner = Some("Please enter an app name".into());
            return;
        }

        self.sources.busy = true;
        let generation = self.bump_generation();
        let api = self.api.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = sources::search(&api, &query).await;
            let _ = tx.send(AppEvent::SearchResults { generation, result }).await;
        });
    }

    /// Flip between selecting "my app" and selecting a competitor
    pub fn toggle_selection_context(&mut self) {
        self.sources.context = match self.sources.context {
            SelectionContext::MyApp => SelectionContext::Competitor,
            SelectionContext::Competitor => SelectionContext::MyApp,
        };
    }

    pub fn sources_select_prev(&mut self) {
        self.sources.selected = self.sources.selected.saturating_sub(1);
    }

    pub fn sources_select_next(&mut self) {
        if !self.sources.results.is_empty() {
            self.sources.selected =
                (self.sources.selected + 1).min(self.sources.results.len() - 1);
        }
    }

    /// Select the highlighted search result into the active slot
    pub fn select_highlighted(&mut self) {
        if self.sources.busy {
            return;
        }
        let Some(app) = self.sources.results.get(self.sources.selected).cloned() else {
            return;
        };

        self.sources.busy = true;
        let context = self.sources.context;
        let api = self.api.clone();
        let csrf = self.csrf.clone();
        let store = self.store.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = sources::select(&api, &csrf, &store, context, &app).await;
            let _ = tx
                .send(AppEvent::SelectionDone {
                    context,
                    app_name: app.name.clone(),
                    removed: false,
                    result,
                })
                .await;
        });
    }

    /// Clear the active slot
    pub fn deselect_current(&mut self) {
        if self.sources.busy {
            return;
        }
        let context = self.sources.context;
        let name = match context {
            SelectionContext::MyApp => self.store.current_app().map(|a| a.name),
            SelectionContext::Competitor => self.store.competitor().map(|a| a.name),
        };
        let Some(app_name) = name else {
            return;
        };

        self.sources.busy = true;
        let api = self.api.clone();
        let csrf = self.csrf.clone();
        let store = self.store.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = sources::deselect(&api, &csrf, &store, context).await;
            let _ = tx
                .send(AppEvent::SelectionDone {
                    context,
                    app_name,
                    removed: true,
                    result,
                })
                .await;
        });
    }

    // ── Preferences and session ─────────────────────────────────────────────

    /// Flip dark mode and persist the flag immediately
    pub fn toggle_dark_mode(&mut self) {
        self.dark_mode = !self.dark_mode;
        if let Err(e) = self.store.set_dark_mode(self.dark_mode) {
            tracing::warn!("Could not persist dark-mode flag: {}", e);
        }
    }

    /// Log out: clear persisted selections and the payment latch, drop the
    /// token memo, force the gate shut, land on the landing route
    pub fn logout(&mut self) {
        if let Err(e) = self.store.clear_session_keys() {
            tracing::warn!("Could not clear session keys: {}", e);
        }
        self.csrf.invalidate();
        self.gate.logout();
        self.dashboard = PageState::sample();
        self.sentiment = PageState::sample();
        self.features = PageState::sample();
        self.competitor = CompetitorView::from_store(&self.store);
        self.route = Route::Landing;
        self.form_mode = FormMode::None;
        self.show_toast("Signed out");
        tracing::info!("Logged out");
    }

    // ── Chrome ──────────────────────────────────────────────────────────────

    pub fn show_toast(&mut self, message: impl Into<String>) {
        self.toast = Some((message.into(), Instant::now()));
    }

    /// Current toast text, if it has not expired
    pub fn toast(&self) -> Option<&str> {
        match &self.toast {
            Some((message, shown)) if shown.elapsed() < TOAST_DURATION => Some(message),
            _ => None,
        }
    }

    /// Periodic tick: expire the toast
    pub fn tick(&mut self) {
        if let Some((_, shown)) = &self.toast {
            if shown.elapsed() >= TOAST_DURATION {
                self.toast = None;
            }
        }
    }
}

/// Map a login failure to the banner text
///
/// Token failures get the distinct security wording; everything else shows
/// the extracted message.
fn login_error_message(error: &ApiError) -> String {
    match error {
        ApiError::CsrfUnavailable(_) => {
            "Security token unavailable. Please try again.".to_string()
        }
        ApiError::Network(_) => {
            "Network error. Please check your connection and try again.".to_string()
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::SampleData;
    use crate::session::AuthState;
    use tempfile::TempDir;

    fn test_app() -> (TempDir, App, mpsc::Receiver<AppEvent>) {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.base_url = "http://127.0.0.1:1".to_string();
        config.timeout_secs = 1;
        config.store_dir = dir.path().to_path_buf();

        let api = ApiClient::new(&config).unwrap();
        let store = Arc::new(SelectionStore::open(config.store_dir.clone()).unwrap());
        let (tx, rx) = mpsc::channel(64);
        let app = App::new(&config, api, store, LogBuffer::new(), tx);
        (dir, app, rx)
    }

    #[tokio::test]
    async fn unauthenticated_navigation_lands_on_landing() {
        let (_dir, mut app, _rx) = test_app();
        app.apply(AppEvent::AuthProbe(Err(ApiError::Network("down".into()))));

        app.navigate(Route::Dashboard);
        assert_eq!(app.route, Route::Landing);
        // The page state is untouched: the fetch never fired
        assert!(matches!(app.dashboard, PageState::Sample(_)));
    }

    #[tokio::test]
    async fn authenticated_unpaid_navigation_lands_on_payment() {
        let (_dir, mut app, _rx) = test_app();
        app.apply(AppEvent::AuthProbe(Ok(())));
        app.apply(AppEvent::PaymentProbe(Ok(false)));

        app.navigate(Route::AddSources);
        assert_eq!(app.route, Route::CardPayment);
        // The payment form owns the keyboard on that route
        assert_eq!(app.form_mode, FormMode::Payment);
    }

    #[tokio::test]
    async fn login_result_branches_on_payment() {
        let (_dir, mut app, _rx) = test_app();
        app.apply(AppEvent::AuthProbe(Err(ApiError::Network("down".into()))));

        app.apply(AppEvent::LoginDone(Ok(LoginSuccess { paid: false })));
        assert_eq!(app.gate.auth(), AuthState::Authenticated);
        assert_eq!(app.route, Route::CardPayment);

        let (_dir, mut app, _rx) = test_app();
        app.apply(AppEvent::LoginDone(Ok(LoginSuccess { paid: true })));
        assert_eq!(app.route, Route::AddSources);
        // Latch mirrored into the store
        assert!(app.store.payment_successful());
    }

    #[tokio::test]
    async fn stale_page_responses_are_dropped() {
        let (_dir, mut app, _rx) = test_app();
        let stale = app.generation; // generation before any load

        app.apply(AppEvent::AuthProbe(Ok(())));
        app.apply(AppEvent::PaymentProbe(Ok(true)));
        app.navigate(Route::Dashboard); // bumps the generation

        let mut loaded = DashboardMetrics::sample();
        loaded.total_reviews = 1;
        app.apply(AppEvent::DashboardLoaded {
            generation: stale,
            state: PageState::Loaded(loaded),
        });

        // Still loading: the stale payload never landed
        assert!(matches!(app.dashboard, PageState::Loading(_)));
    }

    #[tokio::test]
    async fn payment_success_pauses_then_moves_to_app_selection() {
        let (_dir, mut app, mut rx) = test_app();
        app.apply(AppEvent::AuthProbe(Ok(())));
        app.apply(AppEvent::PaymentProbe(Ok(false)));
        app.navigate(Route::CardPayment);

        app.apply(AppEvent::PaymentDone(Ok(())));
        assert_eq!(app.route, Route::PaymentSuccess);
        assert_eq!(app.gate.payment(), crate::session::PaymentState::Paid);

        // The deferred navigation arrives on the channel after the pause;
        // earlier probe results may land first, so drain until it shows up
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        let destination = loop {
            let event = tokio::time::timeout_at(deadline, rx.recv())
                .await
                .expect("navigation event within the pause window")
                .expect("channel open");
            if let AppEvent::Navigate(route) = event {
                break route;
            }
        };
        assert_eq!(destination, Route::AddSources);
    }

    #[tokio::test]
    async fn logout_clears_selections_and_shuts_the_gate() {
        let (_dir, mut app, _rx) = test_app();
        app.apply(AppEvent::AuthProbe(Ok(())));
        app.apply(AppEvent::PaymentProbe(Ok(true)));
        app.store
            .set_current_app(&AppEntry {
                id: 1,
                name: "Mine".into(),
                publisher: String::new(),
                icon: String::new(),
            })
            .unwrap();

        app.logout();

        assert_eq!(app.route, Route::Landing);
        assert!(app.store.current_app().is_none());
        assert!(!app.store.payment_successful());
        assert_eq!(app.gate.admit(Route::Dashboard), Admission::RedirectLanding);
    }

    #[tokio::test]
    async fn dark_mode_toggle_persists() {
        let (_dir, mut app, _rx) = test_app();
        assert!(!app.dark_mode);
        app.toggle_dark_mode();
        assert!(app.dark_mode);
        assert!(app.store.dark_mode());
    }

    #[tokio::test]
    async fn form_editing_targets_the_focused_field() {
        let (_dir, mut app, _rx) = test_app();
        app.open_form(FormMode::Login);

        app.form_input('a');
        app.form_input('@');
        app.form_input('b');
        assert_eq!(app.login_form.username, "a@b");

        app.form_next();
        app.form_input('p');
        app.form_backspace();
        assert_eq!(app.login_form.password, "");
        assert_eq!(app.login_form.username, "a@b");
    }

    #[tokio::test]
    async fn invalid_login_form_blocks_submission() {
        let (_dir, mut app, mut rx) = test_app();
        app.open_form(FormMode::Login);
        app.login_form.username = "not-an-email".into();
        app.login_form.password = "short".into();

        app.form_submit();

        assert!(!app.submitting);
        assert!(app.login_errors.get("username").is_some());
        // Nothing was spawned: the channel stays quiet
        assert!(rx.try_recv().is_err());
    }
}
