//! The bridge manager: one instance per page.
//!
//! Owns the configuration holder, the subscription queue and the page state
//! machine, and wires SDK status events to the reconciliation table and the
//! remote exchange.
//!
//! ```text
//! configure / set_routes ──► load ──► (SDK script loads) ──► on_sdk_ready
//!                                                              │ init + drain
//!                                                              ▼
//!        auth.authResponseChange ──► channel ──► process_pending_events
//!        (getLoginStatus, optional) ──┘                        │
//!                                               handle_status_event ──► exchange
//! ```
//!
//! [`FacebookAuthManager::logout`] is the user-initiated path: SDK logout
//! first, then the firewall logout navigation.

use crate::{
    reconcile, AuthResponse, BridgeError, BridgeResult, ConfigHolder, ConnectionStatus, Decision,
    EventCallback, EventQueue, ExchangeCallbacks, ExchangeResult, LoginIdentity, LoginPageGuard,
    Navigation, Navigator, NoOpReason, NoProfileFetch, PageMachine, PageMachineInput,
    PageMachineState, PageState, ProfileFetcher, ProfileFields, ProviderConfig, ProviderSdk,
    QueueState, RemoteExchange, RouteConfig, StatusEvent, AUTH_RESPONSE_CHANGE,
    SDK_CONTAINER_ID,
};
use bridge_config_and_utils::{ProviderOptions, RouteOptions};
use parking_lot::Mutex;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, trace, warn};
use url::Url;
use uuid::Uuid;

/// What handling one status event led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The reconciliation table required no action.
    NoOp(NoOpReason),
    /// The firewall accepted the login (or registration).
    LoggedIn {
        result: ExchangeResult,
        navigation: Navigation,
    },
    /// The logout navigation was dispatched.
    LoggedOut(Navigation),
    /// An exchange was already in flight, or the page already navigated away.
    Suppressed(PageState),
}

/// Reconciles provider status events with the firewall session.
pub struct FacebookAuthManager {
    sdk: Arc<dyn ProviderSdk>,
    navigator: Arc<dyn Navigator>,
    /// Seeded from the server-rendered page, never mutated.
    authenticated: bool,
    current_url: Option<Url>,
    status_check: bool,
    config: Mutex<ConfigHolder>,
    queue: Mutex<EventQueue>,
    page: Mutex<PageMachine>,
    events_tx: mpsc::UnboundedSender<StatusEvent>,
    events_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<StatusEvent>>,
    profile_fetcher: Arc<dyn ProfileFetcher>,
    callbacks: ExchangeCallbacks,
    http_client: Client,
}

impl FacebookAuthManager {
    /// Create a manager for a page whose session is `authenticated` or not.
    ///
    /// The manager's own `auth.authResponseChange` subscription is queued
    /// here, so it reaches the SDK exactly once, at the first drain.
    pub fn new(
        sdk: Arc<dyn ProviderSdk>,
        navigator: Arc<dyn Navigator>,
        authenticated: bool,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let mut queue = EventQueue::new();
        queue.subscribe(
            AUTH_RESPONSE_CHANGE,
            forward_to(events_tx.clone()),
            sdk.as_ref(),
        );

        Self {
            sdk,
            navigator,
            authenticated,
            current_url: None,
            status_check: false,
            config: Mutex::new(ConfigHolder::new()),
            queue: Mutex::new(queue),
            page: Mutex::new(PageMachine::new()),
            events_tx,
            events_rx: tokio::sync::Mutex::new(events_rx),
            profile_fetcher: Arc::new(NoProfileFetch),
            callbacks: ExchangeCallbacks::default(),
            http_client: Client::new(),
        }
    }

    pub fn with_profile_fetcher(mut self, fetcher: Arc<dyn ProfileFetcher>) -> Self {
        self.profile_fetcher = fetcher;
        self
    }

    pub fn with_callbacks(mut self, callbacks: ExchangeCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn with_http_client(mut self, http_client: Client) -> Self {
        self.http_client = http_client;
        self
    }

    /// URL of the hosting page, consulted by the login-page guard.
    pub fn with_current_url(mut self, current_url: Url) -> Self {
        self.current_url = Some(current_url);
        self
    }

    /// Ask the SDK for the current status once it is ready, unless the page
    /// is the login page. The answer is queued like any status event.
    pub fn with_status_check(mut self, enabled: bool) -> Self {
        self.status_check = enabled;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn configure(&self, options: &ProviderOptions) -> BridgeResult<ProviderConfig> {
        self.config.lock().configure(options).cloned()
    }

    pub fn set_routes(&self, routes: &RouteOptions) -> BridgeResult<RouteConfig> {
        self.config.lock().set_routes(routes).cloned()
    }

    pub fn is_ready(&self) -> bool {
        self.config.lock().is_ready()
    }

    pub fn is_loaded(&self) -> bool {
        self.config.lock().is_locked()
    }

    pub fn provider_config(&self) -> Option<ProviderConfig> {
        self.config.lock().provider().cloned()
    }

    pub fn route_config(&self) -> Option<RouteConfig> {
        self.config.lock().routes().cloned()
    }

    /// Lock the configuration and start loading the SDK script.
    ///
    /// Returns immediately; the host calls [`on_sdk_ready`](Self::on_sdk_ready)
    /// once the script has initialized.
    pub fn load(&self) -> BridgeResult<()> {
        let (provider, _) = self.config.lock().lock().inspect_err(|e| {
            error!(error = %e, "Refusing to load the provider SDK");
        })?;

        info!(
            app_id = %provider.app_id,
            script = %provider.script_url(),
            "Loading the provider SDK"
        );
        self.sdk.inject_script(SDK_CONTAINER_ID, provider.script_url());
        Ok(())
    }

    /// SDK-ready hook: initialize the SDK and forward buffered subscriptions.
    ///
    /// Returns the number of subscriptions forwarded. Calling it again does
    /// nothing.
    pub fn on_sdk_ready(&self) -> BridgeResult<usize> {
        let (provider, routes) = {
            let config = self.config.lock();
            match (config.provider(), config.routes()) {
                (Some(provider), Some(routes)) if config.is_locked() => {
                    (provider.clone(), routes.clone())
                }
                _ => {
                    error!("SDK reported ready before load");
                    return Err(BridgeError::Configuration(
                        "The SDK cannot be ready before load".to_string(),
                    ));
                }
            }
        };

        let mut queue = self.queue.lock();
        if queue.state() == QueueState::Forwarding {
            debug!("SDK ready hook already ran");
            return Ok(0);
        }

        self.sdk.init(&provider);
        let forwarded = queue.drain(self.sdk.as_ref());
        drop(queue);
        info!(forwarded, "Provider SDK initialized");

        if self.status_check {
            self.check_status(&routes);
        }
        Ok(forwarded)
    }

    fn check_status(&self, routes: &RouteConfig) {
        if let (Some(login_page), Some(current)) = (&routes.login_page, &self.current_url) {
            if LoginPageGuard::new(login_page.clone()).is_login_page(current) {
                debug!("Skipping the initial status check on the login page");
                return;
            }
        }
        debug!("Requesting the current login status");
        self.sdk.get_login_status(forward_to(self.events_tx.clone()));
    }

    /// User-initiated logout: end the provider session, then run the
    /// firewall logout navigation.
    ///
    /// Waits for the SDK to confirm the logout. Status events the SDK fires
    /// meanwhile are suppressed once processed.
    pub async fn logout(&self) -> BridgeResult<Outcome> {
        let routes = {
            let config = self.config.lock();
            match config.routes() {
                Some(routes) if config.is_locked() => routes.clone(),
                _ => {
                    error!("Logout requested before load");
                    return Err(BridgeError::Configuration(
                        "Cannot log out before the SDK is loaded".to_string(),
                    ));
                }
            }
        };
        if self.queue.lock().state() != QueueState::Forwarding {
            error!("Logout requested before the SDK was ready");
            return Err(BridgeError::Configuration(
                "Cannot log out before the SDK is ready".to_string(),
            ));
        }

        if let Err(state) = self.begin(PageMachineInput::LogoutRequested) {
            return Ok(Outcome::Suppressed(state));
        }

        info!("Logging out of the provider");
        let (done_tx, done_rx) = oneshot::channel();
        self.sdk.logout(Box::new(move || {
            let _ = done_tx.send(());
        }));

        if done_rx.await.is_err() {
            self.finish(PageMachineInput::LogoutAborted)?;
            warn!("Provider SDK dropped the logout without completing it");
            return Err(BridgeError::Transport(
                "The provider SDK did not complete the logout".to_string(),
            ));
        }

        self.navigate_logout(&routes)
    }

    /// Subscribe to an SDK event, buffering until the SDK is ready.
    pub fn subscribe(&self, name: impl Into<String>, callback: EventCallback) {
        self.queue.lock().subscribe(name, callback, self.sdk.as_ref());
    }

    pub fn page_state(&self) -> PageState {
        PageState::from(self.page.lock().state())
    }

    /// Handle every status event delivered so far, in arrival order.
    ///
    /// Each event gets its own result; a failed exchange does not stop the
    /// following events.
    pub async fn process_pending_events(&self) -> Vec<BridgeResult<Outcome>> {
        let mut outcomes = Vec::new();
        loop {
            let next = self.events_rx.lock().await.try_recv();
            let Ok(event) = next else {
                break;
            };
            outcomes.push(self.handle_status_event(&event).await);
        }
        outcomes
    }

    /// Reconcile one status event against the session and act on it.
    ///
    /// The table is evaluated fresh on every call.
    pub async fn handle_status_event(&self, event: &StatusEvent) -> BridgeResult<Outcome> {
        let state = self.page_state();
        if !state.accepts_events() {
            debug!(?state, status = %event.status, "Status event suppressed");
            return Ok(Outcome::Suppressed(state));
        }

        let (provider, routes) = {
            let config = self.config.lock();
            match (config.provider(), config.routes()) {
                (Some(provider), Some(routes)) => (provider.clone(), routes.clone()),
                _ => {
                    error!("Status event received before the bridge was configured");
                    return Err(BridgeError::Configuration(
                        "Status event received before the bridge was configured".to_string(),
                    ));
                }
            }
        };

        if let ConnectionStatus::Unrecognized(raw) = &event.status {
            let err = BridgeError::UnexpectedEvent(raw.clone());
            warn!(error = %err, "Ignoring status event");
        }

        let mut decision = reconcile(event, self.authenticated, provider.auto_logout);
        if let Some(login_page) = &routes.login_page {
            decision =
                LoginPageGuard::new(login_page.clone()).apply(decision, self.current_url.as_ref());
        }

        match decision {
            Decision::NoOp(reason) => {
                debug!(?reason, status = %event.status, "No reconciliation needed");
                Ok(Outcome::NoOp(reason))
            }
            Decision::Login(auth) => self.login(&routes, auth).await,
            Decision::Logout => self.dispatch_logout(&routes),
        }
    }

    async fn login(&self, routes: &RouteConfig, auth: AuthResponse) -> BridgeResult<Outcome> {
        if let Err(state) = self.begin(PageMachineInput::LoginRequested) {
            return Ok(Outcome::Suppressed(state));
        }

        let exchange_id = Uuid::new_v4();
        info!(%exchange_id, user_id = %auth.user_id, "Starting login exchange");

        let profile = match self.profile_fetcher.fetch(&auth).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(%exchange_id, error = %e, "Profile fetch failed, exchanging raw tokens");
                ProfileFields::default()
            }
        };
        let identity = LoginIdentity::new(auth.user_id, auth.access_token).with_profile(profile);

        match self.exchange().exchange_login(routes, &identity).await {
            Ok((result, navigation)) => {
                let input = if navigation.is_terminal() {
                    PageMachineInput::LoginAccepted
                } else {
                    PageMachineInput::LoginRejected
                };
                self.finish(input)?;
                info!(%exchange_id, ?navigation, "Login exchange completed");
                Ok(Outcome::LoggedIn { result, navigation })
            }
            Err(err) => {
                let input = if matches!(err, BridgeError::LoginRejected) {
                    PageMachineInput::LoginRejected
                } else {
                    PageMachineInput::TransportFailed
                };
                self.finish(input)?;
                warn!(%exchange_id, error = %err, "Login exchange failed");
                Err(err)
            }
        }
    }

    fn dispatch_logout(&self, routes: &RouteConfig) -> BridgeResult<Outcome> {
        if let Err(state) = self.begin(PageMachineInput::LogoutRequested) {
            return Ok(Outcome::Suppressed(state));
        }
        self.navigate_logout(routes)
    }

    /// Finish a logout started with `LogoutRequested`.
    fn navigate_logout(&self, routes: &RouteConfig) -> BridgeResult<Outcome> {
        let navigation = self.exchange().exchange_logout(routes);
        self.finish(if navigation.is_terminal() {
            PageMachineInput::LogoutDispatched
        } else {
            PageMachineInput::LogoutAborted
        })?;
        Ok(Outcome::LoggedOut(navigation))
    }

    fn exchange(&self) -> RemoteExchange {
        RemoteExchange::new(
            self.http_client.clone(),
            self.callbacks.clone(),
            self.navigator.clone(),
        )
    }

    /// Start an exchange, or report the state that refused it.
    fn begin(&self, input: PageMachineInput) -> Result<(), PageState> {
        let mut page = self.page.lock();
        match page.consume(&input) {
            Ok(_) => Ok(()),
            Err(_) => {
                let state = PageState::from(page.state());
                debug!(?input, ?state, "Exchange already in progress");
                Err(state)
            }
        }
    }

    fn finish(&self, input: PageMachineInput) -> BridgeResult<()> {
        let mut page = self.page.lock();
        let from: PageMachineState = page.state().clone();
        page.consume(&input).map_err(|_| {
            error!(?input, ?from, "Invalid page state transition");
            BridgeError::InvalidStateTransition(format!("{:?} from {:?}", input, from))
        })?;
        Ok(())
    }
}

/// SDK callback feeding the manager's event channel.
fn forward_to(events_tx: mpsc::UnboundedSender<StatusEvent>) -> EventCallback {
    Arc::new(move |event: &StatusEvent| {
        trace!(status = %event.status, "Status event received from the SDK");
        if events_tx.send(event.clone()).is_err() {
            debug!("Status event dropped: manager is gone");
        }
    })
}
