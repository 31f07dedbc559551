//! End-to-end tests for the bridge manager.
//!
//! A scripted SDK delivers status events through the manager's own
//! subscription and a mock firewall answers the login exchange.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bridge_config_and_utils::{ProviderOptions, RouteOptions};
use fb_auth_reconciler::{
    BridgeError, DoneCallback, EventCallback, ExchangeCallbacks, ExchangeResult, FacebookAuthManager,
    Navigation, Navigator, NoOpReason, Outcome, PageState, ProviderConfig, ProviderSdk,
    RouteConfig, StatusEvent, AUTH_RESPONSE_CHANGE,
};
use parking_lot::Mutex;
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct ScriptedSdk {
    subscriptions: Mutex<Vec<(String, EventCallback)>>,
    login_status: Mutex<Option<StatusEvent>>,
    status_checks: AtomicUsize,
    logouts: AtomicUsize,
}

impl ScriptedSdk {
    fn emit(&self, event: &StatusEvent) {
        let callbacks: Vec<EventCallback> = self
            .subscriptions
            .lock()
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();
        for callback in callbacks {
            callback(event);
        }
    }

    fn subscribed_names(&self) -> Vec<String> {
        self.subscriptions
            .lock()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

impl ProviderSdk for ScriptedSdk {
    fn inject_script(&self, _container_id: &str, _script_url: &Url) {}

    fn init(&self, _config: &ProviderConfig) {}

    fn subscribe(&self, event_name: &str, callback: EventCallback) {
        self.subscriptions
            .lock()
            .push((event_name.to_string(), callback));
    }

    fn get_login_status(&self, callback: EventCallback) {
        self.status_checks.fetch_add(1, Ordering::SeqCst);
        let status = self.login_status.lock().clone();
        if let Some(status) = status {
            callback(&status);
        }
    }

    fn logout(&self, done: DoneCallback) {
        self.logouts.fetch_add(1, Ordering::SeqCst);
        done();
    }
}

#[derive(Default)]
struct RecordingNavigator {
    navigations: Mutex<Vec<Navigation>>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, navigation: &Navigation) {
        self.navigations.lock().push(navigation.clone());
    }
}

struct Page {
    manager: FacebookAuthManager,
    sdk: Arc<ScriptedSdk>,
    navigator: Arc<RecordingNavigator>,
}

impl Page {
    fn new(authenticated: bool) -> Self {
        let sdk = Arc::new(ScriptedSdk::default());
        let navigator = Arc::new(RecordingNavigator::default());
        let manager = FacebookAuthManager::new(sdk.clone(), navigator.clone(), authenticated);
        Self {
            manager,
            sdk,
            navigator,
        }
    }

    fn configure(self, server: &MockServer, auto_logout: bool) -> Self {
        self.manager
            .configure(&ProviderOptions {
                auto_logout: Some(auto_logout),
                ..ProviderOptions::with_app_id("123456")
            })
            .unwrap();
        self.manager.set_routes(&routes(server)).unwrap();
        self
    }

    fn with_status_check(self) -> Self {
        Self {
            manager: self.manager.with_status_check(true),
            ..self
        }
    }

    fn start(&self) {
        self.manager.load().unwrap();
        self.manager.on_sdk_ready().unwrap();
    }

    fn navigations(&self) -> Vec<Navigation> {
        self.navigator.navigations.lock().clone()
    }
}

fn routes(server: &MockServer) -> RouteOptions {
    RouteOptions {
        base_url: Some(server.uri()),
        login_endpoint: Some("/login_check".to_string()),
        logout_endpoint: Some("/logout".to_string()),
        target_endpoint: Some("/account".to_string()),
        login_page: None,
    }
}

fn endpoint(server: &MockServer, path: &str) -> Url {
    Url::parse(&server.uri()).unwrap().join(path).unwrap()
}

#[tokio::test]
async fn test_missing_app_id_keeps_previous_config() {
    let server = MockServer::start().await;
    let page = Page::new(false).configure(&server, true);

    let err = page
        .manager
        .configure(&ProviderOptions::default())
        .unwrap_err();

    assert!(matches!(err, BridgeError::Configuration(_)));
    assert_eq!(page.manager.provider_config().unwrap().app_id, "123456");
}

#[tokio::test]
async fn test_ready_iff_app_id_with_all_endpoints() {
    let server = MockServer::start().await;
    let page = Page::new(false);

    page.manager.set_routes(&routes(&server)).unwrap();
    assert!(!page.manager.is_ready());

    page.manager
        .configure(&ProviderOptions::with_app_id("123456"))
        .unwrap();
    assert!(page.manager.is_ready());
}

#[tokio::test]
async fn test_buffered_subscriptions_reach_sdk_in_order() {
    let server = MockServer::start().await;
    let page = Page::new(false).configure(&server, true);

    for name in ["a", "b", "c"] {
        page.manager.subscribe(name, Arc::new(|_: &StatusEvent| {}));
    }
    assert!(page.sdk.subscribed_names().is_empty());

    page.start();

    assert_eq!(
        page.sdk.subscribed_names(),
        vec![AUTH_RESPONSE_CHANGE, "a", "b", "c"]
    );
}

#[tokio::test]
async fn test_connected_anonymous_page_logs_in_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login_check"))
        .and(header("X-Requested-With", "XMLHttpRequest"))
        .and(body_string_contains("facebookId=10001"))
        .and(body_string_contains("accessToken=EAAB"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": true,
            "process": "login"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = Page::new(false).configure(&server, true);
    page.start();

    page.sdk.emit(&StatusEvent::connected("10001", "EAAB"));
    // The SDK commonly fires again once the page starts navigating
    page.sdk.emit(&StatusEvent::connected("10001", "EAAB"));
    let outcomes = page.manager.process_pending_events().await;

    assert_eq!(outcomes.len(), 2);
    match &outcomes[0] {
        Ok(Outcome::LoggedIn { result, navigation }) => {
            assert!(result.status);
            assert_eq!(
                *navigation,
                Navigation::Redirect(endpoint(&server, "/account"))
            );
        }
        other => panic!("Expected LoggedIn, got {:?}", other),
    }
    assert!(matches!(
        outcomes[1],
        Ok(Outcome::Suppressed(PageState::Navigated))
    ));
    assert_eq!(page.navigations().len(), 1);
}

#[tokio::test]
async fn test_connected_authenticated_page_does_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let page = Page::new(true).configure(&server, true);
    let outcome = page
        .manager
        .handle_status_event(&StatusEvent::connected("10001", "EAAB"))
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::NoOp(NoOpReason::AlreadyAuthenticated));
    assert!(page.navigations().is_empty());
}

#[tokio::test]
async fn test_failed_exchange_is_not_debounced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login_check"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let page = Page::new(false).configure(&server, true);
    let event = StatusEvent::connected("10001", "EAAB");

    for _ in 0..2 {
        let err = page.manager.handle_status_event(&event).await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(page.manager.page_state(), PageState::Idle);
    }
    assert!(page.navigations().is_empty());
}

#[tokio::test]
async fn test_rejected_login_stays_on_page() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login_check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": false
        })))
        .mount(&server)
        .await;

    let page = Page::new(false).configure(&server, true);
    let err = page
        .manager
        .handle_status_event(&StatusEvent::connected("10001", "EAAB"))
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::LoginRejected));
    assert_eq!(page.manager.page_state(), PageState::Idle);
    assert!(page.navigations().is_empty());
}

#[tokio::test]
async fn test_register_process_runs_registration_callback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login_check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": true,
            "process": "register"
        })))
        .mount(&server)
        .await;

    let registered = Arc::new(AtomicUsize::new(0));
    let logged_in = Arc::new(AtomicUsize::new(0));
    let welcome = endpoint(&server, "/welcome");
    let callbacks = ExchangeCallbacks::default()
        .on_register({
            let registered = registered.clone();
            let welcome = welcome.clone();
            move |_: &RouteConfig, _: &ExchangeResult| {
                registered.fetch_add(1, Ordering::SeqCst);
                Navigation::Redirect(welcome.clone())
            }
        })
        .on_login({
            let logged_in = logged_in.clone();
            move |routes: &RouteConfig, _: &ExchangeResult| {
                logged_in.fetch_add(1, Ordering::SeqCst);
                Navigation::Redirect(routes.target_endpoint.clone())
            }
        });

    let page = Page::new(false).configure(&server, true);
    let manager = page.manager.with_callbacks(callbacks);

    manager
        .handle_status_event(&StatusEvent::connected("10001", "EAAB"))
        .await
        .unwrap();

    assert_eq!(registered.load(Ordering::SeqCst), 1);
    assert_eq!(logged_in.load(Ordering::SeqCst), 0);
    assert_eq!(
        *page.navigator.navigations.lock(),
        vec![Navigation::Redirect(welcome)]
    );
}

#[tokio::test]
async fn test_absent_process_runs_login_callback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login_check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": true
        })))
        .mount(&server)
        .await;

    let page = Page::new(false).configure(&server, true);
    let outcome = page
        .manager
        .handle_status_event(&StatusEvent::connected("10001", "EAAB"))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        Outcome::LoggedIn {
            result: ExchangeResult {
                status: true,
                process: None,
            },
            navigation: Navigation::Redirect(endpoint(&server, "/account")),
        }
    );
}

#[tokio::test]
async fn test_not_authorized_authenticated_page_logs_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let page = Page::new(true).configure(&server, true);
    page.start();
    page.sdk.emit(&StatusEvent::not_authorized());

    let outcomes = page.manager.process_pending_events().await;

    let logout = Navigation::Redirect(endpoint(&server, "/logout"));
    assert_eq!(outcomes.len(), 1);
    assert!(matches!(&outcomes[0], Ok(Outcome::LoggedOut(nav)) if *nav == logout));
    assert_eq!(page.navigations(), vec![logout]);
}

#[tokio::test]
async fn test_auto_logout_disabled_takes_no_action() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let page = Page::new(true).configure(&server, false);
    let outcome = page
        .manager
        .handle_status_event(&StatusEvent::not_authorized())
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::NoOp(NoOpReason::AutoLogoutDisabled));
    assert!(page.navigations().is_empty());
    assert_eq!(page.manager.page_state(), PageState::Idle);
}

#[tokio::test]
async fn test_status_check_logs_out_stale_session() {
    let server = MockServer::start().await;
    let page = Page::new(true).configure(&server, true).with_status_check();
    *page.sdk.login_status.lock() = Some(StatusEvent::unknown());

    page.start();
    let outcomes = page.manager.process_pending_events().await;

    assert_eq!(page.sdk.status_checks.load(Ordering::SeqCst), 1);
    assert_eq!(outcomes.len(), 1);
    assert_eq!(
        page.navigations(),
        vec![Navigation::Redirect(endpoint(&server, "/logout"))]
    );
}

#[tokio::test]
async fn test_user_logout_suppresses_following_status_events() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let page = Page::new(true).configure(&server, true);
    page.start();

    let outcome = page.manager.logout().await.unwrap();
    // FB.logout fires a status change of its own
    page.sdk.emit(&StatusEvent::unknown());
    let outcomes = page.manager.process_pending_events().await;

    let logout = Navigation::Redirect(endpoint(&server, "/logout"));
    assert_eq!(outcome, Outcome::LoggedOut(logout.clone()));
    assert_eq!(page.sdk.logouts.load(Ordering::SeqCst), 1);
    assert!(matches!(
        outcomes[..],
        [Ok(Outcome::Suppressed(PageState::Navigated))]
    ));
    assert_eq!(page.navigations(), vec![logout]);
}
