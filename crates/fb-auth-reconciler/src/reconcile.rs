//! Reconciliation of provider status events against the local session.
//!
//! | auth response | status == connected | authenticated | decision |
//! |---|---|---|---|
//! | yes | yes | false | login exchange |
//! | yes | yes | true | no-op |
//! | no, or status != connected | - | true | logout (if auto-logout) |
//! | no, or status != connected | - | false | no-op |
//!
//! The table is evaluated fresh for every event; it keeps no memory.

use crate::{AuthResponse, ConnectionStatus, StatusEvent};
use url::Url;

/// Action decided for one status event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Exchange the provider identity for a firewall session.
    Login(AuthResponse),
    /// End the firewall session.
    Logout,
    /// Nothing to do.
    NoOp(NoOpReason),
}

/// Why a status event required no action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoOpReason {
    AlreadyAuthenticated,
    NotAuthenticated,
    AutoLogoutDisabled,
    /// The SDK sent a status outside the documented set.
    UnrecognizedStatus(String),
    /// Suppressed by the login-page guard.
    LoginPageGuard,
}

/// Map a status event and the local session state to a decision.
pub fn reconcile(event: &StatusEvent, authenticated: bool, auto_logout: bool) -> Decision {
    if let ConnectionStatus::Unrecognized(raw) = &event.status {
        return Decision::NoOp(NoOpReason::UnrecognizedStatus(raw.clone()));
    }

    match (event.connected_identity(), authenticated) {
        (Some(_), true) => Decision::NoOp(NoOpReason::AlreadyAuthenticated),
        (Some(auth), false) => Decision::Login(auth.clone()),
        (None, true) if auto_logout => Decision::Logout,
        (None, true) => Decision::NoOp(NoOpReason::AutoLogoutDisabled),
        (None, false) => Decision::NoOp(NoOpReason::NotAuthenticated),
    }
}

/// Path-based gating used by older deployments.
///
/// A login only fires on the login page; a logout only fires away from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginPageGuard {
    login_page: Url,
}

impl LoginPageGuard {
    pub fn new(login_page: Url) -> Self {
        Self { login_page }
    }

    /// Whether `current` is the login page (same origin and path, any query).
    pub fn is_login_page(&self, current: &Url) -> bool {
        current.origin() == self.login_page.origin()
            && current.path().trim_end_matches('/') == self.login_page.path().trim_end_matches('/')
    }

    /// Filter a decision for the page at `current`.
    ///
    /// Without a known current page the decision is kept.
    pub fn apply(&self, decision: Decision, current: Option<&Url>) -> Decision {
        let Some(current) = current else {
            return decision;
        };

        match decision {
            Decision::Login(_) if !self.is_login_page(current) => {
                Decision::NoOp(NoOpReason::LoginPageGuard)
            }
            Decision::Logout if self.is_login_page(current) => {
                Decision::NoOp(NoOpReason::LoginPageGuard)
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected() -> StatusEvent {
        StatusEvent::connected("10001", "EAAB")
    }

    #[test]
    fn test_connected_and_anonymous_logs_in() {
        match reconcile(&connected(), false, true) {
            Decision::Login(auth) => {
                assert_eq!(auth.user_id, "10001");
                assert_eq!(auth.access_token, "EAAB");
            }
            other => panic!("Expected Login, got {:?}", other),
        }
    }

    #[test]
    fn test_connected_and_authenticated_is_noop() {
        assert_eq!(
            reconcile(&connected(), true, true),
            Decision::NoOp(NoOpReason::AlreadyAuthenticated)
        );
    }

    #[test]
    fn test_disconnected_and_authenticated_logs_out() {
        assert_eq!(
            reconcile(&StatusEvent::not_authorized(), true, true),
            Decision::Logout
        );
        assert_eq!(reconcile(&StatusEvent::unknown(), true, true), Decision::Logout);
    }

    #[test]
    fn test_auto_logout_disabled_is_noop() {
        assert_eq!(
            reconcile(&StatusEvent::not_authorized(), true, false),
            Decision::NoOp(NoOpReason::AutoLogoutDisabled)
        );
    }

    #[test]
    fn test_disconnected_and_anonymous_is_noop() {
        for auto_logout in [true, false] {
            assert_eq!(
                reconcile(&StatusEvent::unknown(), false, auto_logout),
                Decision::NoOp(NoOpReason::NotAuthenticated)
            );
        }
    }

    #[test]
    fn test_connected_without_auth_response_counts_as_disconnected() {
        let event = StatusEvent {
            status: ConnectionStatus::Connected,
            auth_response: None,
        };
        assert_eq!(reconcile(&event, true, true), Decision::Logout);
        assert_eq!(
            reconcile(&event, false, true),
            Decision::NoOp(NoOpReason::NotAuthenticated)
        );
    }

    #[test]
    fn test_auth_response_with_other_status_counts_as_disconnected() {
        let event = StatusEvent {
            status: ConnectionStatus::NotAuthorized,
            auth_response: Some(AuthResponse::new("1", "t")),
        };
        assert_eq!(reconcile(&event, true, true), Decision::Logout);
    }

    #[test]
    fn test_unrecognized_status_is_noop_even_when_authenticated() {
        let event = StatusEvent {
            status: ConnectionStatus::Unrecognized("suspended".to_string()),
            auth_response: None,
        };
        assert_eq!(
            reconcile(&event, true, true),
            Decision::NoOp(NoOpReason::UnrecognizedStatus("suspended".to_string()))
        );
    }

    #[test]
    fn test_reconcile_is_stable_for_repeated_events() {
        let first = reconcile(&connected(), false, true);
        let second = reconcile(&connected(), false, true);
        assert_eq!(first, second);
    }

    fn guard() -> LoginPageGuard {
        LoginPageGuard::new(Url::parse("https://example.com/login").unwrap())
    }

    #[test]
    fn test_guard_matches_login_page_ignoring_query_and_slash() {
        let guard = guard();
        assert!(guard.is_login_page(&Url::parse("https://example.com/login/").unwrap()));
        assert!(guard.is_login_page(&Url::parse("https://example.com/login?next=/").unwrap()));
        assert!(!guard.is_login_page(&Url::parse("https://example.com/account").unwrap()));
        assert!(!guard.is_login_page(&Url::parse("https://other.com/login").unwrap()));
    }

    #[test]
    fn test_guard_blocks_login_away_from_login_page() {
        let decision = Decision::Login(AuthResponse::new("1", "t"));
        let account = Url::parse("https://example.com/account").unwrap();
        let login = Url::parse("https://example.com/login").unwrap();

        assert_eq!(
            guard().apply(decision.clone(), Some(&account)),
            Decision::NoOp(NoOpReason::LoginPageGuard)
        );
        assert_eq!(guard().apply(decision.clone(), Some(&login)), decision);
    }

    #[test]
    fn test_guard_blocks_logout_on_login_page() {
        let account = Url::parse("https://example.com/account").unwrap();
        let login = Url::parse("https://example.com/login").unwrap();

        assert_eq!(
            guard().apply(Decision::Logout, Some(&login)),
            Decision::NoOp(NoOpReason::LoginPageGuard)
        );
        assert_eq!(guard().apply(Decision::Logout, Some(&account)), Decision::Logout);
    }

    #[test]
    fn test_guard_without_current_page_keeps_decision() {
        assert_eq!(guard().apply(Decision::Logout, None), Decision::Logout);
    }
}
