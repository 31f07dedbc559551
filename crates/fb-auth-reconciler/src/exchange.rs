//! Login/logout exchange with the firewall.
//!
//! The login exchange is a form POST to the login-check endpoint carrying the
//! provider identity; the firewall answers `{"status": bool, "process": ...}`.
//! The logout exchange is a plain navigation to the logout endpoint.

use crate::{BridgeError, BridgeResult, Navigation, Navigator, ProfileFields, RouteConfig};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

const REQUESTED_WITH: &str = "XMLHttpRequest";
const BIRTHDAY_FORMAT: &str = "%m/%d/%Y";

/// Identity forwarded to the login-check endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginIdentity {
    pub user_id: String,
    pub access_token: String,
    pub profile: ProfileFields,
}

impl fmt::Debug for LoginIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginIdentity")
            .field("user_id", &self.user_id)
            .field("access_token", &"[redacted]")
            .field("profile", &self.profile)
            .finish()
    }
}

impl LoginIdentity {
    pub fn new(user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: access_token.into(),
            profile: ProfileFields::default(),
        }
    }

    pub fn with_profile(mut self, profile: ProfileFields) -> Self {
        self.profile = profile;
        self
    }

    /// Form fields in the order the firewall listener reads them.
    ///
    /// Friends are sent as a repeated `friends[]` field.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("facebookId", self.user_id.clone()),
            ("accessToken", self.access_token.clone()),
        ];

        let profile = &self.profile;
        let optional = [
            ("email", profile.email.clone()),
            ("firstName", profile.first_name.clone()),
            ("lastName", profile.last_name.clone()),
            ("gender", profile.gender.clone()),
            (
                "birthday",
                profile
                    .birthday
                    .map(|date| date.format(BIRTHDAY_FORMAT).to_string()),
            ),
        ];
        fields.extend(
            optional
                .into_iter()
                .filter_map(|(name, value)| value.map(|value| (name, value))),
        );
        fields.extend(
            profile
                .friends
                .iter()
                .map(|friend| ("friends[]", friend.clone())),
        );
        fields
    }
}

/// Which flow the firewall ran for a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeProcess {
    Login,
    Register,
    #[serde(other)]
    Other,
}

/// Response of the login-check endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeResult {
    pub status: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<ExchangeProcess>,
}

impl ExchangeResult {
    /// Whether the firewall reported a fresh registration.
    pub fn is_registration(&self) -> bool {
        self.process == Some(ExchangeProcess::Register)
    }
}

/// Callback run after a successful login or registration.
pub type LoginCallback = Arc<dyn Fn(&RouteConfig, &ExchangeResult) -> Navigation + Send + Sync>;

/// Callback run when the session must end.
pub type LogoutCallback = Arc<dyn Fn(&RouteConfig) -> Navigation + Send + Sync>;

/// Post-exchange behavior.
///
/// Login and registration navigate to the target endpoint, logout navigates
/// to the logout endpoint.
#[derive(Clone)]
pub struct ExchangeCallbacks {
    pub on_login: LoginCallback,
    pub on_register: LoginCallback,
    pub on_logout: LogoutCallback,
}

impl Default for ExchangeCallbacks {
    fn default() -> Self {
        Self {
            on_login: Arc::new(|routes: &RouteConfig, _: &ExchangeResult| {
                Navigation::Redirect(routes.target_endpoint.clone())
            }),
            on_register: Arc::new(|routes: &RouteConfig, _: &ExchangeResult| {
                Navigation::Redirect(routes.target_endpoint.clone())
            }),
            on_logout: Arc::new(|routes: &RouteConfig| {
                Navigation::Redirect(routes.logout_endpoint.clone())
            }),
        }
    }
}

impl fmt::Debug for ExchangeCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeCallbacks").finish_non_exhaustive()
    }
}

impl ExchangeCallbacks {
    pub fn on_login(
        mut self,
        callback: impl Fn(&RouteConfig, &ExchangeResult) -> Navigation + Send + Sync + 'static,
    ) -> Self {
        self.on_login = Arc::new(callback);
        self
    }

    pub fn on_register(
        mut self,
        callback: impl Fn(&RouteConfig, &ExchangeResult) -> Navigation + Send + Sync + 'static,
    ) -> Self {
        self.on_register = Arc::new(callback);
        self
    }

    pub fn on_logout(
        mut self,
        callback: impl Fn(&RouteConfig) -> Navigation + Send + Sync + 'static,
    ) -> Self {
        self.on_logout = Arc::new(callback);
        self
    }
}

/// Performs exchanges and applies the resulting navigation.
pub struct RemoteExchange {
    http_client: Client,
    callbacks: ExchangeCallbacks,
    navigator: Arc<dyn Navigator>,
}

impl RemoteExchange {
    pub fn new(
        http_client: Client,
        callbacks: ExchangeCallbacks,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            http_client,
            callbacks,
            navigator,
        }
    }

    /// Exchange the provider identity for a firewall session.
    ///
    /// Returns the firewall response and the navigation that was applied.
    /// A rejected login or a failed request applies no navigation and is
    /// never retried.
    pub async fn exchange_login(
        &self,
        routes: &RouteConfig,
        identity: &LoginIdentity,
    ) -> BridgeResult<(ExchangeResult, Navigation)> {
        debug!(
            endpoint = %routes.login_endpoint,
            user_id = %identity.user_id,
            "Posting login exchange"
        );

        let response = self
            .http_client
            .post(routes.login_endpoint.clone())
            .header("X-Requested-With", REQUESTED_WITH)
            .form(&identity.form_fields())
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                warn!(error = %e, "Login exchange request failed");
                BridgeError::Transport(format!("Login exchange request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Login exchange answered with an error status");
            return Err(BridgeError::Transport(format!(
                "Login exchange failed: HTTP {}",
                status
            )));
        }

        let body = response.text().await.map_err(|e| {
            let e = e.without_url();
            warn!(error = %e, "Failed to read login exchange response");
            BridgeError::Transport(format!("Failed to read login exchange response: {}", e))
        })?;
        let result: ExchangeResult = serde_json::from_str(&body).map_err(|e| {
            warn!(error = %e, "Malformed login exchange response");
            BridgeError::Transport(format!("Malformed login exchange response: {}", e))
        })?;

        if !result.status {
            info!(user_id = %identity.user_id, "Login rejected by the firewall");
            return Err(BridgeError::LoginRejected);
        }

        let navigation = if result.is_registration() {
            info!(user_id = %identity.user_id, "Registered through the firewall");
            (self.callbacks.on_register)(routes, &result)
        } else {
            info!(user_id = %identity.user_id, "Logged in through the firewall");
            (self.callbacks.on_login)(routes, &result)
        };

        self.apply(&navigation);
        Ok((result, navigation))
    }

    /// End the firewall session.
    pub fn exchange_logout(&self, routes: &RouteConfig) -> Navigation {
        info!(endpoint = %routes.logout_endpoint, "Logging out of the firewall");
        let navigation = (self.callbacks.on_logout)(routes);
        self.apply(&navigation);
        navigation
    }

    fn apply(&self, navigation: &Navigation) {
        debug!(?navigation, "Applying navigation");
        self.navigator.navigate(navigation);
    }
}
