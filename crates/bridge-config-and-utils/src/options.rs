//! Raw, caller-supplied option bags.
//!
//! These mirror what a hosting page hands to the bridge before anything is
//! validated. Every recognized option is listed explicitly; validation and
//! defaulting happen when the reconciler's configuration holder accepts them.
//! The camelCase aliases accept the option names the JS SDK and the firewall
//! routing use.

use serde::{Deserialize, Serialize};

/// Default for the SDK `cookie` option.
pub const DEFAULT_COOKIE: bool = true;
/// Default for the SDK `status` option.
pub const DEFAULT_STATUS: bool = true;
/// Default for the SDK `xfbml` option.
pub const DEFAULT_XFBML: bool = true;
/// Default SDK locale.
pub const DEFAULT_LOCALE: &str = "fr_FR";
/// Logout automatically when the provider reports a disconnected user.
pub const DEFAULT_AUTO_LOGOUT: bool = true;

/// Provider SDK options, merged over the defaults above.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderOptions {
    /// Facebook application id (required).
    #[serde(default, alias = "appId", skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xfbml: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, alias = "autoLogout", skip_serializing_if = "Option::is_none")]
    pub auto_logout: Option<bool>,
}

impl ProviderOptions {
    /// Options carrying only an application id.
    pub fn with_app_id(app_id: impl Into<String>) -> Self {
        Self {
            app_id: Some(app_id.into()),
            ..Default::default()
        }
    }

    /// Overlay every option set in `other` on top of `self`.
    pub fn overlay(mut self, other: &ProviderOptions) -> Self {
        if other.app_id.is_some() {
            self.app_id = other.app_id.clone();
        }
        if other.cookie.is_some() {
            self.cookie = other.cookie;
        }
        if other.status.is_some() {
            self.status = other.status;
        }
        if other.xfbml.is_some() {
            self.xfbml = other.xfbml;
        }
        if other.locale.is_some() {
            self.locale = other.locale.clone();
        }
        if other.auto_logout.is_some() {
            self.auto_logout = other.auto_logout;
        }
        self
    }
}

/// Firewall endpoints the bridge talks to.
///
/// Endpoints may be absolute URLs, or paths resolved against `base_url`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteOptions {
    #[serde(default, alias = "baseUrl", skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Login-check endpoint receiving the provider identity.
    #[serde(default, alias = "loginCheck", skip_serializing_if = "Option::is_none")]
    pub login_endpoint: Option<String>,
    #[serde(default, alias = "logout", skip_serializing_if = "Option::is_none")]
    pub logout_endpoint: Option<String>,
    /// Where the user lands after a successful login.
    #[serde(default, alias = "target", skip_serializing_if = "Option::is_none")]
    pub target_endpoint: Option<String>,
    /// Login page, enabling the legacy login-page guard when set.
    #[serde(default, alias = "login", skip_serializing_if = "Option::is_none")]
    pub login_page: Option<String>,
}
