//! Validated configuration holder.
//!
//! Raw option bags from [`bridge_config_and_utils`] are validated eagerly and
//! merged over the defaults. Once the SDK load has started the holder is
//! locked and every further mutation is refused.

use crate::{BridgeError, BridgeResult};
use bridge_config_and_utils::{
    ProviderOptions, RouteOptions, DEFAULT_AUTO_LOGOUT, DEFAULT_COOKIE, DEFAULT_LOCALE,
    DEFAULT_STATUS, DEFAULT_XFBML,
};
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

/// Id of the element the SDK script is loaded into.
pub const SDK_CONTAINER_ID: &str = "fb-root";

const SDK_SCRIPT_HOST: &str = "https://connect.facebook.net";

/// Provider SDK options after validation.
///
/// Serializes to the object passed to `FB.init`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    pub app_id: String,
    pub cookie: bool,
    pub status: bool,
    pub xfbml: bool,
    pub locale: String,
    /// Not an SDK option: drives the logout branch of the reconciliation.
    #[serde(skip)]
    pub auto_logout: bool,
    #[serde(skip)]
    script_url: Url,
}

impl ProviderConfig {
    /// Validate options, filling every unset field with its default.
    pub fn from_options(options: &ProviderOptions) -> BridgeResult<Self> {
        let app_id = options
            .app_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| BridgeError::missing("facebook application ID (app_id)"))?
            .to_string();

        let locale = options
            .locale
            .clone()
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string());
        if locale.is_empty() || !locale.chars().all(|c| c.is_ascii_alphabetic() || c == '_') {
            return Err(BridgeError::Configuration(format!(
                "Invalid SDK locale: {:?}",
                locale
            )));
        }
        let script_url = Url::parse(&format!("{}/{}/all.js", SDK_SCRIPT_HOST, locale))?;

        Ok(Self {
            app_id,
            cookie: options.cookie.unwrap_or(DEFAULT_COOKIE),
            status: options.status.unwrap_or(DEFAULT_STATUS),
            xfbml: options.xfbml.unwrap_or(DEFAULT_XFBML),
            locale,
            auto_logout: options.auto_logout.unwrap_or(DEFAULT_AUTO_LOGOUT),
            script_url,
        })
    }

    /// SDK script location, derived from the locale.
    pub fn script_url(&self) -> &Url {
        &self.script_url
    }
}

/// Firewall endpoints after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteConfig {
    pub login_endpoint: Url,
    pub logout_endpoint: Url,
    pub target_endpoint: Url,
    pub login_page: Option<Url>,
}

impl RouteConfig {
    /// Validate routes. A missing endpoint is reported by name.
    pub fn from_options(options: &RouteOptions) -> BridgeResult<Self> {
        let base = options
            .base_url
            .as_deref()
            .map(|raw| {
                Url::parse(raw).map_err(|e| {
                    BridgeError::Configuration(format!("Invalid base_url {:?}: {}", raw, e))
                })
            })
            .transpose()?;

        let required = |value: &Option<String>, field: &str| -> BridgeResult<Url> {
            let raw = value
                .as_deref()
                .filter(|raw| !raw.trim().is_empty())
                .ok_or_else(|| BridgeError::missing(field))?;
            resolve_endpoint(raw, base.as_ref(), field)
        };

        Ok(Self {
            login_endpoint: required(&options.login_endpoint, "login_endpoint")?,
            logout_endpoint: required(&options.logout_endpoint, "logout_endpoint")?,
            target_endpoint: required(&options.target_endpoint, "target_endpoint")?,
            login_page: options
                .login_page
                .as_deref()
                .filter(|raw| !raw.trim().is_empty())
                .map(|raw| resolve_endpoint(raw, base.as_ref(), "login_page"))
                .transpose()?,
        })
    }
}

fn resolve_endpoint(raw: &str, base: Option<&Url>, field: &str) -> BridgeResult<Url> {
    match (Url::parse(raw), base) {
        (Ok(url), _) => Ok(url),
        (Err(url::ParseError::RelativeUrlWithoutBase), Some(base)) => base
            .join(raw)
            .map_err(|e| BridgeError::Configuration(format!("Invalid {} {:?}: {}", field, raw, e))),
        (Err(url::ParseError::RelativeUrlWithoutBase), None) => Err(BridgeError::Configuration(
            format!("The {} {:?} is relative but no base_url is set", field, raw),
        )),
        (Err(e), _) => Err(BridgeError::Configuration(format!(
            "Invalid {} {:?}: {}",
            field, raw, e
        ))),
    }
}

/// Holds provider options and routes for one page session.
#[derive(Debug, Default)]
pub struct ConfigHolder {
    options: ProviderOptions,
    provider: Option<ProviderConfig>,
    routes: Option<RouteConfig>,
    locked: bool,
}

impl ConfigHolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `options` over the current options and defaults.
    ///
    /// On error the previously accepted configuration is left untouched.
    pub fn configure(&mut self, options: &ProviderOptions) -> BridgeResult<&ProviderConfig> {
        self.ensure_unlocked("configure")?;

        if options
            .app_id
            .as_deref()
            .map_or(true, |id| id.trim().is_empty())
        {
            warn!("configure called without a facebook application ID");
            return Err(BridgeError::missing("facebook application ID (app_id)"));
        }

        let merged = self.options.clone().overlay(options);
        let provider = ProviderConfig::from_options(&merged)?;
        debug!(
            app_id = %provider.app_id,
            locale = %provider.locale,
            auto_logout = provider.auto_logout,
            "Provider options configured"
        );

        self.options = merged;
        Ok(&*self.provider.insert(provider))
    }

    /// Validate and store the firewall routes.
    pub fn set_routes(&mut self, routes: &RouteOptions) -> BridgeResult<&RouteConfig> {
        self.ensure_unlocked("set_routes")?;

        let routes = RouteConfig::from_options(routes).inspect_err(|e| {
            warn!(error = %e, "Rejected firewall routes");
        })?;
        debug!(
            login = %routes.login_endpoint,
            logout = %routes.logout_endpoint,
            target = %routes.target_endpoint,
            "Firewall routes configured"
        );

        Ok(&*self.routes.insert(routes))
    }

    /// True iff the application id and all three endpoints are set.
    pub fn is_ready(&self) -> bool {
        self.provider.is_some() && self.routes.is_some()
    }

    /// Freeze the configuration for the SDK load.
    pub fn lock(&mut self) -> BridgeResult<(ProviderConfig, RouteConfig)> {
        if self.locked {
            return Err(BridgeError::Configuration(
                "The SDK load has already been started".to_string(),
            ));
        }

        let (Some(provider), Some(routes)) = (&self.provider, &self.routes) else {
            return Err(BridgeError::Configuration(
                "The bridge is not ready to be loaded. You must specify all mandatory routes & options."
                    .to_string(),
            ));
        };

        let snapshot = (provider.clone(), routes.clone());
        self.locked = true;
        Ok(snapshot)
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn provider(&self) -> Option<&ProviderConfig> {
        self.provider.as_ref()
    }

    pub fn routes(&self) -> Option<&RouteConfig> {
        self.routes.as_ref()
    }

    fn ensure_unlocked(&self, operation: &str) -> BridgeResult<()> {
        if self.locked {
            warn!(operation, "Configuration is immutable once the SDK load has started");
            return Err(BridgeError::Configuration(format!(
                "Cannot {} once the SDK load has started",
                operation
            )));
        }
        Ok(())
    }
}
