//! Configuration management for the bridge.

use crate::{CoreError, CoreResult, Paths, ProviderOptions, RouteOptions};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default timeout for the login exchange and profile requests.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

const ENV_LOG_LEVEL: &str = "FB_BRIDGE_LOG_LEVEL";
const ENV_APP_ID: &str = "FB_BRIDGE_APP_ID";
const ENV_BASE_URL: &str = "FB_BRIDGE_BASE_URL";

/// Bridge configuration file (`config.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Provider SDK options.
    #[serde(default)]
    pub provider: ProviderOptions,
    /// Firewall endpoints.
    #[serde(default)]
    pub routes: RouteOptions,
    /// Timeout applied to every outbound HTTP request.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    /// Graph API base URL used for profile enrichment. Enrichment is off when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_api_url: Option<String>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_http_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            provider: ProviderOptions::default(),
            routes: RouteOptions::default(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            graph_api_url: None,
        }
    }
}

impl Config {
    /// Load configuration from the config file, falling back to defaults,
    /// then apply environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            tracing::debug!(path = %config_path.display(), "No config file, using defaults");
            Self::default()
        };

        config.load_from_env();
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    fn load_from_env(&mut self) {
        self.apply_env(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an environment lookup. Blank values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(log_level) = read(ENV_LOG_LEVEL) {
            self.log_level = log_level;
        }
        if let Some(app_id) = read(ENV_APP_ID) {
            self.provider.app_id = Some(app_id);
        }
        if let Some(base_url) = read(ENV_BASE_URL) {
            self.routes.base_url = Some(base_url);
        }
    }

    /// Get the Graph API URL as a parsed URL, if configured.
    pub fn graph_api_url(&self) -> CoreResult<Option<Url>> {
        self.graph_api_url
            .as_deref()
            .map(|raw| Url::parse(raw).map_err(CoreError::from))
            .transpose()
    }

    /// Timeout applied to outbound HTTP requests.
    pub fn http_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.http_timeout_secs)
    }
}
