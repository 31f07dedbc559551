//! # Observability
//!
//! Centralized `tracing` setup for the Facebook session bridge.
//!
//! Components are **log producers** only. They call `observability::init()`
//! once at startup and use the standard `tracing` macros everywhere else.
//!
//! Two sinks are available:
//!
//! - a structured JSONL file (append-only, flushed per line), enabled when
//!   [`LogConfig::log_path`] is set;
//! - a compact human-readable stderr layer.
//!
//! Fields that carry provider credentials (`access_token`, `signed_request`,
//! ...) are redacted by the JSONL layer unless [`LogConfig::redact_secrets`]
//! is turned off.
//!
//! ## Usage
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init("fb-bridge");
//!     tracing::info!("bridge started");
//! }
//! ```
//!
//! Or with configuration:
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "fb-bridge".into(),
//!     default_level: "debug".into(),
//!     log_path: Some("/tmp/fb-bridge.jsonl".into()),
//!     also_stderr: true,
//!     ..Default::default()
//! });
//! ```

mod json_layer;
mod writer;

use std::io;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub use json_layer::{is_sensitive_field, JsonLayer, LogEntry, REDACTED};
pub use writer::{CentralLogWriter, WriterFactory};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service, included in every JSONL line.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// JSONL log file. When `None`, only the stderr layer is installed.
    pub log_path: Option<PathBuf>,

    /// Also emit compact logs to stderr when a log file is configured.
    pub also_stderr: bool,

    /// Replace credential-bearing fields with [`REDACTED`] in the JSONL output.
    pub redact_secrets: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
            redact_secrets: true,
        }
    }
}

/// Initialize the observability layer with default settings.
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize the observability layer with custom configuration.
///
/// Installing a second global subscriber is ignored, so tests and embedders
/// may call this more than once.
pub fn init_with_config(config: LogConfig) {
    let default_level = config.default_level.clone();
    let filter = move || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_level))
    };

    let Some(log_path) = config.log_path.clone() else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_target(true)
            .with_writer(io::stderr)
            .compact()
            .try_init();
        return;
    };

    let writer = match CentralLogWriter::new(&log_path) {
        Ok(writer) => writer,
        Err(e) => {
            eprintln!(
                "observability: failed to open log file {}: {}, falling back to stderr",
                log_path.display(),
                e
            );
            init_with_config(LogConfig {
                log_path: None,
                ..config
            });
            return;
        }
    };

    let json_layer = JsonLayer::new(
        config.service_name.clone(),
        WriterFactory::new(writer),
        config.redact_secrets,
    );

    let stderr_layer = config.also_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_writer(io::stderr)
            .with_filter(filter())
    });

    let installed = tracing_subscriber::registry()
        .with(json_layer.with_filter(filter()))
        .with(stderr_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(
            service = %config.service_name,
            log_path = %log_path.display(),
            "observability initialized"
        );
    }
}

/// Re-export tracing macros for convenience.
pub use tracing::{debug, error, info, instrument, trace, warn};

/// Re-export Level for advanced filtering.
pub use tracing::Level;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.service_name, "unknown");
        assert_eq!(config.default_level, "info");
        assert!(config.log_path.is_none());
        assert!(!config.also_stderr);
        assert!(config.redact_secrets);
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init("first");
        init("second");
    }
}
