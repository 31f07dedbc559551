//! Logging initialization for the bridge.
//!
//! Thin wrapper over the observability crate so every binary sets up tracing
//! the same way.

use observability::LogConfig;
use std::path::PathBuf;

const SERVICE_NAME: &str = "fb-bridge";
const ENV_LOG_FILE: &str = "FB_BRIDGE_LOG_FILE";

/// Initialize the logging system.
///
/// Compact logs always go to stderr. When `log_file` is given, or
/// `FB_BRIDGE_LOG_FILE` is set (it takes precedence), structured JSONL is
/// also appended to that file with credentials redacted.
///
/// # Example
///
/// ```ignore
/// init_logging("info", Some(paths.log_file()));
/// tracing::info!("bridge started");
/// ```
pub fn init_logging(level: &str, log_file: Option<PathBuf>) {
    let log_path = resolve_log_file(|name| std::env::var(name).ok(), log_file);

    observability::init_with_config(LogConfig {
        service_name: SERVICE_NAME.into(),
        default_level: parse_level(level).to_string().to_ascii_lowercase(),
        also_stderr: log_path.is_some(),
        log_path,
        ..Default::default()
    });
}

fn resolve_log_file(
    lookup: impl Fn(&str) -> Option<String>,
    fallback: Option<PathBuf>,
) -> Option<PathBuf> {
    lookup(ENV_LOG_FILE)
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
        .or(fallback)
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
