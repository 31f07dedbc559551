//! Configuration, option bags, paths and logging for the Facebook session bridge.

mod config;
mod error;
mod logging;
mod options;
mod paths;

pub use config::{Config, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_LOG_LEVEL};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use options::{
    ProviderOptions, RouteOptions, DEFAULT_AUTO_LOGOUT, DEFAULT_COOKIE, DEFAULT_LOCALE,
    DEFAULT_STATUS, DEFAULT_XFBML,
};
pub use paths::Paths;
