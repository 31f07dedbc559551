//! Errors raised while reading or writing the bridge configuration.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// `base_url` or `graph_api_url` is not an absolute URL
    #[error("Invalid URL in config: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Malformed `config.json`
    #[error("Invalid config file: {0}")]
    Json(#[from] serde_json::Error),

    /// No home directory to root `~/.fb-bridge` in
    #[error("Path error: {0}")]
    Path(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
