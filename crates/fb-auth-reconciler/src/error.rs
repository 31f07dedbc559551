//! Bridge error types.

use thiserror::Error;

/// Bridge error type.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Missing or invalid configuration. Fatal to the load attempt.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An outbound request did not complete (network failure, non-2xx,
    /// malformed body). Request URLs are stripped from the message.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The login-check endpoint answered `status: false`
    #[error("Login rejected by the firewall")]
    LoginRejected,

    /// A status event with an unrecognized shape (soft, never fatal)
    #[error("Unexpected status event: {0}")]
    UnexpectedEvent(String),

    /// Invalid state transition in the page FSM
    #[error("Invalid page state transition: {0}")]
    InvalidStateTransition(String),

    /// URL parse error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file error
    #[error(transparent)]
    Core(#[from] bridge_config_and_utils::CoreError),
}

impl BridgeError {
    /// Returns true if the exchange request itself failed to complete.
    ///
    /// The page stays in its pre-exchange state; the user may retry the
    /// action that triggered the event.
    pub fn is_transport(&self) -> bool {
        matches!(self, BridgeError::Transport(_))
    }

    /// Returns true for configuration problems the caller must fix before `load`.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            BridgeError::Configuration(_) | BridgeError::InvalidUrl(_) | BridgeError::Core(_)
        )
    }

    pub(crate) fn missing(field: &str) -> Self {
        BridgeError::Configuration(format!("You must specify the {field}"))
    }
}

/// Result type alias using BridgeError.
pub type BridgeResult<T> = Result<T, BridgeError>;
