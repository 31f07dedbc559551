//! The "is this session authenticated" page fragment.
//!
//! Pages embed it so the bridge can be seeded with the server-side session
//! state before any status event arrives.

use crate::{BridgeError, BridgeResult};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Rendering format of the fragment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExposeFormat {
    #[default]
    Js,
    Json,
}

impl ExposeFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExposeFormat::Js => "js",
            ExposeFormat::Json => "json",
        }
    }
}

impl fmt::Display for ExposeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExposeFormat {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "js" => Ok(ExposeFormat::Js),
            "json" => Ok(ExposeFormat::Json),
            other => Err(BridgeError::Configuration(format!(
                "Unsupported fragment format: {:?}",
                other
            ))),
        }
    }
}

#[derive(Deserialize)]
struct AuthenticatedFlag {
    authenticated: bool,
}

/// Render the fragment for a session.
pub fn render_authenticated(authenticated: bool, format: ExposeFormat) -> String {
    match format {
        ExposeFormat::Js => format!("var authenticated = {};", authenticated),
        ExposeFormat::Json => format!("{{\"authenticated\":{}}}", authenticated),
    }
}

/// Read the flag back from the JSON fragment.
pub fn parse_authenticated(body: &str) -> BridgeResult<bool> {
    let flag: AuthenticatedFlag = serde_json::from_str(body)?;
    Ok(flag.authenticated)
}
