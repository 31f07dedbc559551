//! Page lifecycle state machine using rust-fsm.
//!
//! The reconciliation table itself is stateless; this machine tracks what the
//! current page is doing about it, so that an event arriving while an
//! exchange is in flight, or after the page has navigated away, does not
//! start a second exchange.
//!
//! ## State Diagram
//!
//! ```text
//! ┌─────────────────┐
//! │      Idle       │ (initial)
//! └───┬─────────┬───┘
//!     │         │ LogoutRequested
//!     │         ▼
//!     │   ┌─────────────────┐
//!     │   │   LoggingOut    │
//!     │   └────────┬────────┘
//!     │            │ LogoutDispatched
//!     │ LoginRequested        ▼
//!     ▼                 ┌─────────────────┐
//! ┌─────────────────┐   │    Navigated    │ (terminal)
//! │ ExchangingLogin │──►└─────────────────┘
//! └────────┬────────┘ LoginAccepted
//!          │ LoginRejected / TransportFailed
//!          ▼
//!         Idle
//! ```

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub page_machine(Idle)

    Idle => {
        LoginRequested => ExchangingLogin,
        LogoutRequested => LoggingOut
    },
    ExchangingLogin => {
        // The firewall opened a session and the page navigates away
        LoginAccepted => Navigated,
        // status: false, or a callback chose to stay on the page
        LoginRejected => Idle,
        TransportFailed => Idle
    },
    LoggingOut => {
        LogoutDispatched => Navigated,
        // The logout callback chose to stay, or the SDK logout never completed
        LogoutAborted => Idle
    }
}

pub use page_machine::Input as PageMachineInput;
pub use page_machine::State as PageMachineState;
pub use page_machine::StateMachine as PageMachine;

/// Page state for logging and callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageState {
    /// Waiting for status events.
    Idle,
    /// A login exchange request is in flight.
    ExchangingLogin,
    /// The logout navigation is being dispatched.
    LoggingOut,
    /// The page navigated away; no further reconciliation runs.
    Navigated,
}

impl PageState {
    /// Returns true while an exchange is in progress.
    pub fn is_busy(&self) -> bool {
        matches!(self, PageState::ExchangingLogin | PageState::LoggingOut)
    }

    /// Returns true once the page has navigated away.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PageState::Navigated)
    }

    /// Returns true if a new status event may start an exchange.
    pub fn accepts_events(&self) -> bool {
        matches!(self, PageState::Idle)
    }
}

impl From<&PageMachineState> for PageState {
    fn from(state: &PageMachineState) -> Self {
        match state {
            PageMachineState::Idle => PageState::Idle,
            PageMachineState::ExchangingLogin => PageState::ExchangingLogin,
            PageMachineState::LoggingOut => PageState::LoggingOut,
            PageMachineState::Navigated => PageState::Navigated,
        }
    }
}
