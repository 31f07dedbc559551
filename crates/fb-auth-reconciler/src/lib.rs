//! Facebook login bridge for a session-based firewall.
//!
//! This crate provides:
//! - A validated configuration holder for SDK options and firewall endpoints
//! - A FIFO event queue buffering SDK subscriptions until the SDK is ready
//! - A pure reconciliation table mapping SDK status events to login/logout
//! - An explicit FSM-based page lifecycle suppressing duplicate exchanges
//! - The remote login/logout exchange with the firewall
//! - The session user record and the "is authenticated" page fragment

mod config_holder;
mod error;
mod event;
mod event_queue;
mod exchange;
mod expose;
mod manager;
mod page_fsm;
mod profile;
mod provider;
mod reconcile;
mod user;

pub use config_holder::{ConfigHolder, ProviderConfig, RouteConfig, SDK_CONTAINER_ID};
pub use error::{BridgeError, BridgeResult};
pub use event::{AuthResponse, ConnectionStatus, StatusEvent, AUTH_RESPONSE_CHANGE};
pub use event_queue::{EventQueue, PendingEvent, QueueState};
pub use exchange::{
    ExchangeCallbacks, ExchangeProcess, ExchangeResult, LoginCallback, LoginIdentity,
    LogoutCallback, RemoteExchange,
};
pub use expose::{parse_authenticated, render_authenticated, ExposeFormat};
pub use manager::{FacebookAuthManager, Outcome};
pub use page_fsm::page_machine;
pub use page_fsm::{PageMachine, PageMachineInput, PageMachineState, PageState};
pub use profile::{
    GraphProfileFetcher, NoProfileFetch, ProfileFetcher, ProfileFields, DEFAULT_GRAPH_API_URL,
};
pub use provider::{DoneCallback, EventCallback, Navigation, Navigator, ProviderSdk};
pub use reconcile::{reconcile, Decision, LoginPageGuard, NoOpReason};
pub use user::SessionUser;
