//! Seams to the collaborators living outside the bridge: the provider SDK and
//! the page hosting it.

use crate::{ProviderConfig, StatusEvent};
use std::sync::Arc;
use url::Url;

/// Callback registered for an SDK event.
pub type EventCallback = Arc<dyn Fn(&StatusEvent) + Send + Sync>;

/// One-shot completion callback for SDK calls without a payload.
pub type DoneCallback = Box<dyn FnOnce() + Send>;

/// The provider SDK as seen by the bridge.
///
/// Implementations wrap the real SDK (script tag, `FB.init`,
/// `FB.Event.subscribe`) or a test double.
pub trait ProviderSdk: Send + Sync {
    /// Start loading the SDK script into the container element.
    ///
    /// Loading is asynchronous: the host reports completion through
    /// [`FacebookAuthManager::on_sdk_ready`](crate::FacebookAuthManager::on_sdk_ready).
    fn inject_script(&self, container_id: &str, script_url: &Url);

    /// Initialize the loaded SDK with the provider options.
    fn init(&self, config: &ProviderConfig);

    /// Native event subscription.
    fn subscribe(&self, event_name: &str, callback: EventCallback);

    /// Ask the SDK for the current connection status, bypassing its cache
    /// (`FB.getLoginStatus(cb, true)`).
    fn get_login_status(&self, callback: EventCallback);

    /// End the provider session (`FB.logout`). `done` runs once the SDK has
    /// logged the user out; an SDK that cannot log out drops it.
    fn logout(&self, done: DoneCallback);
}

/// What the page should do after an exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Navigate to another URL.
    Redirect(Url),
    /// Reload the current page.
    Reload,
    /// Leave the page as it is.
    Stay,
}

impl Navigation {
    /// Whether applying this navigation ends the current page.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Navigation::Stay)
    }
}

/// Applies navigations to the hosting page.
pub trait Navigator: Send + Sync {
    fn navigate(&self, navigation: &Navigation);
}
