//! A provider SDK that replays scripted status events.

use fb_auth_reconciler::{DoneCallback, EventCallback, ProviderConfig, ProviderSdk, StatusEvent};
use parking_lot::Mutex;
use tracing::{debug, info};
use url::Url;

/// Stands in for the browser SDK: records the load and replays a fixed list
/// of status events to its subscribers.
pub struct ScriptedSdk {
    script: Vec<(String, StatusEvent)>,
    initialized: Mutex<bool>,
    subscriptions: Mutex<Vec<(String, EventCallback)>>,
}

impl ScriptedSdk {
    pub fn new(script: Vec<(String, StatusEvent)>) -> Self {
        Self {
            script,
            initialized: Mutex::new(false),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    pub fn is_initialized(&self) -> bool {
        *self.initialized.lock()
    }

    /// Fire every scripted event at the matching subscribers.
    ///
    /// Returns the number of callbacks invoked.
    pub fn replay(&self) -> usize {
        let mut fired = 0;
        for (name, event) in &self.script {
            let callbacks: Vec<EventCallback> = self
                .subscriptions
                .lock()
                .iter()
                .filter(|(subscribed, _)| subscribed == name)
                .map(|(_, callback)| callback.clone())
                .collect();

            debug!(
                event = %name,
                status = %event.status,
                listeners = callbacks.len(),
                "Replaying status event"
            );
            for callback in callbacks {
                callback(event);
                fired += 1;
            }
        }
        fired
    }
}

impl ProviderSdk for ScriptedSdk {
    fn inject_script(&self, container_id: &str, script_url: &Url) {
        info!(container = container_id, script = %script_url, "SDK script injected");
    }

    fn init(&self, config: &ProviderConfig) {
        info!(app_id = %config.app_id, locale = %config.locale, "SDK initialized");
        *self.initialized.lock() = true;
    }

    fn subscribe(&self, event_name: &str, callback: EventCallback) {
        debug!(event = event_name, "SDK subscription registered");
        self.subscriptions
            .lock()
            .push((event_name.to_string(), callback));
    }

    /// Answers with the last scripted status, if any.
    fn get_login_status(&self, callback: EventCallback) {
        match self.script.last() {
            Some((_, event)) => {
                debug!(status = %event.status, "Answering login status");
                callback(event);
            }
            None => debug!("No login status scripted"),
        }
    }

    fn logout(&self, done: DoneCallback) {
        info!("SDK logout");
        done();
    }
}
