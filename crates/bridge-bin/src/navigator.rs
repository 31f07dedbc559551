//! Navigator that reports navigations instead of performing them.

use fb_auth_reconciler::{Navigation, Navigator};
use parking_lot::Mutex;
use tracing::info;

#[derive(Default)]
pub struct ReportingNavigator {
    navigations: Mutex<Vec<Navigation>>,
}

impl ReportingNavigator {
    pub fn navigations(&self) -> Vec<Navigation> {
        self.navigations.lock().clone()
    }
}

impl Navigator for ReportingNavigator {
    fn navigate(&self, navigation: &Navigation) {
        info!(?navigation, "Navigation requested");
        self.navigations.lock().push(navigation.clone());
    }
}

/// One-line description of a navigation.
pub fn describe(navigation: &Navigation) -> String {
    match navigation {
        Navigation::Redirect(url) => format!("redirect {}", url),
        Navigation::Reload => "reload".to_string(),
        Navigation::Stay => "stay".to_string(),
    }
}
