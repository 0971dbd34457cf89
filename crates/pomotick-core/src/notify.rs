//! Fire-and-forget notification sinks.
//!
//! A notification failure is logged and dropped; it never reaches the
//! timer.

use std::sync::Arc;

use tracing::{error, info};

use crate::error::NotifyError;
use crate::storage::NotificationsConfig;

pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str, timeout_secs: u32) -> Result<(), NotifyError>;
}

/// Writes notifications to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, message: &str, _timeout_secs: u32) -> Result<(), NotifyError> {
        info!(title, message, "notification");
        Ok(())
    }
}

/// Drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _title: &str, _message: &str, _timeout_secs: u32) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Native desktop notifications.
///
/// The platform call runs on its own thread so a slow notification
/// daemon never holds up the countdown.
#[cfg(feature = "desktop-notifications")]
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    app_name: String,
}

#[cfg(feature = "desktop-notifications")]
impl DesktopNotifier {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

#[cfg(feature = "desktop-notifications")]
impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, message: &str, timeout_secs: u32) -> Result<(), NotifyError> {
        let mut notification = notify_rust::Notification::new();
        notification
            .summary(title)
            .body(message)
            .appname(&self.app_name)
            .timeout(notify_rust::Timeout::Milliseconds(timeout_secs.saturating_mul(1000)));

        std::thread::Builder::new()
            .name("notify".into())
            .spawn(move || match notification.show() {
                Ok(_) => tracing::debug!("Notification sent successfully"),
                Err(e) => error!("Failed to send notification: {e}"),
            })
            .map(|_| ())
            .map_err(|e| NotifyError::Backend(e.to_string()))
    }
}

/// Pick a notifier for the given settings.
pub fn from_config(config: &NotificationsConfig) -> Arc<dyn Notifier> {
    if !config.enabled {
        return Arc::new(NullNotifier);
    }
    #[cfg(feature = "desktop-notifications")]
    {
        Arc::new(DesktopNotifier::new("pomotick"))
    }
    #[cfg(not(feature = "desktop-notifications"))]
    {
        Arc::new(LogNotifier)
    }
}

/// Send through `notifier`, logging and swallowing any failure.
/// Returns whether the notifier accepted the notification.
pub fn dispatch(notifier: &dyn Notifier, title: &str, message: &str, timeout_secs: u32) -> bool {
    info!("Sending notification: {title}");
    match notifier.notify(title, message, timeout_secs) {
        Ok(()) => true,
        Err(e) => {
            error!("Failed to send notification: {e}");
            false
        }
    }
}
