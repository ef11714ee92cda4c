// # Notifier Trait
//
// Fire-and-forget status messages. The engine calls `notify` after address
// resolution failures and after every delivery outcome, success or not.
// Implementations swallow their own errors (logging them) and must be a
// no-op when the settings are not enabled.

use async_trait::async_trait;

use crate::config::NotificationSettings;

/// Trait for notification sinks
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a human-readable message to the configured target
    async fn notify(&self, settings: &NotificationSettings, message: &str);
}

/// Notifier that drops every message
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _settings: &NotificationSettings, _message: &str) {}
}
