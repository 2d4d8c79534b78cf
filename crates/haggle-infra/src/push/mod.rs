//! Push notification senders.
//!
//! `ConfiguredSender` picks the delivery backend from `NotificationSettings`:
//! an HTTP push gateway when a URL is configured, otherwise a log-only sender
//! that accepts every notification.

pub mod http;

use haggle_core::notify::NotificationSender;
use haggle_types::config::NotificationSettings;
use haggle_types::error::NotificationError;
use haggle_types::notification::{DeviceTargets, PushNotification};
use uuid::Uuid;

pub use http::HttpPushSender;

/// Sender selected at startup from configuration.
pub enum ConfiguredSender {
    Http(HttpPushSender),
    /// No gateway configured; notifications are logged and dropped.
    Disabled,
}

impl ConfiguredSender {
    /// Build the sender described by `settings`.
    pub fn from_settings(settings: &NotificationSettings) -> Result<Self, NotificationError> {
        match settings.push_gateway_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => {
                tracing::info!(gateway = %url, "Push gateway configured");
                Ok(Self::Http(HttpPushSender::new(url, settings.timeout_secs)?))
            }
            _ => {
                tracing::info!("No push gateway configured, notifications will only be logged");
                Ok(Self::Disabled)
            }
        }
    }
}

impl NotificationSender for ConfiguredSender {
    async fn send_to_users(
        &self,
        user_ids: &[Uuid],
        targets: &DeviceTargets,
        notification: &PushNotification,
    ) -> Result<(), NotificationError> {
        match self {
            Self::Http(sender) => sender.send_to_users(user_ids, targets, notification).await,
            Self::Disabled => {
                tracing::info!(
                    recipients = user_ids.len(),
                    tokens = targets.len(),
                    conversation_id = %notification.data.conversation_id,
                    title = %notification.title,
                    "Push delivery disabled, notification dropped"
                );
                Ok(())
            }
        }
    }
}
