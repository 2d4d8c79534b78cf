//! HTTP push gateway client.
//!
//! POSTs one JSON request per notification to the configured gateway, which
//! owns provider delivery (APNs, FCM, web push). Device tokens are resolved
//! from `user_devices` before the call and grouped by platform:
//!
//! ```json
//! {"user_ids": ["..."], "tokens": {"android": ["..."], "ios": ["..."]},
//!  "title": "New Message", "body": "...",
//!  "data": {"conversation_id": "...", "sender_id": "...", "type": "chat_message"}}
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use haggle_core::notify::NotificationSender;
use haggle_types::error::NotificationError;
use haggle_types::notification::{DeviceTargets, PushNotification};
use serde::Serialize;
use uuid::Uuid;

/// Longest gateway error body kept in a `Rejected` error.
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Serialize)]
struct PushRequest<'a> {
    user_ids: &'a [Uuid],
    tokens: &'a DeviceTargets,
    title: &'a str,
    body: &'a str,
    data: BTreeMap<String, String>,
}

impl<'a> PushRequest<'a> {
    fn new(
        user_ids: &'a [Uuid],
        tokens: &'a DeviceTargets,
        notification: &'a PushNotification,
    ) -> Self {
        Self {
            user_ids,
            tokens,
            title: &notification.title,
            body: &notification.body,
            data: notification.data.to_map(),
        }
    }
}

/// Sender backed by an HTTP push gateway.
pub struct HttpPushSender {
    client: reqwest::Client,
    url: String,
}

impl HttpPushSender {
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .map_err(|e| NotificationError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl NotificationSender for HttpPushSender {
    async fn send_to_users(
        &self,
        user_ids: &[Uuid],
        targets: &DeviceTargets,
        notification: &PushNotification,
    ) -> Result<(), NotificationError> {
        let payload = PushRequest::new(user_ids, targets, notification);

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(
                status = status.as_u16(),
                recipients = user_ids.len(),
                tokens = targets.len(),
                "Push gateway accepted"
            );
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let body: String = body.chars().take(MAX_ERROR_BODY).collect();
        Err(NotificationError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
