//! Notification dispatcher: recipient selection and payload construction.

use haggle_types::device::Device;
use haggle_types::message::Message;
use haggle_types::notification::{
    DeviceTargets, NotificationData, NotificationEventType, PushNotification,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::notify::sender::NotificationSender;

/// Longest body sent verbatim, in characters.
const BODY_MAX_CHARS: usize = 100;

/// Marker appended to a truncated body.
const ELLIPSIS: &str = "...";

/// What happened to a dispatch attempt. Never an error: failures are terminal
/// for the attempt and are only logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The sender was the only participant.
    NoRecipients,
    /// No recipient has a registered device.
    NoDevices,
    /// The sender accepted the notification for this many users and tokens.
    Sent { recipients: usize, tokens: usize },
    /// The sender reported an error.
    Failed,
}

/// Builds new-message notifications and hands them to a sender.
pub struct NotificationDispatcher<N: NotificationSender> {
    sender: N,
    title: String,
}

impl<N: NotificationSender> NotificationDispatcher<N> {
    /// Create a dispatcher that titles every new-message notification `title`.
    pub fn new(sender: N, title: impl Into<String>) -> Self {
        Self {
            sender,
            title: title.into(),
        }
    }

    /// Access the underlying sender.
    pub fn sender(&self) -> &N {
        &self.sender
    }

    /// Everyone in the conversation except the author, in participant order.
    pub fn recipients(sender_id: &Uuid, participant_ids: &[Uuid]) -> Vec<Uuid> {
        participant_ids
            .iter()
            .filter(|id| *id != sender_id)
            .copied()
            .collect()
    }

    /// Build the notification for a persisted message.
    pub fn build(&self, message: &Message) -> PushNotification {
        PushNotification {
            title: self.title.clone(),
            body: truncate_body(&message.content),
            data: NotificationData {
                conversation_id: message.conversation_id,
                sender_id: message.sender_id,
                event_type: NotificationEventType::ChatMessage,
            },
        }
    }

    /// Notify every participant except the author on the devices they have
    /// registered. `devices` may include other users' devices; only
    /// recipients' tokens are delivered to. Best effort; never fails.
    pub async fn dispatch(
        &self,
        message: &Message,
        participant_ids: &[Uuid],
        devices: &[Device],
    ) -> DispatchOutcome {
        let recipients = Self::recipients(&message.sender_id, participant_ids);
        if recipients.is_empty() {
            debug!(
                conversation_id = %message.conversation_id,
                message_id = %message.id,
                "No notification recipients"
            );
            return DispatchOutcome::NoRecipients;
        }

        let targets = DeviceTargets::from_devices(
            devices.iter().filter(|d| recipients.contains(&d.user_id)),
        );
        if targets.is_empty() {
            debug!(
                conversation_id = %message.conversation_id,
                message_id = %message.id,
                recipients = recipients.len(),
                "No registered devices for notification recipients"
            );
            return DispatchOutcome::NoDevices;
        }

        let notification = self.build(message);
        match self
            .sender
            .send_to_users(&recipients, &targets, &notification)
            .await
        {
            Ok(()) => {
                info!(
                    conversation_id = %message.conversation_id,
                    message_id = %message.id,
                    recipients = recipients.len(),
                    tokens = targets.len(),
                    "Push notification dispatched"
                );
                DispatchOutcome::Sent {
                    recipients: recipients.len(),
                    tokens: targets.len(),
                }
            }
            Err(e) => {
                warn!(
                    conversation_id = %message.conversation_id,
                    message_id = %message.id,
                    error = %e,
                    "Failed to send push notifications"
                );
                DispatchOutcome::Failed
            }
        }
    }
}

/// Cut a message body down to `BODY_MAX_CHARS` characters.
///
/// Bodies longer than the limit keep their first `BODY_MAX_CHARS - 3`
/// characters followed by `"..."`. Counting is per `char`, so multi-byte
/// characters are never split.
pub fn truncate_body(content: &str) -> String {
    if content.chars().count() <= BODY_MAX_CHARS {
        return content.to_string();
    }
    let kept: String = content
        .chars()
        .take(BODY_MAX_CHARS - ELLIPSIS.len())
        .collect();
    format!("{kept}{ELLIPSIS}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chrono::Utc;
    use haggle_types::device::DeviceType;
    use haggle_types::error::NotificationError;
    use haggle_types::message::MessageType;

    // --- Mock sender for testing ---

    #[derive(Default)]
    struct MockSender {
        calls: Mutex<Vec<(Vec<Uuid>, DeviceTargets, PushNotification)>>,
        fail: bool,
    }

    impl NotificationSender for MockSender {
        async fn send_to_users(
            &self,
            user_ids: &[Uuid],
            targets: &DeviceTargets,
            notification: &PushNotification,
        ) -> Result<(), NotificationError> {
            self.calls.lock().unwrap().push((
                user_ids.to_vec(),
                targets.clone(),
                notification.clone(),
            ));
            if self.fail {
                Err(NotificationError::Transport("connection refused".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn make_message(sender_id: Uuid, content: &str) -> Message {
        Message {
            id: Uuid::now_v7(),
            conversation_id: Uuid::now_v7(),
            sender_id,
            content: content.to_string(),
            message_type: MessageType::Text,
            media_url: None,
            is_read: false,
            created_at: Utc::now(),
        }
    }

    fn device(user_id: Uuid, token: &str, device_type: DeviceType) -> Device {
        Device {
            user_id,
            token: token.to_string(),
            device_type,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    // --- Tests ---

    #[test]
    fn test_truncate_body_short_is_verbatim() {
        assert_eq!(truncate_body("Hello"), "Hello");
    }

    #[test]
    fn test_truncate_body_exactly_limit_is_verbatim() {
        let content = "a".repeat(100);
        assert_eq!(truncate_body(&content), content);
    }

    #[test]
    fn test_truncate_body_over_limit() {
        let content = "b".repeat(101);
        let body = truncate_body(&content);
        assert_eq!(body.chars().count(), 100);
        assert!(body.ends_with("..."));
        assert_eq!(&body[..97], &content[..97]);
    }

    #[test]
    fn test_truncate_body_never_splits_multibyte() {
        let content = "ü".repeat(120);
        let body = truncate_body(&content);
        assert_eq!(body.chars().count(), 100);
        assert!(body.starts_with(&"ü".repeat(97)));
        assert!(body.ends_with("..."));
    }

    #[test]
    fn test_recipients_exclude_sender() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        let c = Uuid::now_v7();
        let recipients = NotificationDispatcher::<MockSender>::recipients(&a, &[a, b, c]);
        assert_eq!(recipients, vec![b, c]);
    }

    #[test]
    fn test_build_payload() {
        let dispatcher = NotificationDispatcher::new(MockSender::default(), "New Message");
        let msg = make_message(Uuid::now_v7(), "Is the car still available?");
        let notification = dispatcher.build(&msg);
        assert_eq!(notification.title, "New Message");
        assert_eq!(notification.body, "Is the car still available?");
        assert_eq!(notification.data.conversation_id, msg.conversation_id);
        assert_eq!(notification.data.sender_id, msg.sender_id);
        assert_eq!(notification.data.event_type, NotificationEventType::ChatMessage);
    }

    #[tokio::test]
    async fn test_dispatch_sends_to_others() {
        let dispatcher = NotificationDispatcher::new(MockSender::default(), "New Message");
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        let msg = make_message(a, "Hello");
        let devices = [device(b, "b-phone", DeviceType::Ios)];

        let outcome = dispatcher.dispatch(&msg, &[a, b], &devices).await;
        assert_eq!(outcome, DispatchOutcome::Sent { recipients: 1, tokens: 1 });

        let calls = dispatcher.sender().calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, vec![b]);
        assert_eq!(calls[0].1.tokens(DeviceType::Ios), ["b-phone"]);
        assert_eq!(calls[0].2.body, "Hello");
    }

    #[tokio::test]
    async fn test_dispatch_targets_only_recipient_devices() {
        let dispatcher = NotificationDispatcher::new(MockSender::default(), "New Message");
        let (a, b, stranger) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        let devices = [
            device(a, "author-phone", DeviceType::Android),
            device(b, "b-phone", DeviceType::Android),
            device(b, "b-browser", DeviceType::Web),
            device(stranger, "stranger-phone", DeviceType::Android),
        ];

        let outcome = dispatcher
            .dispatch(&make_message(a, "Hello"), &[a, b], &devices)
            .await;
        assert_eq!(outcome, DispatchOutcome::Sent { recipients: 1, tokens: 2 });

        let calls = dispatcher.sender().calls.lock().unwrap();
        let targets = &calls[0].1;
        assert_eq!(targets.tokens(DeviceType::Android), ["b-phone"]);
        assert_eq!(targets.tokens(DeviceType::Web), ["b-browser"]);
        assert!(!targets.contains("author-phone"));
        assert!(!targets.contains("stranger-phone"));
    }

    #[tokio::test]
    async fn test_dispatch_without_devices_skips_sender() {
        let dispatcher = NotificationDispatcher::new(MockSender::default(), "New Message");
        let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
        let devices = [device(a, "author-phone", DeviceType::Ios)];

        let outcome = dispatcher
            .dispatch(&make_message(a, "Hello"), &[a, b], &devices)
            .await;
        assert_eq!(outcome, DispatchOutcome::NoDevices);
        assert!(dispatcher.sender().calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_without_recipients_skips_sender() {
        let dispatcher = NotificationDispatcher::new(MockSender::default(), "New Message");
        let a = Uuid::now_v7();
        let msg = make_message(a, "talking to myself");

        let outcome = dispatcher
            .dispatch(&msg, &[a], &[device(a, "a-phone", DeviceType::Web)])
            .await;
        assert_eq!(outcome, DispatchOutcome::NoRecipients);
        assert!(dispatcher.sender().calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_failure_is_swallowed() {
        let sender = MockSender {
            fail: true,
            ..Default::default()
        };
        let dispatcher = NotificationDispatcher::new(sender, "New Message");
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();

        let devices = [device(b, "b-phone", DeviceType::Ios)];

        let outcome = dispatcher
            .dispatch(&make_message(a, "Hello"), &[a, b], &devices)
            .await;
        assert_eq!(outcome, DispatchOutcome::Failed);
        assert_eq!(dispatcher.sender().calls.lock().unwrap().len(), 1);
    }
}
