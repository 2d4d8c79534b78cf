//! End-to-end ChatService tests over the SQLite store.

use std::time::Duration;

use chrono::Utc;
use haggle_core::chat::ChatService;
use haggle_core::notify::{NotificationDispatcher, NotificationSender};
use haggle_infra::sqlite::{DatabasePool, SqliteChatStore};
use haggle_infra::sqlite::pool::database_url;
use haggle_types::config::ChatSettings;
use haggle_types::conversation::{ConversationMetadata, CreateConversationRequest};
use haggle_types::device::DeviceType;
use haggle_types::error::{ChatError, NotificationError};
use haggle_types::message::{InboundMessage, MessageType};
use haggle_types::notification::{DeviceTargets, PushNotification};
use tokio::sync::mpsc;
use uuid::Uuid;

/// One delivery attempt as seen by the sender.
struct Delivery {
    user_ids: Vec<Uuid>,
    targets: DeviceTargets,
    notification: PushNotification,
}

/// Forwards every delivery attempt to a channel; optionally fails after forwarding.
struct ChannelSender {
    tx: mpsc::UnboundedSender<Delivery>,
    fail: bool,
}

impl NotificationSender for ChannelSender {
    async fn send_to_users(
        &self,
        user_ids: &[Uuid],
        targets: &DeviceTargets,
        notification: &PushNotification,
    ) -> Result<(), NotificationError> {
        let _ = self.tx.send(Delivery {
            user_ids: user_ids.to_vec(),
            targets: targets.clone(),
            notification: notification.clone(),
        });
        if self.fail {
            return Err(NotificationError::Rejected {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(())
    }
}

type Service = ChatService<SqliteChatStore, ChannelSender>;

async fn service_with(fail: bool) -> (Service, mpsc::UnboundedReceiver<Delivery>) {
    let dir = tempfile::tempdir().unwrap();
    let url = database_url(dir.path());
    // Leak tempdir so it lives for the test
    std::mem::forget(dir);
    let pool = DatabasePool::new(&url).await.unwrap();

    let (tx, rx) = mpsc::unbounded_channel();
    let dispatcher = NotificationDispatcher::new(ChannelSender { tx, fail }, "New Message");
    let settings = ChatSettings {
        default_page_size: 2,
        max_page_size: 10,
        max_conversation_list: 5,
    };
    (
        ChatService::new(SqliteChatStore::new(pool), dispatcher, settings),
        rx,
    )
}

fn open(a: Uuid, b: Uuid, item_id: Option<Uuid>) -> CreateConversationRequest {
    CreateConversationRequest {
        participant_ids: vec![a, b],
        item_id,
        item_title: "Car-123".to_string(),
        item_owner_id: None,
        metadata: ConversationMetadata::default(),
    }
}

fn inbound(conversation_id: Uuid, sender_id: Uuid, content: &str) -> InboundMessage {
    InboundMessage {
        conversation_id,
        sender_id,
        content: content.to_string(),
        message_type: MessageType::Text,
        media_url: None,
        timestamp: Utc::now(),
    }
}

async fn next_delivery(rx: &mut mpsc::UnboundedReceiver<Delivery>) -> Delivery {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("notification not dispatched in time")
        .expect("channel closed")
}

#[tokio::test]
async fn buyer_messages_seller_about_listing() {
    let (service, mut rx) = service_with(false).await;
    let (seller, buyer) = (Uuid::now_v7(), Uuid::now_v7());
    let item = Uuid::now_v7();

    service.register_device(seller, "seller-phone", DeviceType::Ios).await.unwrap();

    let conversation = service.start_conversation(open(seller, buyer, Some(item))).await.unwrap();
    assert_eq!(conversation.item_owner_id, Some(seller));

    let again = service.start_conversation(open(buyer, seller, Some(item))).await.unwrap();
    assert_eq!(again.id, conversation.id);

    let message = service
        .send_message(inbound(conversation.id, buyer, "Hello"))
        .await
        .unwrap();
    assert!(!message.is_read);

    let delivery = next_delivery(&mut rx).await;
    assert_eq!(delivery.user_ids, vec![seller]);
    assert_eq!(delivery.targets.tokens(DeviceType::Ios), ["seller-phone"]);
    let notification = delivery.notification;
    assert_eq!(notification.title, "New Message");
    assert_eq!(notification.body, "Hello");
    assert_eq!(notification.data.conversation_id, conversation.id);
    assert_eq!(notification.data.sender_id, buyer);

    assert_eq!(service.unread_count(&seller, &conversation.id).await.unwrap(), 1);
    assert_eq!(service.unread_count(&buyer, &conversation.id).await.unwrap(), 0);

    let inbox = service.list_conversations(&seller, None, 0).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].unread_count, 1);
    assert_eq!(inbox[0].counterpart.as_ref().unwrap().user_id, buyer);
    assert_eq!(inbox[0].last_message.as_ref().unwrap().content, "Hello");
    assert_eq!(inbox[0].last_message_at, Some(message.created_at));

    service
        .mark_read(&seller, &conversation.id, &message.id.to_string())
        .await
        .unwrap();
    assert_eq!(service.unread_count(&seller, &conversation.id).await.unwrap(), 0);

    let reloaded = service.get_conversation(&conversation.id).await.unwrap();
    let pointer = reloaded
        .participants
        .iter()
        .find(|p| p.user_id == seller)
        .and_then(|p| p.last_read_message_id);
    assert_eq!(pointer, Some(message.id));

    let seller_inbox = service.list_conversations(&seller, None, 0).await.unwrap();
    assert_eq!(seller_inbox[0].unread_count, 0);
    let buyer_inbox = service.list_conversations(&buyer, None, 0).await.unwrap();
    assert_eq!(buyer_inbox.len(), 1);
    assert_eq!(buyer_inbox[0].unread_count, 0);
    assert_eq!(buyer_inbox[0].counterpart.as_ref().unwrap().user_id, seller);
}

#[tokio::test]
async fn notifications_target_registered_devices_only() {
    let (service, mut rx) = service_with(false).await;
    let (seller, buyer, bystander) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());

    service.register_device(seller, "seller-phone", DeviceType::Android).await.unwrap();
    service.register_device(seller, "seller-browser", DeviceType::Web).await.unwrap();
    service.register_device(buyer, "buyer-phone", DeviceType::Android).await.unwrap();
    service.register_device(bystander, "bystander-phone", DeviceType::Android).await.unwrap();

    let conversation = service.start_conversation(open(seller, buyer, None)).await.unwrap();
    service.send_message(inbound(conversation.id, buyer, "Hi")).await.unwrap();

    let delivery = next_delivery(&mut rx).await;
    assert_eq!(delivery.user_ids, vec![seller]);
    assert_eq!(delivery.targets.tokens(DeviceType::Android), ["seller-phone"]);
    assert_eq!(delivery.targets.tokens(DeviceType::Web), ["seller-browser"]);
    assert!(!delivery.targets.contains("buyer-phone"));
    assert!(!delivery.targets.contains("bystander-phone"));

    // No seller devices left, so this one is never handed to the sender.
    service.unregister_device(&seller, "seller-phone").await.unwrap();
    service.unregister_device(&seller, "seller-browser").await.unwrap();
    service.send_message(inbound(conversation.id, buyer, "Hello?")).await.unwrap();

    // Next delivery is the reply to the buyer
    service.send_message(inbound(conversation.id, seller, "Yes")).await.unwrap();
    let delivery = next_delivery(&mut rx).await;
    assert_eq!(delivery.user_ids, vec![buyer]);
    assert_eq!(delivery.targets.tokens(DeviceType::Android), ["buyer-phone"]);
    assert_eq!(delivery.notification.body, "Yes");
}

#[tokio::test]
async fn long_message_body_is_truncated() {
    let (service, mut rx) = service_with(false).await;
    let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
    service.register_device(b, "b-phone", DeviceType::Web).await.unwrap();
    let conversation = service.start_conversation(open(a, b, None)).await.unwrap();

    let long = "é".repeat(150);
    service.send_message(inbound(conversation.id, a, &long)).await.unwrap();

    let body = next_delivery(&mut rx).await.notification.body;
    assert_eq!(body.chars().count(), 100);
    assert!(body.ends_with("..."));
}

#[tokio::test]
async fn failing_sender_does_not_fail_send() {
    let (service, mut rx) = service_with(true).await;
    let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
    service.register_device(b, "b-phone", DeviceType::Android).await.unwrap();
    let conversation = service.start_conversation(open(a, b, None)).await.unwrap();

    let message = service
        .send_message(inbound(conversation.id, a, "Still for sale?"))
        .await
        .unwrap();

    // Delivery was attempted and failed; the message is stored regardless.
    next_delivery(&mut rx).await;
    let page = service.get_history(&conversation.id, 1, None).await.unwrap();
    assert_eq!(page.messages[0].id, message.id);
}

#[tokio::test]
async fn start_conversation_validation() {
    let (service, _rx) = service_with(false).await;
    let a = Uuid::now_v7();

    let solo = service.start_conversation(open(a, a, None)).await;
    assert!(matches!(solo, Err(ChatError::Validation(_))));

    let mut long_title = open(a, Uuid::now_v7(), None);
    long_title.item_title = "x".repeat(256);
    assert!(matches!(
        service.start_conversation(long_title).await,
        Err(ChatError::Validation(_))
    ));

    let mut future_schema = open(a, Uuid::now_v7(), None);
    future_schema.metadata.schema_version = 2;
    assert!(matches!(
        service.start_conversation(future_schema).await,
        Err(ChatError::Validation(_))
    ));
}

#[tokio::test]
async fn send_to_missing_conversation_is_not_found() {
    let (service, _rx) = service_with(false).await;
    let result = service
        .send_message(inbound(Uuid::now_v7(), Uuid::now_v7(), "hi"))
        .await;
    assert!(matches!(result, Err(ChatError::NotFound(what)) if what == "conversation"));
}

#[tokio::test]
async fn history_pages_newest_first() {
    let (service, _rx) = service_with(false).await;
    let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
    let conversation = service.start_conversation(open(a, b, None)).await.unwrap();

    for content in ["one", "two", "three"] {
        service.send_message(inbound(conversation.id, a, content)).await.unwrap();
    }

    let first = service.get_history(&conversation.id, 1, None).await.unwrap();
    assert_eq!(first.page_size, 2);
    assert_eq!(first.total_count, 3);
    let contents: Vec<&str> = first.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["three", "two"]);

    let second = service.get_history(&conversation.id, 2, None).await.unwrap();
    assert_eq!(second.messages.len(), 1);
    assert_eq!(second.messages[0].content, "one");

    assert!(matches!(
        service.get_history(&conversation.id, 0, None).await,
        Err(ChatError::Validation(_))
    ));
    assert!(matches!(
        service.get_history(&conversation.id, 1, Some(11)).await,
        Err(ChatError::Validation(_))
    ));
    assert!(matches!(
        service.get_history(&Uuid::now_v7(), 1, None).await,
        Err(ChatError::NotFound(_))
    ));
}

#[tokio::test]
async fn mark_read_rejects_bad_cutoff() {
    let (service, _rx) = service_with(false).await;
    let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
    let conversation = service.start_conversation(open(a, b, None)).await.unwrap();

    assert!(matches!(
        service.mark_read(&b, &conversation.id, "not-a-uuid").await,
        Err(ChatError::Validation(_))
    ));
    assert!(matches!(
        service
            .mark_read(&b, &conversation.id, &Uuid::now_v7().to_string())
            .await,
        Err(ChatError::NotFound(_))
    ));
}

#[tokio::test]
async fn conversation_list_limit_is_clamped() {
    let (service, _rx) = service_with(false).await;
    let me = Uuid::now_v7();
    for _ in 0..7 {
        service
            .start_conversation(open(me, Uuid::now_v7(), Some(Uuid::now_v7())))
            .await
            .unwrap();
    }

    assert_eq!(service.list_conversations(&me, Some(500), 0).await.unwrap().len(), 5);
    assert_eq!(service.list_conversations(&me, Some(3), 0).await.unwrap().len(), 3);
    assert_eq!(service.list_conversations(&me, None, 5).await.unwrap().len(), 2);
}

#[tokio::test]
async fn devices_and_profiles() {
    let (service, _rx) = service_with(false).await;
    let (me, other) = (Uuid::now_v7(), Uuid::now_v7());

    service.register_device(me, "tok-1", DeviceType::Ios).await.unwrap();
    service.register_device(me, "tok-1", DeviceType::Android).await.unwrap();
    let devices = service.devices(&me).await.unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].device_type, DeviceType::Android);

    assert!(matches!(
        service.register_device(me, "   ", DeviceType::Web).await,
        Err(ChatError::Validation(_))
    ));
    assert!(service.unregister_device(&me, "tok-1").await.unwrap());
    assert!(!service.unregister_device(&me, "tok-1").await.unwrap());

    service.upsert_profile(other, "Riley", None).await.unwrap();
    service.start_conversation(open(me, other, None)).await.unwrap();
    let inbox = service.list_conversations(&me, None, 0).await.unwrap();
    assert_eq!(
        inbox[0].counterpart.as_ref().unwrap().display_name.as_deref(),
        Some("Riley")
    );

    let participants = service.participant_ids(&inbox[0].id).await.unwrap();
    assert_eq!(participants.len(), 2);
    assert!(matches!(
        service.participant_ids(&Uuid::now_v7()).await,
        Err(ChatError::NotFound(_))
    ));
}
