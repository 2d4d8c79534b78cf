//! Chat service orchestrating conversations, messages, and read receipts.
//!
//! ChatService coordinates the storage ports and the notification dispatcher
//! for inbound message events and read-receipt events.

use std::sync::Arc;

use chrono::Utc;
use haggle_types::config::ChatSettings;
use haggle_types::conversation::{
    Conversation, ConversationSummary, CreateConversationRequest, METADATA_SCHEMA_VERSION,
};
use haggle_types::device::{Device, DeviceType};
use haggle_types::error::{ChatError, RepositoryError};
use haggle_types::message::{InboundMessage, Message, MessagePage};
use haggle_types::profile::UserProfile;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::notify::{NotificationDispatcher, NotificationSender};
use crate::repository::{
    ChatStore, ConversationListProjector, ConversationStore, DeviceStore, MessageStore,
    ProfileStore, ReadTracker,
};

/// Longest accepted item title, in characters.
const MAX_ITEM_TITLE_CHARS: usize = 255;

/// Orchestrates the chat lifecycle.
///
/// Generic over the store and sender ports so haggle-core never depends on
/// haggle-infra. The store handle is injected by the composition root and
/// shared with spawned notification tasks.
pub struct ChatService<S: ChatStore, N: NotificationSender> {
    store: Arc<S>,
    dispatcher: Arc<NotificationDispatcher<N>>,
    settings: ChatSettings,
}

impl<S, N> ChatService<S, N>
where
    S: ChatStore + 'static,
    N: NotificationSender + 'static,
{
    /// Create a new chat service.
    pub fn new(store: S, dispatcher: NotificationDispatcher<N>, settings: ChatSettings) -> Self {
        Self {
            store: Arc::new(store),
            dispatcher: Arc::new(dispatcher),
            settings,
        }
    }

    /// Access the store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Access the pagination settings.
    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    // --- Conversations ---

    /// Open a conversation between participants about an item, or return the existing one.
    ///
    /// Duplicate participant ids are collapsed; at least two distinct
    /// participants are required. The item owner defaults to the first
    /// participant.
    pub async fn start_conversation(
        &self,
        request: CreateConversationRequest,
    ) -> Result<Conversation, ChatError> {
        let mut participant_ids: Vec<Uuid> = Vec::with_capacity(request.participant_ids.len());
        for id in &request.participant_ids {
            if !participant_ids.contains(id) {
                participant_ids.push(*id);
            }
        }
        if participant_ids.len() < 2 {
            return Err(ChatError::Validation(
                "a conversation needs at least two distinct participants".to_string(),
            ));
        }

        let item_title = request.item_title.trim().to_string();
        if item_title.chars().count() > MAX_ITEM_TITLE_CHARS {
            return Err(ChatError::Validation(format!(
                "item title exceeds {MAX_ITEM_TITLE_CHARS} characters"
            )));
        }

        if request.metadata.schema_version != METADATA_SCHEMA_VERSION {
            return Err(ChatError::Validation(format!(
                "unsupported metadata schema version {}",
                request.metadata.schema_version
            )));
        }

        let item_owner_id = request.item_owner_id.or(participant_ids.first().copied());
        let normalized = CreateConversationRequest {
            participant_ids,
            item_id: request.item_id,
            item_title,
            item_owner_id,
            metadata: request.metadata,
        };

        let conversation = self.store.create_or_get_conversation(&normalized).await?;
        debug!(conversation_id = %conversation.id, "Conversation resolved");
        Ok(conversation)
    }

    /// Get a conversation by ID.
    pub async fn get_conversation(&self, conversation_id: &Uuid) -> Result<Conversation, ChatError> {
        self.store
            .get_conversation(conversation_id)
            .await?
            .ok_or_else(|| ChatError::NotFound("conversation".to_string()))
    }

    /// A user's conversation list, most recently active first.
    ///
    /// `limit` defaults to, and is capped at, `max_conversation_list`.
    pub async fn list_conversations(
        &self,
        user_id: &Uuid,
        limit: Option<u32>,
        offset: u32,
    ) -> Result<Vec<ConversationSummary>, ChatError> {
        let max = self.settings.max_conversation_list.max(1);
        let limit = limit.unwrap_or(max).clamp(1, max);
        Ok(self.store.list_for_user(user_id, limit, offset).await?)
    }

    /// User ids of a conversation's participants (used by the real-time hub).
    pub async fn participant_ids(&self, conversation_id: &Uuid) -> Result<Vec<Uuid>, ChatError> {
        let ids = self.store.participant_ids(conversation_id).await?;
        if ids.is_empty() {
            return Err(ChatError::NotFound("conversation".to_string()));
        }
        Ok(ids)
    }

    // --- Messages ---

    /// Persist an inbound message, then notify the other participants.
    ///
    /// The message and the conversation bump commit together. Notification
    /// fan-out runs on a spawned task afterwards and can neither delay nor
    /// fail this call.
    pub async fn send_message(&self, event: InboundMessage) -> Result<Message, ChatError> {
        let message = Message::from_inbound(event);

        self.store
            .append_message(&message)
            .await
            .map_err(|e| not_found_as(e, "conversation"))?;

        info!(
            conversation_id = %message.conversation_id,
            message_id = %message.id,
            sender_id = %message.sender_id,
            "Message persisted"
        );

        self.spawn_notification(message.clone());
        Ok(message)
    }

    fn spawn_notification(&self, message: Message) {
        let store = Arc::clone(&self.store);
        let dispatcher = Arc::clone(&self.dispatcher);
        tokio::spawn(async move {
            let participant_ids = match store.participant_ids(&message.conversation_id).await {
                Ok(ids) => ids,
                Err(e) => {
                    warn!(
                        conversation_id = %message.conversation_id,
                        message_id = %message.id,
                        error = %e,
                        "Could not load participants for notification"
                    );
                    return;
                }
            };

            let recipients =
                NotificationDispatcher::<N>::recipients(&message.sender_id, &participant_ids);
            let devices = if recipients.is_empty() {
                Vec::new()
            } else {
                match store.list_devices_for_users(&recipients).await {
                    Ok(devices) => devices,
                    Err(e) => {
                        warn!(
                            conversation_id = %message.conversation_id,
                            message_id = %message.id,
                            error = %e,
                            "Could not load recipient devices for notification"
                        );
                        return;
                    }
                }
            };

            dispatcher.dispatch(&message, &participant_ids, &devices).await;
        });
    }

    /// One page of a conversation's history, newest first.
    ///
    /// `page` is 1-based. `page_size` defaults to `default_page_size` and may
    /// not exceed `max_page_size`.
    pub async fn get_history(
        &self,
        conversation_id: &Uuid,
        page: u32,
        page_size: Option<u32>,
    ) -> Result<MessagePage, ChatError> {
        if page == 0 {
            return Err(ChatError::Validation("page starts at 1".to_string()));
        }
        let page_size = page_size.unwrap_or(self.settings.default_page_size);
        if page_size == 0 || page_size > self.settings.max_page_size {
            return Err(ChatError::Validation(format!(
                "page_size must be between 1 and {}",
                self.settings.max_page_size
            )));
        }

        self.get_conversation(conversation_id).await?;
        let (messages, total_count) = self
            .store
            .list_messages(conversation_id, page, page_size)
            .await?;

        Ok(MessagePage {
            messages,
            total_count,
            page,
            page_size,
        })
    }

    // --- Read receipts ---

    /// Mark messages read up to and including `cutoff_message_id`.
    ///
    /// The cutoff arrives from clients as a string; an unparsable id is a
    /// validation error.
    pub async fn mark_read(
        &self,
        user_id: &Uuid,
        conversation_id: &Uuid,
        cutoff_message_id: &str,
    ) -> Result<(), ChatError> {
        let cutoff: Uuid = cutoff_message_id.trim().parse().map_err(|_| {
            ChatError::Validation(format!("invalid message id: '{cutoff_message_id}'"))
        })?;

        self.store
            .mark_read(user_id, conversation_id, &cutoff)
            .await
            .map_err(|e| not_found_as(e, "message or participant"))?;

        info!(
            user_id = %user_id,
            conversation_id = %conversation_id,
            cutoff_message_id = %cutoff,
            "Messages marked read"
        );
        Ok(())
    }

    /// Messages from other participants `user_id` has not read yet.
    pub async fn unread_count(
        &self,
        user_id: &Uuid,
        conversation_id: &Uuid,
    ) -> Result<u32, ChatError> {
        Ok(self.store.unread_count(user_id, conversation_id).await?)
    }

    // --- Devices ---

    /// Register (or refresh) a push delivery token for a user.
    pub async fn register_device(
        &self,
        user_id: Uuid,
        token: &str,
        device_type: DeviceType,
    ) -> Result<Device, ChatError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ChatError::Validation("device token cannot be empty".to_string()));
        }

        let now = Utc::now();
        let device = Device {
            user_id,
            token: token.to_string(),
            device_type,
            created_at: now,
            updated_at: now,
        };
        let device = self.store.upsert_device(&device).await?;
        info!(user_id = %user_id, device_type = %device.device_type, "Device registered");
        Ok(device)
    }

    /// Remove a push delivery token. Returns `false` if it was not registered.
    pub async fn unregister_device(&self, user_id: &Uuid, token: &str) -> Result<bool, ChatError> {
        let removed = self.store.delete_device(user_id, token.trim()).await?;
        if removed {
            info!(user_id = %user_id, "Device unregistered");
        }
        Ok(removed)
    }

    /// All push delivery tokens registered for a user.
    pub async fn devices(&self, user_id: &Uuid) -> Result<Vec<Device>, ChatError> {
        Ok(self.store.list_devices(user_id).await?)
    }

    // --- Profiles ---

    /// Cache a user's display fields for conversation lists.
    pub async fn upsert_profile(
        &self,
        user_id: Uuid,
        display_name: &str,
        avatar_url: Option<String>,
    ) -> Result<UserProfile, ChatError> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(ChatError::Validation("display name cannot be empty".to_string()));
        }

        let profile = UserProfile {
            user_id,
            display_name: display_name.to_string(),
            avatar_url: avatar_url.filter(|url| !url.is_empty()),
            updated_at: Utc::now(),
        };
        self.store.upsert_profile(&profile).await?;
        Ok(profile)
    }
}

/// Name the missing entity when a port reports `NotFound`.
fn not_found_as(e: RepositoryError, what: &str) -> ChatError {
    match e {
        RepositoryError::NotFound => ChatError::NotFound(what.to_string()),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Verify ChatService is generic over the right traits
    fn _assert_chat_service_generic<S: ChatStore, N: NotificationSender>() {
        fn _takes_service<S: ChatStore, N: NotificationSender>(_s: &ChatService<S, N>) {}
    }

    #[test]
    fn test_not_found_as_names_entity() {
        match not_found_as(RepositoryError::NotFound, "conversation") {
            ChatError::NotFound(what) => assert_eq!(what, "conversation"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_not_found_as_passes_other_errors() {
        let err = not_found_as(RepositoryError::Query("locked".to_string()), "conversation");
        assert!(matches!(err, ChatError::Persistence(_)));
    }
}
