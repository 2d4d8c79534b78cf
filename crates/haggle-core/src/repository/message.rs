//! Message store trait definition.

use haggle_types::error::RepositoryError;
use haggle_types::message::Message;
use uuid::Uuid;

/// Storage port for the append-only message log.
pub trait MessageStore: Send + Sync {
    /// Append a message and bump its conversation's activity timestamps.
    ///
    /// In one transaction: inserts the message and sets the conversation's
    /// `last_message_at` and `updated_at` to `message.created_at` (never moving
    /// `last_message_at` backward). Returns `NotFound` and persists nothing
    /// when the conversation does not exist.
    fn append_message(
        &self,
        message: &Message,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// One page of history, newest first, plus the conversation's total message count.
    ///
    /// `page` is 1-based; the slice starts at `(page - 1) * page_size`.
    fn list_messages(
        &self,
        conversation_id: &Uuid,
        page: u32,
        page_size: u32,
    ) -> impl std::future::Future<Output = Result<(Vec<Message>, u64), RepositoryError>> + Send;

    /// Get a single message by ID.
    fn get_message(
        &self,
        message_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Message>, RepositoryError>> + Send;
}
