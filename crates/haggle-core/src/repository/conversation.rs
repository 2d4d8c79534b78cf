//! Conversation store trait definition.

use haggle_types::conversation::{Conversation, CreateConversationRequest};
use haggle_types::error::RepositoryError;
use uuid::Uuid;

/// Storage port for conversations and their participant rows.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ConversationStore: Send + Sync {
    /// Return the conversation for this exact participant set and item, creating it if absent.
    ///
    /// The participant set matches exactly (same members, same cardinality) and
    /// a `None` item matches only `None`. Creation writes the conversation and
    /// all participant rows in one transaction. When two callers race on the
    /// same key, at most one conversation survives and the loser returns the
    /// winner's row instead of an error.
    fn create_or_get_conversation(
        &self,
        request: &CreateConversationRequest,
    ) -> impl std::future::Future<Output = Result<Conversation, RepositoryError>> + Send;

    /// Get a conversation (with participants) by ID.
    fn get_conversation(
        &self,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Conversation>, RepositoryError>> + Send;

    /// User ids of every participant. Empty when the conversation does not exist.
    fn participant_ids(
        &self,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<Uuid>, RepositoryError>> + Send;
}
