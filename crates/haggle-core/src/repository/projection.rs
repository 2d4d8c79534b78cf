//! Conversation list projection trait definition.

use haggle_types::conversation::ConversationSummary;
use haggle_types::error::RepositoryError;
use uuid::Uuid;

/// Read model producing a user's inbox.
pub trait ConversationListProjector: Send + Sync {
    /// Summaries of every conversation `user_id` participates in.
    ///
    /// Each row carries the counterpart, the latest message, and the unread
    /// count for `user_id`. Ordered by `COALESCE(last_message_at, updated_at)`
    /// descending. Must be answered by one read against the store, never by
    /// per-conversation round trips.
    fn list_for_user(
        &self,
        user_id: &Uuid,
        limit: u32,
        offset: u32,
    ) -> impl std::future::Future<Output = Result<Vec<ConversationSummary>, RepositoryError>> + Send;
}
