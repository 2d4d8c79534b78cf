//! Read-receipt tracker trait definition.

use haggle_types::error::RepositoryError;
use uuid::Uuid;

/// Storage port for read state.
pub trait ReadTracker: Send + Sync {
    /// Mark everything up to and including the cutoff message as read for `user_id`.
    ///
    /// In one transaction:
    /// - flips `is_read` on every message in the conversation whose sender is
    ///   not `user_id` and whose `created_at` is at or before the cutoff's;
    /// - moves the participant's `last_read_message_id` to the cutoff, unless
    ///   the stored pointer is already newer (the pointer never moves back).
    ///
    /// Messages are never flipped back to unread. Returns `NotFound` when the
    /// cutoff message is not in the conversation or `user_id` is not a
    /// participant; nothing is written in that case.
    fn mark_read(
        &self,
        user_id: &Uuid,
        conversation_id: &Uuid,
        cutoff_message_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Count messages from other participants that are still unread.
    fn unread_count(
        &self,
        user_id: &Uuid,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<u32, RepositoryError>> + Send;
}
