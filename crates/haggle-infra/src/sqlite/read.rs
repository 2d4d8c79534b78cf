//! SQLite read-receipt tracker implementation.

use haggle_core::repository::ReadTracker;
use haggle_types::error::RepositoryError;
use sqlx::Row;
use uuid::Uuid;

use super::store::{SqliteChatStore, query_err};

impl ReadTracker for SqliteChatStore {
    async fn mark_read(
        &self,
        user_id: &Uuid,
        conversation_id: &Uuid,
        cutoff_message_id: &Uuid,
    ) -> Result<(), RepositoryError> {
        let user_id = user_id.to_string();
        let conversation_id = conversation_id.to_string();
        let cutoff_id = cutoff_message_id.to_string();

        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        let cutoff = sqlx::query("SELECT created_at FROM messages WHERE id = ? AND conversation_id = ?")
            .bind(&cutoff_id)
            .bind(&conversation_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(query_err)?;
        let cutoff_at: String = match cutoff {
            Some(row) => row.try_get("created_at").map_err(query_err)?,
            None => return Err(RepositoryError::NotFound),
        };

        let participant = sqlx::query(
            "SELECT 1 FROM conversation_participants WHERE conversation_id = ? AND user_id = ?",
        )
        .bind(&conversation_id)
        .bind(&user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(query_err)?;
        if participant.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let flipped = sqlx::query(
            r#"UPDATE messages SET is_read = 1
               WHERE conversation_id = ? AND sender_id != ? AND created_at <= ? AND is_read = 0"#,
        )
        .bind(&conversation_id)
        .bind(&user_id)
        .bind(&cutoff_at)
        .execute(&mut *tx)
        .await
        .map_err(query_err)?;

        // Pointer only moves forward in (created_at, id) order.
        let moved = sqlx::query(
            r#"UPDATE conversation_participants SET last_read_message_id = ?
               WHERE conversation_id = ? AND user_id = ?
                 AND NOT EXISTS (SELECT 1 FROM messages m
                                 WHERE m.id = conversation_participants.last_read_message_id
                                   AND (m.created_at > ? OR (m.created_at = ? AND m.id > ?)))"#,
        )
        .bind(&cutoff_id)
        .bind(&conversation_id)
        .bind(&user_id)
        .bind(&cutoff_at)
        .bind(&cutoff_at)
        .bind(&cutoff_id)
        .execute(&mut *tx)
        .await
        .map_err(query_err)?;

        tx.commit().await.map_err(query_err)?;

        if moved.rows_affected() == 0 {
            tracing::debug!(
                conversation_id = %conversation_id,
                user_id = %user_id,
                "Read pointer already past cutoff"
            );
        }
        tracing::debug!(
            conversation_id = %conversation_id,
            user_id = %user_id,
            flipped = flipped.rows_affected(),
            "Read cutoff applied"
        );
        Ok(())
    }

    async fn unread_count(
        &self,
        user_id: &Uuid,
        conversation_id: &Uuid,
    ) -> Result<u32, RepositoryError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM messages WHERE conversation_id = ? AND sender_id != ? AND is_read = 0",
        )
        .bind(conversation_id.to_string())
        .bind(user_id.to_string())
        .fetch_one(&self.pool.reader)
        .await
        .map_err(query_err)?;

        Ok(u32::try_from(count.0).unwrap_or(u32::MAX))
    }
}
