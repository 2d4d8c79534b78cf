//! SQLite message store implementation.

use haggle_core::repository::MessageStore;
use haggle_types::error::RepositoryError;
use haggle_types::message::Message;
use uuid::Uuid;

use super::store::{MessageRow, SqliteChatStore, format_datetime, query_err};

const MESSAGE_COLUMNS: &str =
    "id, conversation_id, sender_id, content, message_type, media_url, is_read, created_at";

impl MessageStore for SqliteChatStore {
    async fn append_message(&self, message: &Message) -> Result<(), RepositoryError> {
        let created_at = format_datetime(&message.created_at);
        let conversation_id = message.conversation_id.to_string();

        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        // Bump first so a missing conversation aborts before the insert.
        let bumped = sqlx::query(
            r#"UPDATE conversations
               SET last_message_at = MAX(COALESCE(last_message_at, ''), ?),
                   updated_at = MAX(updated_at, ?)
               WHERE id = ?"#,
        )
        .bind(&created_at)
        .bind(&created_at)
        .bind(&conversation_id)
        .execute(&mut *tx)
        .await
        .map_err(query_err)?;

        if bumped.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query(
            r#"INSERT INTO messages (id, conversation_id, sender_id, content, message_type, media_url, is_read, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(message.id.to_string())
        .bind(&conversation_id)
        .bind(message.sender_id.to_string())
        .bind(&message.content)
        .bind(message.message_type.to_string())
        .bind(&message.media_url)
        .bind(message.is_read)
        .bind(&created_at)
        .execute(&mut *tx)
        .await
        .map_err(query_err)?;

        tx.commit().await.map_err(query_err)?;
        Ok(())
    }

    async fn list_messages(
        &self,
        conversation_id: &Uuid,
        page: u32,
        page_size: u32,
    ) -> Result<(Vec<Message>, u64), RepositoryError> {
        let conversation_id = conversation_id.to_string();
        let offset = i64::from(page.saturating_sub(1)) * i64::from(page_size);

        let total: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM messages WHERE conversation_id = ?")
                .bind(&conversation_id)
                .fetch_one(&self.pool.reader)
                .await
                .map_err(query_err)?;

        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE conversation_id = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        let rows = sqlx::query(&sql)
            .bind(&conversation_id)
            .bind(i64::from(page_size))
            .bind(offset)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;

        let messages = rows
            .iter()
            .map(|row| MessageRow::from_row(row).map_err(query_err)?.into_message())
            .collect::<Result<Vec<_>, _>>()?;

        Ok((messages, total.0.max(0) as u64))
    }

    async fn get_message(&self, message_id: &Uuid) -> Result<Option<Message>, RepositoryError> {
        let sql = format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(message_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        match row {
            Some(row) => Ok(Some(MessageRow::from_row(&row).map_err(query_err)?.into_message()?)),
            None => Ok(None),
        }
    }
}
