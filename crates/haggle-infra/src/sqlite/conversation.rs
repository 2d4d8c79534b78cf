//! SQLite conversation store implementation.
//!
//! Conversations are deduplicated through a UNIQUE `dedup_key` column, so
//! concurrent create-or-get calls for the same participant set and item
//! converge on a single row.

use chrono::{SubsecRound, Utc};
use haggle_core::repository::ConversationStore;
use haggle_types::conversation::{Conversation, CreateConversationRequest, dedup_key};
use haggle_types::error::RepositoryError;
use sqlx::Row;
use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use super::store::{
    ConversationRow, ParticipantRow, SqliteChatStore, format_datetime, parse_uuid, query_err,
};

impl SqliteChatStore {
    async fn fetch_participants(
        pool: &SqlitePool,
        conversation_id: &str,
    ) -> Result<Vec<haggle_types::conversation::Participant>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT conversation_id, user_id, last_read_message_id, joined_at FROM conversation_participants WHERE conversation_id = ? ORDER BY rowid",
        )
        .bind(conversation_id)
        .fetch_all(pool)
        .await
        .map_err(query_err)?;

        rows.iter()
            .map(|row| {
                ParticipantRow::from_row(row)
                    .map_err(query_err)?
                    .into_participant()
            })
            .collect()
    }

    /// Load a conversation and its participants by a single indexed column.
    async fn fetch_conversation_by(
        pool: &SqlitePool,
        column: &str,
        value: &str,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let sql = format!(
            "SELECT id, item_id, item_title, item_owner_id, metadata, created_at, updated_at, last_message_at FROM conversations WHERE {column} = ?"
        );
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(pool)
            .await
            .map_err(query_err)?;

        match row {
            Some(row) => {
                let conversation_row = ConversationRow::from_row(&row).map_err(query_err)?;
                let id: String = row.try_get("id").map_err(query_err)?;
                let participants = Self::fetch_participants(pool, &id).await?;
                Ok(Some(conversation_row.into_conversation(participants)?))
            }
            None => Ok(None),
        }
    }

    async fn find_by_dedup_key(
        pool: &SqlitePool,
        key: &str,
    ) -> Result<Option<Conversation>, RepositoryError> {
        Self::fetch_conversation_by(pool, "dedup_key", key).await
    }

    /// Insert the conversation row and every participant row in one transaction.
    ///
    /// A UNIQUE violation on `dedup_key` surfaces as `RepositoryError::Conflict`.
    async fn insert_conversation(
        &self,
        key: &str,
        request: &CreateConversationRequest,
    ) -> Result<Uuid, RepositoryError> {
        let id = Uuid::now_v7();
        let now = format_datetime(&Utc::now().trunc_subsecs(6));
        let metadata = serde_json::to_string(&request.metadata)
            .map_err(|e| RepositoryError::Query(format!("failed to serialize metadata: {e}")))?;

        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        let inserted = sqlx::query(
            r#"INSERT INTO conversations (id, dedup_key, item_id, item_title, item_owner_id, metadata, created_at, updated_at, last_message_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, NULL)"#,
        )
        .bind(id.to_string())
        .bind(key)
        .bind(request.item_id.map(|i| i.to_string()))
        .bind(&request.item_title)
        .bind(request.item_owner_id.map(|o| o.to_string()))
        .bind(&metadata)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => {
                return Err(RepositoryError::Conflict(format!(
                    "conversation already exists for key '{key}'"
                )));
            }
            Err(e) => return Err(query_err(e)),
        }

        let mut seen: Vec<Uuid> = Vec::with_capacity(request.participant_ids.len());
        for user_id in &request.participant_ids {
            if seen.contains(user_id) {
                continue;
            }
            seen.push(*user_id);

            sqlx::query(
                "INSERT INTO conversation_participants (conversation_id, user_id, last_read_message_id, joined_at) VALUES (?, ?, NULL, ?)",
            )
            .bind(id.to_string())
            .bind(user_id.to_string())
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;
        }

        tx.commit().await.map_err(query_err)?;

        tracing::debug!(
            conversation_id = %id,
            participants = seen.len(),
            "Conversation created"
        );
        Ok(id)
    }
}

impl ConversationStore for SqliteChatStore {
    async fn create_or_get_conversation(
        &self,
        request: &CreateConversationRequest,
    ) -> Result<Conversation, RepositoryError> {
        let key = dedup_key(&request.participant_ids, request.item_id.as_ref());

        if let Some(existing) = Self::find_by_dedup_key(&self.pool.reader, &key).await? {
            return Ok(existing);
        }

        match self.insert_conversation(&key, request).await {
            Ok(id) => Self::fetch_conversation_by(&self.pool.writer, "id", &id.to_string())
                .await?
                .ok_or(RepositoryError::NotFound),
            Err(RepositoryError::Conflict(msg)) => {
                // Lost the race: the winner has committed, read it back through the writer.
                tracing::debug!(dedup_key = %key, "Conversation create raced, returning winner");
                Self::find_by_dedup_key(&self.pool.writer, &key)
                    .await?
                    .ok_or(RepositoryError::Conflict(msg))
            }
            Err(e) => Err(e),
        }
    }

    async fn get_conversation(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Option<Conversation>, RepositoryError> {
        Self::fetch_conversation_by(&self.pool.reader, "id", &conversation_id.to_string()).await
    }

    async fn participant_ids(&self, conversation_id: &Uuid) -> Result<Vec<Uuid>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT user_id FROM conversation_participants WHERE conversation_id = ? ORDER BY rowid",
        )
        .bind(conversation_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        rows.iter()
            .map(|row| {
                let user_id: String = row.try_get("user_id").map_err(query_err)?;
                parse_uuid(&user_id)
            })
            .collect()
    }
}
