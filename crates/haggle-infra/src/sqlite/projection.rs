//! SQLite conversation list projection.
//!
//! Builds a user's inbox in one statement: each conversation row is joined to
//! its counterpart's cached profile and its newest message, and carries a
//! correlated unread count. Nothing is fetched per conversation.

use haggle_core::repository::ConversationListProjector;
use haggle_types::conversation::{ConversationSummary, Counterpart, LastMessagePreview};
use haggle_types::error::RepositoryError;
use haggle_types::message::MessageType;
use sqlx::Row;
use uuid::Uuid;

use super::store::{SqliteChatStore, parse_datetime, parse_uuid, query_err};

/// Counterpart is the lowest user id other than the viewer, so group
/// threads still resolve to one stable row.
const INBOX_SQL: &str = r#"
SELECT c.id, c.item_id, c.item_title, c.item_owner_id, c.updated_at, c.last_message_at,
       other.user_id    AS other_user_id,
       p.display_name   AS other_display_name,
       p.avatar_url     AS other_avatar_url,
       lm.id            AS lm_id,
       lm.sender_id     AS lm_sender_id,
       lm.content       AS lm_content,
       lm.message_type  AS lm_message_type,
       lm.created_at    AS lm_created_at,
       (SELECT COUNT(*) FROM messages m
         WHERE m.conversation_id = c.id AND m.sender_id != ? AND m.is_read = 0) AS unread_count
FROM conversations c
INNER JOIN conversation_participants me
        ON me.conversation_id = c.id AND me.user_id = ?
LEFT JOIN conversation_participants other
       ON other.conversation_id = c.id
      AND other.user_id = (SELECT MIN(cp.user_id) FROM conversation_participants cp
                            WHERE cp.conversation_id = c.id AND cp.user_id != ?)
LEFT JOIN user_profiles p ON p.user_id = other.user_id
LEFT JOIN messages lm
       ON lm.id = (SELECT m2.id FROM messages m2
                    WHERE m2.conversation_id = c.id
                    ORDER BY m2.created_at DESC, m2.id DESC LIMIT 1)
ORDER BY COALESCE(c.last_message_at, c.updated_at) DESC, c.id DESC
LIMIT ? OFFSET ?
"#;

struct SummaryRow {
    id: String,
    item_id: Option<String>,
    item_title: String,
    item_owner_id: Option<String>,
    updated_at: String,
    last_message_at: Option<String>,
    other_user_id: Option<String>,
    other_display_name: Option<String>,
    other_avatar_url: Option<String>,
    lm_id: Option<String>,
    lm_sender_id: Option<String>,
    lm_content: Option<String>,
    lm_message_type: Option<String>,
    lm_created_at: Option<String>,
    unread_count: i64,
}

impl SummaryRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            item_id: row.try_get("item_id")?,
            item_title: row.try_get("item_title")?,
            item_owner_id: row.try_get("item_owner_id")?,
            updated_at: row.try_get("updated_at")?,
            last_message_at: row.try_get("last_message_at")?,
            other_user_id: row.try_get("other_user_id")?,
            other_display_name: row.try_get("other_display_name")?,
            other_avatar_url: row.try_get("other_avatar_url")?,
            lm_id: row.try_get("lm_id")?,
            lm_sender_id: row.try_get("lm_sender_id")?,
            lm_content: row.try_get("lm_content")?,
            lm_message_type: row.try_get("lm_message_type")?,
            lm_created_at: row.try_get("lm_created_at")?,
            unread_count: row.try_get("unread_count")?,
        })
    }

    fn into_summary(self) -> Result<ConversationSummary, RepositoryError> {
        let counterpart = match self.other_user_id {
            Some(user_id) => Some(Counterpart {
                user_id: parse_uuid(&user_id)?,
                display_name: self.other_display_name,
                avatar_url: self.other_avatar_url,
            }),
            None => None,
        };

        let last_message = match (
            self.lm_id,
            self.lm_sender_id,
            self.lm_content,
            self.lm_message_type,
            self.lm_created_at,
        ) {
            (Some(id), Some(sender_id), Some(content), Some(message_type), Some(created_at)) => {
                Some(LastMessagePreview {
                    message_id: parse_uuid(&id)?,
                    sender_id: parse_uuid(&sender_id)?,
                    content,
                    message_type: message_type
                        .parse::<MessageType>()
                        .map_err(RepositoryError::Query)?,
                    created_at: parse_datetime(&created_at)?,
                })
            }
            _ => None,
        };

        Ok(ConversationSummary {
            id: parse_uuid(&self.id)?,
            item_id: self.item_id.as_deref().map(parse_uuid).transpose()?,
            item_title: self.item_title,
            item_owner_id: self.item_owner_id.as_deref().map(parse_uuid).transpose()?,
            updated_at: parse_datetime(&self.updated_at)?,
            last_message_at: self
                .last_message_at
                .as_deref()
                .map(parse_datetime)
                .transpose()?,
            counterpart,
            last_message,
            unread_count: u32::try_from(self.unread_count).unwrap_or(u32::MAX),
        })
    }
}

impl ConversationListProjector for SqliteChatStore {
    async fn list_for_user(
        &self,
        user_id: &Uuid,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ConversationSummary>, RepositoryError> {
        let user_id = user_id.to_string();

        let rows = sqlx::query(INBOX_SQL)
            .bind(&user_id)
            .bind(&user_id)
            .bind(&user_id)
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;

        rows.iter()
            .map(|row| SummaryRow::from_row(row).map_err(query_err)?.into_summary())
            .collect()
    }
}
