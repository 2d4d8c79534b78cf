//! SQLite chat store handle and shared row mapping.
//!
//! Follows the raw-query style used across the SQLite layer: private Row
//! structs decode columns, then convert into domain types. Reads go to the
//! reader pool, transactions to the writer pool.

use chrono::{DateTime, SecondsFormat, Utc};
use haggle_types::conversation::{Conversation, ConversationMetadata, Participant};
use haggle_types::error::RepositoryError;
use haggle_types::message::{Message, MessageType};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of every chat storage port.
#[derive(Clone)]
pub struct SqliteChatStore {
    pub(crate) pool: DatabasePool,
}

impl SqliteChatStore {
    /// Create a new store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Access the underlying pool.
    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

/// Internal row type for mapping SQLite rows to domain Conversation.
pub(crate) struct ConversationRow {
    id: String,
    item_id: Option<String>,
    item_title: String,
    item_owner_id: Option<String>,
    metadata: String,
    created_at: String,
    updated_at: String,
    last_message_at: Option<String>,
}

impl ConversationRow {
    pub(crate) fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            item_id: row.try_get("item_id")?,
            item_title: row.try_get("item_title")?,
            item_owner_id: row.try_get("item_owner_id")?,
            metadata: row.try_get("metadata")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            last_message_at: row.try_get("last_message_at")?,
        })
    }

    pub(crate) fn into_conversation(
        self,
        participants: Vec<Participant>,
    ) -> Result<Conversation, RepositoryError> {
        let metadata: ConversationMetadata = serde_json::from_str(&self.metadata)
            .map_err(|e| RepositoryError::Query(format!("invalid conversation metadata: {e}")))?;

        Ok(Conversation {
            id: parse_uuid(&self.id)?,
            item_id: self.item_id.as_deref().map(parse_uuid).transpose()?,
            item_title: self.item_title,
            item_owner_id: self.item_owner_id.as_deref().map(parse_uuid).transpose()?,
            metadata,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
            last_message_at: self
                .last_message_at
                .as_deref()
                .map(parse_datetime)
                .transpose()?,
            participants,
        })
    }
}

/// Internal row type for mapping SQLite rows to domain Participant.
pub(crate) struct ParticipantRow {
    conversation_id: String,
    user_id: String,
    last_read_message_id: Option<String>,
    joined_at: String,
}

impl ParticipantRow {
    pub(crate) fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            conversation_id: row.try_get("conversation_id")?,
            user_id: row.try_get("user_id")?,
            last_read_message_id: row.try_get("last_read_message_id")?,
            joined_at: row.try_get("joined_at")?,
        })
    }

    pub(crate) fn into_participant(self) -> Result<Participant, RepositoryError> {
        Ok(Participant {
            conversation_id: parse_uuid(&self.conversation_id)?,
            user_id: parse_uuid(&self.user_id)?,
            last_read_message_id: self
                .last_read_message_id
                .as_deref()
                .map(parse_uuid)
                .transpose()?,
            joined_at: parse_datetime(&self.joined_at)?,
        })
    }
}

/// Internal row type for mapping SQLite rows to domain Message.
pub(crate) struct MessageRow {
    id: String,
    conversation_id: String,
    sender_id: String,
    content: String,
    message_type: String,
    media_url: Option<String>,
    is_read: bool,
    created_at: String,
}

impl MessageRow {
    pub(crate) fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            conversation_id: row.try_get("conversation_id")?,
            sender_id: row.try_get("sender_id")?,
            content: row.try_get("content")?,
            message_type: row.try_get("message_type")?,
            media_url: row.try_get("media_url")?,
            is_read: row.try_get("is_read")?,
            created_at: row.try_get("created_at")?,
        })
    }

    pub(crate) fn into_message(self) -> Result<Message, RepositoryError> {
        let message_type: MessageType = self
            .message_type
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(Message {
            id: parse_uuid(&self.id)?,
            conversation_id: parse_uuid(&self.conversation_id)?,
            sender_id: parse_uuid(&self.sender_id)?,
            content: self.content,
            message_type,
            media_url: self.media_url,
            is_read: self.is_read,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, RepositoryError> {
    s.parse::<Uuid>()
        .map_err(|e| RepositoryError::Query(format!("invalid UUID: {e}")))
}

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Fixed-width microsecond UTC form; text order equals time order.
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn query_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}
