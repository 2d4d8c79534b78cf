//! Chat message types for Haggle.
//!
//! Messages are immutable once stored except for the `is_read` flag. Within a
//! conversation they are ordered by `created_at`, ties broken by `id`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of content a message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Text,
    Image,
    File,
    System,
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageType::Text => write!(f, "text"),
            MessageType::Image => write!(f, "image"),
            MessageType::File => write!(f, "file"),
            MessageType::System => write!(f, "system"),
        }
    }
}

impl FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(MessageType::Text),
            "image" => Ok(MessageType::Image),
            "file" => Ok(MessageType::File),
            "system" => Ok(MessageType::System),
            other => Err(format!("invalid message type: '{other}'")),
        }
    }
}

/// A persisted chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub message_type: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Build an unread message from an inbound real-time event.
    ///
    /// The timestamp is truncated to microseconds, the precision the store
    /// keeps, so the returned value compares equal to what is read back.
    /// An empty media reference becomes `None`.
    pub fn from_inbound(event: InboundMessage) -> Self {
        let media_url = event.media_url.filter(|url| !url.is_empty());
        Self {
            id: Uuid::now_v7(),
            conversation_id: event.conversation_id,
            sender_id: event.sender_id,
            content: event.content,
            message_type: event.message_type,
            media_url,
            is_read: false,
            created_at: normalize_timestamp(event.timestamp),
        }
    }
}

/// Truncate a timestamp to the microsecond precision used for storage.
pub fn normalize_timestamp(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(6)
}

/// A message event received from the real-time transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    #[serde(default)]
    pub message_type: MessageType,
    #[serde(default)]
    pub media_url: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// One page of a conversation's history, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePage {
    pub messages: Vec<Message>,
    /// Total messages in the conversation, independent of the page slice.
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_message_type_roundtrip() {
        for kind in [
            MessageType::Text,
            MessageType::Image,
            MessageType::File,
            MessageType::System,
        ] {
            let parsed: MessageType = kind.to_string().parse().unwrap();
            assert_eq!(kind, parsed);
        }
    }

    #[test]
    fn test_message_type_serde() {
        let json = serde_json::to_string(&MessageType::Image).unwrap();
        assert_eq!(json, "\"image\"");
        assert!("video".parse::<MessageType>().is_err());
    }

    #[test]
    fn test_from_inbound_truncates_to_micros() {
        let ts = Utc::now().with_nanosecond(123_456_789).unwrap();
        let msg = Message::from_inbound(InboundMessage {
            conversation_id: Uuid::now_v7(),
            sender_id: Uuid::now_v7(),
            content: "Hello".to_string(),
            message_type: MessageType::Text,
            media_url: None,
            timestamp: ts,
        });
        assert_eq!(msg.created_at.nanosecond(), 123_456_000);
        assert!(!msg.is_read);
    }

    #[test]
    fn test_from_inbound_drops_empty_media() {
        let msg = Message::from_inbound(InboundMessage {
            conversation_id: Uuid::now_v7(),
            sender_id: Uuid::now_v7(),
            content: String::new(),
            message_type: MessageType::Image,
            media_url: Some(String::new()),
            timestamp: Utc::now(),
        });
        assert!(msg.media_url.is_none());
    }

    #[test]
    fn test_inbound_defaults_to_text() {
        let json = format!(
            r#"{{"conversation_id":"{}","sender_id":"{}","content":"hi","timestamp":"2026-01-02T03:04:05Z"}}"#,
            Uuid::now_v7(),
            Uuid::now_v7()
        );
        let event: InboundMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(event.message_type, MessageType::Text);
        assert!(event.media_url.is_none());
    }
}
