//! Conversation, participant, and conversation-list types for Haggle.
//!
//! A conversation is a persistent thread between a fixed set of participants,
//! optionally scoped to one item listing. Participants carry each user's
//! read-cutoff pointer.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::MessageType;

/// Current schema version written into new `ConversationMetadata`.
pub const METADATA_SCHEMA_VERSION: u32 = 1;

/// A chat thread between participants, optionally about one item listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub item_id: Option<Uuid>,
    /// Denormalized display copy of the listing title.
    pub item_title: String,
    pub item_owner_id: Option<Uuid>,
    pub metadata: ConversationMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// `None` until the first message is appended.
    pub last_message_at: Option<DateTime<Utc>>,
    pub participants: Vec<Participant>,
}

impl Conversation {
    /// User ids of every participant, in stored order.
    pub fn participant_ids(&self) -> Vec<Uuid> {
        self.participants.iter().map(|p| p.user_id).collect()
    }
}

/// A user's membership in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    /// Newest message this user has acknowledged.
    pub last_read_message_id: Option<Uuid>,
    pub joined_at: DateTime<Utc>,
}

/// Where a conversation was started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationOrigin {
    ListingPage,
    Search,
    Profile,
    Offer,
}

impl fmt::Display for ConversationOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationOrigin::ListingPage => write!(f, "listing_page"),
            ConversationOrigin::Search => write!(f, "search"),
            ConversationOrigin::Profile => write!(f, "profile"),
            ConversationOrigin::Offer => write!(f, "offer"),
        }
    }
}

impl FromStr for ConversationOrigin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "listing_page" => Ok(ConversationOrigin::ListingPage),
            "search" => Ok(ConversationOrigin::Search),
            "profile" => Ok(ConversationOrigin::Profile),
            "offer" => Ok(ConversationOrigin::Offer),
            other => Err(format!("invalid conversation origin: '{other}'")),
        }
    }
}

/// Context captured when a conversation is opened.
///
/// Only the keys below are recognized. Unknown keys are rejected when
/// deserializing so stored rows cannot drift in shape unnoticed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConversationMetadata {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<ConversationOrigin>,
    /// Offer amount in minor currency units, for offer-initiated threads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_amount_cents: Option<i64>,
    /// ISO 4217 code accompanying `offer_amount_cents`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listing_url: Option<String>,
}

fn default_schema_version() -> u32 {
    METADATA_SCHEMA_VERSION
}

impl Default for ConversationMetadata {
    fn default() -> Self {
        Self {
            schema_version: METADATA_SCHEMA_VERSION,
            origin: None,
            offer_amount_cents: None,
            currency: None,
            listing_url: None,
        }
    }
}

/// Request to open (or reopen) a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConversationRequest {
    pub participant_ids: Vec<Uuid>,
    #[serde(default)]
    pub item_id: Option<Uuid>,
    #[serde(default)]
    pub item_title: String,
    /// Defaults to the first participant when absent.
    #[serde(default)]
    pub item_owner_id: Option<Uuid>,
    #[serde(default)]
    pub metadata: ConversationMetadata,
}

/// Canonical dedup key for a participant set and item context.
///
/// Participant ids are sorted and de-duplicated, so the key is independent of
/// request order: `"<id>,<id>|<item id or ->"`.
pub fn dedup_key(participant_ids: &[Uuid], item_id: Option<&Uuid>) -> String {
    let mut ids: Vec<String> = participant_ids.iter().map(|id| id.to_string()).collect();
    ids.sort();
    ids.dedup();
    let item = item_id.map_or_else(|| "-".to_string(), |id| id.to_string());
    format!("{}|{item}", ids.join(","))
}

/// The other side of a conversation, as shown in a conversation list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counterpart {
    pub user_id: Uuid,
    /// `None` when no profile has been synced for this user.
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// The most recent message of a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastMessagePreview {
    pub message_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub message_type: MessageType,
    pub created_at: DateTime<Utc>,
}

/// One row of a user's conversation list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: Uuid,
    pub item_id: Option<Uuid>,
    pub item_title: String,
    pub item_owner_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub counterpart: Option<Counterpart>,
    pub last_message: Option<LastMessagePreview>,
    pub unread_count: u32,
}

impl ConversationSummary {
    /// Timestamp the list is ordered by: last message, else last update.
    pub fn activity_at(&self) -> DateTime<Utc> {
        self.last_message_at.unwrap_or(self.updated_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_key_is_order_independent() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        let item = Uuid::now_v7();
        assert_eq!(dedup_key(&[a, b], Some(&item)), dedup_key(&[b, a], Some(&item)));
    }

    #[test]
    fn test_dedup_key_distinguishes_item_context() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        let item = Uuid::now_v7();
        let without_item = dedup_key(&[a, b], None);
        assert!(without_item.ends_with("|-"));
        assert_ne!(without_item, dedup_key(&[a, b], Some(&item)));
    }

    #[test]
    fn test_dedup_key_collapses_duplicates() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        assert_eq!(dedup_key(&[a, b, a], None), dedup_key(&[a, b], None));
    }

    #[test]
    fn test_metadata_rejects_unknown_keys() {
        let result: Result<ConversationMetadata, _> =
            serde_json::from_str(r#"{"schema_version":1,"colour":"red"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_metadata_defaults_schema_version() {
        let meta: ConversationMetadata =
            serde_json::from_str(r#"{"origin":"offer","offer_amount_cents":150000,"currency":"EUR"}"#)
                .unwrap();
        assert_eq!(meta.schema_version, METADATA_SCHEMA_VERSION);
        assert_eq!(meta.origin, Some(ConversationOrigin::Offer));
        assert_eq!(meta.offer_amount_cents, Some(150_000));
    }

    #[test]
    fn test_metadata_default_serializes_compactly() {
        let json = serde_json::to_string(&ConversationMetadata::default()).unwrap();
        assert_eq!(json, r#"{"schema_version":1}"#);
    }

    #[test]
    fn test_origin_roundtrip() {
        for origin in [
            ConversationOrigin::ListingPage,
            ConversationOrigin::Search,
            ConversationOrigin::Profile,
            ConversationOrigin::Offer,
        ] {
            let parsed: ConversationOrigin = origin.to_string().parse().unwrap();
            assert_eq!(origin, parsed);
        }
    }

    #[test]
    fn test_summary_activity_falls_back_to_updated_at() {
        let updated_at = Utc::now();
        let summary = ConversationSummary {
            id: Uuid::now_v7(),
            item_id: None,
            item_title: String::new(),
            item_owner_id: None,
            updated_at,
            last_message_at: None,
            counterpart: None,
            last_message: None,
            unread_count: 0,
        };
        assert_eq!(summary.activity_at(), updated_at);
    }
}
