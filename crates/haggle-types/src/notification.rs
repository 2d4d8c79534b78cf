//! Push notification payload types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::device::{Device, DeviceType};

/// Event-type tag carried in the structured payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEventType {
    ChatMessage,
}

impl fmt::Display for NotificationEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationEventType::ChatMessage => write!(f, "chat_message"),
        }
    }
}

/// Structured data delivered alongside the visible title/body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    #[serde(rename = "type")]
    pub event_type: NotificationEventType,
}

impl NotificationData {
    /// Flatten into the string map push providers expect for data payloads.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("conversation_id".to_string(), self.conversation_id.to_string()),
            ("sender_id".to_string(), self.sender_id.to_string()),
            ("type".to_string(), self.event_type.to_string()),
        ])
    }
}

/// A fully built notification, ready for a sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushNotification {
    pub title: String,
    pub body: String,
    pub data: NotificationData,
}

/// Delivery tokens for one notification, grouped by platform.
///
/// Serializes as `{"android": [...], "ios": [...], "web": [...]}` with empty
/// platforms omitted. A token registered by several recipients appears once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceTargets(BTreeMap<DeviceType, Vec<String>>);

impl DeviceTargets {
    /// Group the tokens of `devices` by device type, keeping first-seen order.
    pub fn from_devices<'a>(devices: impl IntoIterator<Item = &'a Device>) -> Self {
        let mut grouped: BTreeMap<DeviceType, Vec<String>> = BTreeMap::new();
        for device in devices {
            let tokens = grouped.entry(device.device_type).or_default();
            if !tokens.contains(&device.token) {
                tokens.push(device.token.clone());
            }
        }
        Self(grouped)
    }

    /// Tokens registered for one platform.
    pub fn tokens(&self, device_type: DeviceType) -> &[String] {
        self.0.get(&device_type).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.values().flatten().any(|t| t == token)
    }

    /// Total number of tokens across platforms.
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
