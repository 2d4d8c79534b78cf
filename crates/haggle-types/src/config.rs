//! Global configuration types for Haggle.
//!
//! `HaggleConfig` represents the top-level `config.toml` that controls
//! pagination limits and push notification delivery.

use serde::{Deserialize, Serialize};

/// Top-level configuration. All fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HaggleConfig {
    #[serde(default)]
    pub chat: ChatSettings,

    #[serde(default)]
    pub notifications: NotificationSettings,
}

/// Pagination limits applied by `ChatService`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSettings {
    /// Page size used when a history request does not specify one.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Largest history page a caller may request.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    /// Largest conversation list a caller may request.
    #[serde(default = "default_max_conversation_list")]
    pub max_conversation_list: u32,
}

fn default_page_size() -> u32 {
    50
}

fn default_max_page_size() -> u32 {
    100
}

fn default_max_conversation_list() -> u32 {
    100
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            max_conversation_list: default_max_conversation_list(),
        }
    }
}

/// Push notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Title used for new-message notifications.
    #[serde(default = "default_title")]
    pub title: String,

    /// Push gateway endpoint. Notifications are only logged when unset.
    #[serde(default)]
    pub push_gateway_url: Option<String>,

    /// Per-request timeout for the push gateway, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_title() -> String {
    "New Message".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            title: default_title(),
            push_gateway_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}
