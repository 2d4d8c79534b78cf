//! Push delivery devices registered by users.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Platform a delivery token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Ios,
    Android,
    Web,
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceType::Ios => write!(f, "ios"),
            DeviceType::Android => write!(f, "android"),
            DeviceType::Web => write!(f, "web"),
        }
    }
}

impl FromStr for DeviceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ios" => Ok(DeviceType::Ios),
            "android" => Ok(DeviceType::Android),
            "web" => Ok(DeviceType::Web),
            other => Err(format!("invalid device type: '{other}'")),
        }
    }
}

/// A delivery token registered for a user. Unique per (user, token).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub user_id: Uuid,
    pub token: String,
    pub device_type: DeviceType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
