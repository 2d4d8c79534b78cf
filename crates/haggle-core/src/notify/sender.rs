//! Notification sender trait definition.

use haggle_types::error::NotificationError;
use haggle_types::notification::{DeviceTargets, PushNotification};
use uuid::Uuid;

/// External push delivery capability.
///
/// Implementations live in haggle-infra. The core assumes nothing beyond
/// "delivery was attempted"; presence (online/offline) is the provider's
/// concern.
pub trait NotificationSender: Send + Sync {
    /// Deliver one notification to the listed users' registered devices.
    ///
    /// `targets` holds the resolved tokens of `user_ids`; it is never empty.
    fn send_to_users(
        &self,
        user_ids: &[Uuid],
        targets: &DeviceTargets,
        notification: &PushNotification,
    ) -> impl std::future::Future<Output = Result<(), NotificationError>> + Send;
}
