//! Device store trait definition.

use haggle_types::device::Device;
use haggle_types::error::RepositoryError;
use uuid::Uuid;

/// Storage port for push delivery tokens.
pub trait DeviceStore: Send + Sync {
    /// Insert or refresh a device. At most one row exists per (user, token);
    /// re-registering updates `device_type` and `updated_at`.
    fn upsert_device(
        &self,
        device: &Device,
    ) -> impl std::future::Future<Output = Result<Device, RepositoryError>> + Send;

    /// All devices registered for a user.
    fn list_devices(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<Device>, RepositoryError>> + Send;

    /// Every device registered by any of `user_ids`, in one lookup.
    fn list_devices_for_users(
        &self,
        user_ids: &[Uuid],
    ) -> impl std::future::Future<Output = Result<Vec<Device>, RepositoryError>> + Send;

    /// Remove a device token. Returns `true` if a row was deleted.
    fn delete_device(
        &self,
        user_id: &Uuid,
        token: &str,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}
