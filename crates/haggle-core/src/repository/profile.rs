use haggle_types::error::RepositoryError;
use haggle_types::profile::UserProfile;
use uuid::Uuid;

/// Storage port for the counterpart display cache.
pub trait ProfileStore: Send + Sync {
    fn upsert_profile(
        &self,
        profile: &UserProfile,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn get_profile(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<UserProfile>, RepositoryError>> + Send;
}
