//! SQLite profile cache implementation.

use haggle_core::repository::ProfileStore;
use haggle_types::error::RepositoryError;
use haggle_types::profile::UserProfile;
use sqlx::Row;
use uuid::Uuid;

use super::store::{SqliteChatStore, format_datetime, parse_datetime, parse_uuid, query_err};

impl ProfileStore for SqliteChatStore {
    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO user_profiles (user_id, display_name, avatar_url, updated_at)
               VALUES (?, ?, ?, ?)
               ON CONFLICT(user_id) DO UPDATE SET
                   display_name = excluded.display_name,
                   avatar_url = excluded.avatar_url,
                   updated_at = excluded.updated_at"#,
        )
        .bind(profile.user_id.to_string())
        .bind(&profile.display_name)
        .bind(&profile.avatar_url)
        .bind(format_datetime(&profile.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        Ok(())
    }

    async fn get_profile(&self, user_id: &Uuid) -> Result<Option<UserProfile>, RepositoryError> {
        let row = sqlx::query(
            "SELECT user_id, display_name, avatar_url, updated_at FROM user_profiles WHERE user_id = ?",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_err)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let user_id: String = row.try_get("user_id").map_err(query_err)?;
        let updated_at: String = row.try_get("updated_at").map_err(query_err)?;
        Ok(Some(UserProfile {
            user_id: parse_uuid(&user_id)?,
            display_name: row.try_get("display_name").map_err(query_err)?,
            avatar_url: row.try_get("avatar_url").map_err(query_err)?,
            updated_at: parse_datetime(&updated_at)?,
        }))
    }
}
