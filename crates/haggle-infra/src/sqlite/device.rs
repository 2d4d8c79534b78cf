//! SQLite device store implementation.

use haggle_core::repository::DeviceStore;
use haggle_types::device::{Device, DeviceType};
use haggle_types::error::RepositoryError;
use sqlx::Row;
use uuid::Uuid;

use super::store::{SqliteChatStore, format_datetime, parse_datetime, parse_uuid, query_err};

struct DeviceRow {
    user_id: String,
    token: String,
    device_type: String,
    created_at: String,
    updated_at: String,
}

impl DeviceRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            user_id: row.try_get("user_id")?,
            token: row.try_get("token")?,
            device_type: row.try_get("device_type")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_device(self) -> Result<Device, RepositoryError> {
        Ok(Device {
            user_id: parse_uuid(&self.user_id)?,
            token: self.token,
            device_type: self
                .device_type
                .parse::<DeviceType>()
                .map_err(RepositoryError::Query)?,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

impl DeviceStore for SqliteChatStore {
    async fn upsert_device(&self, device: &Device) -> Result<Device, RepositoryError> {
        let user_id = device.user_id.to_string();

        sqlx::query(
            r#"INSERT INTO user_devices (user_id, token, device_type, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(user_id, token) DO UPDATE SET
                   device_type = excluded.device_type,
                   updated_at = excluded.updated_at"#,
        )
        .bind(&user_id)
        .bind(&device.token)
        .bind(device.device_type.to_string())
        .bind(format_datetime(&device.created_at))
        .bind(format_datetime(&device.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        // Re-read through the writer so the original created_at survives a refresh.
        let row = sqlx::query(
            "SELECT user_id, token, device_type, created_at, updated_at FROM user_devices WHERE user_id = ? AND token = ?",
        )
        .bind(&user_id)
        .bind(&device.token)
        .fetch_one(&self.pool.writer)
        .await
        .map_err(query_err)?;

        DeviceRow::from_row(&row).map_err(query_err)?.into_device()
    }

    async fn list_devices(&self, user_id: &Uuid) -> Result<Vec<Device>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT user_id, token, device_type, created_at, updated_at FROM user_devices WHERE user_id = ? ORDER BY created_at ASC",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        rows.iter()
            .map(|row| DeviceRow::from_row(row).map_err(query_err)?.into_device())
            .collect()
    }

    async fn list_devices_for_users(&self, user_ids: &[Uuid]) -> Result<Vec<Device>, RepositoryError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; user_ids.len()].join(", ");
        let sql = format!(
            "SELECT user_id, token, device_type, created_at, updated_at FROM user_devices WHERE user_id IN ({placeholders}) ORDER BY user_id, created_at ASC"
        );
        let mut query = sqlx::query(&sql);
        for user_id in user_ids {
            query = query.bind(user_id.to_string());
        }

        let rows = query
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;

        rows.iter()
            .map(|row| DeviceRow::from_row(row).map_err(query_err)?.into_device())
            .collect()
    }

    async fn delete_device(&self, user_id: &Uuid, token: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM user_devices WHERE user_id = ? AND token = ?")
            .bind(user_id.to_string())
            .bind(token)
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;

        Ok(result.rows_affected() > 0)
    }
}
