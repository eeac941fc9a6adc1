use crate::domain::{
    models::device::{Device, NotificationLog},
    ports::DeviceRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::error;

pub struct SqliteDeviceRepo {
    pool: SqlitePool,
}

impl SqliteDeviceRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeviceRepository for SqliteDeviceRepo {
    async fn upsert(&self, device: &Device) -> Result<Device, AppError> {
        sqlx::query_as::<_, Device>(
            r#"INSERT INTO devices (id, user_id, fcm_token, device_type, created_at, updated_at, deleted_at)
               VALUES (?, ?, ?, ?, ?, ?, NULL)
               ON CONFLICT (fcm_token) DO UPDATE SET
                   user_id = excluded.user_id,
                   device_type = excluded.device_type,
                   updated_at = excluded.updated_at,
                   deleted_at = NULL
               RETURNING *"#
        )
            .bind(&device.id)
            .bind(&device.user_id)
            .bind(&device.fcm_token)
            .bind(device.device_type.as_str())
            .bind(device.created_at)
            .bind(device.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn tokens_for_event(&self, event_id: &str) -> Result<Vec<String>, AppError> {
        sqlx::query_scalar::<_, String>(
            r#"SELECT DISTINCT d.fcm_token
               FROM devices d
               JOIN guest_events g ON g.user_id = d.user_id
               JOIN users u ON u.id = d.user_id
               WHERE g.event_id = ? AND g.deleted_at IS NULL
                 AND d.deleted_at IS NULL AND u.deleted_at IS NULL"#
        )
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn log_notification(&self, log: &NotificationLog) -> Result<(), AppError> {
        sqlx::query(
            r#"INSERT INTO notification_logs (id, event_id, title, message, fcm_token, success, error_message, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#
        )
            .bind(&log.id)
            .bind(&log.event_id)
            .bind(&log.title)
            .bind(&log.message)
            .bind(&log.fcm_token)
            .bind(log.success)
            .bind(&log.error_message)
            .bind(log.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("SQLite notification log insert failed: {:?}", e);
                AppError::Database(e)
            })?;
        Ok(())
    }

    async fn list_logs(&self, event_id: &str) -> Result<Vec<NotificationLog>, AppError> {
        sqlx::query_as::<_, NotificationLog>(
            "SELECT * FROM notification_logs WHERE event_id = ? ORDER BY created_at DESC",
        )
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
