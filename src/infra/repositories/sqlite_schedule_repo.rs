use crate::domain::{models::schedule::{ScheduleItem, ScheduleOrder}, ports::ScheduleRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

pub struct SqliteScheduleRepo {
    pool: SqlitePool,
}

impl SqliteScheduleRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScheduleRepository for SqliteScheduleRepo {
    async fn create(&self, item: &ScheduleItem) -> Result<ScheduleItem, AppError> {
        sqlx::query_as::<_, ScheduleItem>(
            r#"INSERT INTO schedule_items (
                id, event_id, title, description, start_time, end_time, location,
                order_index, created_by, created_at, updated_at, deleted_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *"#
        )
            .bind(&item.id)
            .bind(&item.event_id)
            .bind(&item.title)
            .bind(&item.description)
            .bind(item.start_time)
            .bind(item.end_time)
            .bind(&item.location)
            .bind(item.order_index)
            .bind(&item.created_by)
            .bind(item.created_at)
            .bind(item.updated_at)
            .bind(item.deleted_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_event(&self, event_id: &str) -> Result<Vec<ScheduleItem>, AppError> {
        sqlx::query_as::<_, ScheduleItem>(
            "SELECT * FROM schedule_items WHERE event_id = ? AND deleted_at IS NULL ORDER BY order_index ASC, start_time ASC",
        )
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn next_order_index(&self, event_id: &str) -> Result<i32, AppError> {
        let max: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(order_index) FROM schedule_items WHERE event_id = ? AND deleted_at IS NULL",
        )
            .bind(event_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(max.map_or(0, |m| m as i32 + 1))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ScheduleItem>, AppError> {
        sqlx::query_as::<_, ScheduleItem>("SELECT * FROM schedule_items WHERE id = ? AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update(&self, item: &ScheduleItem) -> Result<ScheduleItem, AppError> {
        sqlx::query_as::<_, ScheduleItem>(
            r#"UPDATE schedule_items SET
                title = ?, description = ?, start_time = ?, end_time = ?, location = ?,
                order_index = ?, updated_at = ?
               WHERE id = ? AND deleted_at IS NULL
               RETURNING *"#
        )
            .bind(&item.title)
            .bind(&item.description)
            .bind(item.start_time)
            .bind(item.end_time)
            .bind(&item.location)
            .bind(item.order_index)
            .bind(item.updated_at)
            .bind(&item.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Schedule item not found".into()))
    }

    async fn soft_delete(&self, id: &str) -> Result<bool, AppError> {
        let now = Utc::now();
        let result = sqlx::query("UPDATE schedule_items SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL")
            .bind(now)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }

    async fn reorder(&self, event_id: &str, order: &[ScheduleOrder]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let now = Utc::now();
        for entry in order {
            let result = sqlx::query(
                "UPDATE schedule_items SET order_index = ?, updated_at = ? WHERE id = ? AND event_id = ? AND deleted_at IS NULL",
            )
                .bind(entry.order_index)
                .bind(now)
                .bind(&entry.id)
                .bind(event_id)
                .execute(&mut *tx)
                .await
                .map_err(AppError::Database)?;
            // Dropping the transaction rolls back the positions already written.
            if result.rows_affected() == 0 {
                return Err(AppError::Validation("One or more schedule items are invalid".into()));
            }
        }
        tx.commit().await.map_err(AppError::Database)
    }
}
