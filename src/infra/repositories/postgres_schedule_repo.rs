use crate::domain::{models::schedule::{ScheduleItem, ScheduleOrder}, ports::ScheduleRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

pub struct PostgresScheduleRepo {
    pool: PgPool,
}

impl PostgresScheduleRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScheduleRepository for PostgresScheduleRepo {
    async fn create(&self, item: &ScheduleItem) -> Result<ScheduleItem, AppError> {
        sqlx::query_as::<_, ScheduleItem>(
            r#"INSERT INTO schedule_items (
                id, event_id, title, description, start_time, end_time, location,
                order_index, created_by, created_at, updated_at, deleted_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
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
            "SELECT * FROM schedule_items WHERE event_id = $1 AND deleted_at IS NULL ORDER BY order_index ASC, start_time ASC",
        )
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn next_order_index(&self, event_id: &str) -> Result<i32, AppError> {
        let max: Option<i32> = sqlx::query_scalar(
            "SELECT MAX(order_index) FROM schedule_items WHERE event_id = $1 AND deleted_at IS NULL",
        )
            .bind(event_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(max.map_or(0, |m| m + 1))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ScheduleItem>, AppError> {
        sqlx::query_as::<_, ScheduleItem>("SELECT * FROM schedule_items WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update(&self, item: &ScheduleItem) -> Result<ScheduleItem, AppError> {
        sqlx::query_as::<_, ScheduleItem>(
            r#"UPDATE schedule_items SET
                title = $1, description = $2, start_time = $3, end_time = $4, location = $5,
                order_index = $6, updated_at = $7
               WHERE id = $8 AND deleted_at IS NULL
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
        let result = sqlx::query("UPDATE schedule_items SET deleted_at = $1, updated_at = $2 WHERE id = $3 AND deleted_at IS NULL")
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
                "UPDATE schedule_items SET order_index = $1, updated_at = $2 WHERE id = $3 AND event_id = $4 AND deleted_at IS NULL",
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
