use crate::domain::{models::announcement::Announcement, ports::AnnouncementRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

pub struct SqliteAnnouncementRepo {
    pool: SqlitePool,
}

impl SqliteAnnouncementRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnnouncementRepository for SqliteAnnouncementRepo {
    async fn create(&self, announcement: &Announcement) -> Result<Announcement, AppError> {
        sqlx::query_as::<_, Announcement>(
            r#"INSERT INTO announcements (id, event_id, sender_id, title, message, created_at, updated_at, deleted_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)
               RETURNING *"#
        )
            .bind(&announcement.id)
            .bind(&announcement.event_id)
            .bind(&announcement.sender_id)
            .bind(&announcement.title)
            .bind(&announcement.message)
            .bind(announcement.created_at)
            .bind(announcement.updated_at)
            .bind(announcement.deleted_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_event(&self, event_id: &str, limit: Option<i64>) -> Result<Vec<Announcement>, AppError> {
        sqlx::query_as::<_, Announcement>(
            "SELECT * FROM announcements WHERE event_id = ? AND deleted_at IS NULL ORDER BY created_at DESC LIMIT ?",
        )
            .bind(event_id)
            .bind(limit.unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Announcement>, AppError> {
        sqlx::query_as::<_, Announcement>("SELECT * FROM announcements WHERE id = ? AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update(&self, announcement: &Announcement) -> Result<Announcement, AppError> {
        sqlx::query_as::<_, Announcement>(
            "UPDATE announcements SET title = ?, message = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL RETURNING *",
        )
            .bind(&announcement.title)
            .bind(&announcement.message)
            .bind(announcement.updated_at)
            .bind(&announcement.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound("Announcement not found".into()))
    }

    async fn soft_delete(&self, id: &str) -> Result<bool, AppError> {
        let now = Utc::now();
        let result = sqlx::query("UPDATE announcements SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL")
            .bind(now)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }
}
