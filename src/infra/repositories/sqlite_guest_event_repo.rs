use crate::domain::{
    models::{guest_event::{Guest, GuestEvent}, RowScope},
    ports::GuestEventRepository,
    services::membership::MembershipState,
};
use crate::error::AppError;
use crate::infra::repositories::sql::live;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

pub struct SqliteGuestEventRepo {
    pool: SqlitePool,
}

impl SqliteGuestEventRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GuestEventRepository for SqliteGuestEventRepo {
    async fn create(&self, guest_event: &GuestEvent) -> Result<GuestEvent, AppError> {
        sqlx::query_as::<_, GuestEvent>(
            r#"INSERT INTO guest_events (
                id, user_id, event_id, status, joined_at, checked_in_at, created_at, updated_at, deleted_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *"#
        )
            .bind(&guest_event.id)
            .bind(&guest_event.user_id)
            .bind(&guest_event.event_id)
            .bind(guest_event.status.as_str())
            .bind(guest_event.joined_at)
            .bind(guest_event.checked_in_at)
            .bind(guest_event.created_at)
            .bind(guest_event.updated_at)
            .bind(guest_event.deleted_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_active(&self, user_id: &str, event_id: &str) -> Result<Option<GuestEvent>, AppError> {
        sqlx::query_as::<_, GuestEvent>(
            "SELECT * FROM guest_events WHERE user_id = ? AND event_id = ? AND deleted_at IS NULL",
        )
            .bind(user_id)
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn has_active(&self, user_id: &str, event_id: &str) -> Result<bool, AppError> {
        let hit: Option<String> = sqlx::query_scalar(
            "SELECT id FROM guest_events WHERE user_id = ? AND event_id = ? AND deleted_at IS NULL LIMIT 1",
        )
            .bind(user_id)
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(hit.is_some())
    }

    async fn list_for_pair(&self, user_id: &str, event_id: &str, scope: RowScope) -> Result<Vec<GuestEvent>, AppError> {
        sqlx::query_as::<_, GuestEvent>(&format!(
            "SELECT * FROM guest_events WHERE user_id = ? AND event_id = ? AND {} ORDER BY created_at ASC",
            live("deleted_at", scope)
        ))
            .bind(user_id)
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update_state(&self, id: &str, state: &MembershipState) -> Result<Option<GuestEvent>, AppError> {
        sqlx::query_as::<_, GuestEvent>(
            r#"UPDATE guest_events SET status = ?, joined_at = ?, checked_in_at = ?, updated_at = ?
               WHERE id = ? AND deleted_at IS NULL RETURNING *"#
        )
            .bind(state.status.as_str())
            .bind(state.joined_at)
            .bind(state.checked_in_at)
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn soft_delete(&self, id: &str) -> Result<bool, AppError> {
        let now = Utc::now();
        let result = sqlx::query("UPDATE guest_events SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL")
            .bind(now)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_guests(&self, event_id: &str) -> Result<Vec<Guest>, AppError> {
        sqlx::query_as::<_, Guest>(
            r#"SELECT g.*, u.name AS user_name, u.email AS user_email
               FROM guest_events g JOIN users u ON u.id = g.user_id
               WHERE g.event_id = ? AND g.deleted_at IS NULL
               ORDER BY COALESCE(g.joined_at, g.created_at) DESC"#
        )
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<GuestEvent>, AppError> {
        sqlx::query_as::<_, GuestEvent>(
            "SELECT * FROM guest_events WHERE user_id = ? AND deleted_at IS NULL ORDER BY created_at DESC",
        )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
