use crate::domain::{
    models::{event::{Event, EventQuery}, schedule::ScheduleItem, RowScope},
    ports::{EventRepository, ShortCodeRegistry},
    services::visibility::VisibilityFilter,
};
use crate::error::AppError;
use crate::infra::repositories::sql::{live, search_condition, visibility_condition, Dialect, SqlParams, EVENT_SELECT};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::error;

pub struct SqliteEventRepo {
    pool: SqlitePool,
}

impl SqliteEventRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShortCodeRegistry for SqliteEventRepo {
    async fn is_taken(&self, code: &str) -> Result<bool, AppError> {
        let hit: Option<String> = sqlx::query_scalar("SELECT id FROM events WHERE short_code = ? LIMIT 1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(hit.is_some())
    }
}

#[async_trait]
impl EventRepository for SqliteEventRepo {
    async fn create_with_schedule(&self, event: &Event, items: &[ScheduleItem]) -> Result<Event, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        sqlx::query(
            r#"INSERT INTO events (
                id, short_code, name, description, location, time_zone, start_date, end_date,
                visibility, event_type, admin_id, created_at, updated_at, deleted_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#
        )
            .bind(&event.id)
            .bind(&event.short_code)
            .bind(&event.name)
            .bind(&event.description)
            .bind(&event.location)
            .bind(&event.time_zone)
            .bind(event.start_date)
            .bind(event.end_date)
            .bind(event.visibility.as_str())
            .bind(event.event_type.as_str())
            .bind(&event.admin_id)
            .bind(event.created_at)
            .bind(event.updated_at)
            .bind(event.deleted_at)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        for item in items {
            sqlx::query(
                r#"INSERT INTO schedule_items (
                    id, event_id, title, description, start_time, end_time, location,
                    order_index, created_by, created_at, updated_at, deleted_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#
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
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    error!("SQLite schedule item insert failed, rolling back event: {:?}", e);
                    AppError::Database(e)
                })?;
        }

        tx.commit().await.map_err(AppError::Database)?;

        self.find_by_id(&event.id)
            .await?
            .ok_or_else(|| AppError::InternalWithMsg("Event vanished after insert".into()))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Event>, AppError> {
        self.find_by_id_scoped(id, RowScope::Active).await
    }

    async fn find_by_short_code(&self, code: &str) -> Result<Option<Event>, AppError> {
        sqlx::query_as::<_, Event>(&format!("{EVENT_SELECT} WHERE e.short_code = ? AND e.deleted_at IS NULL"))
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id_scoped(&self, id: &str, scope: RowScope) -> Result<Option<Event>, AppError> {
        sqlx::query_as::<_, Event>(&format!("{EVENT_SELECT} WHERE e.id = ? AND {}", live("e.deleted_at", scope)))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_visible(&self, filter: &VisibilityFilter, query: &EventQuery) -> Result<Vec<Event>, AppError> {
        let mut params = SqlParams::new(Dialect::Sqlite);
        let mut where_parts = vec![
            "e.deleted_at IS NULL".to_string(),
            visibility_condition(filter, &mut params),
        ];
        if let Some(search) = &query.search {
            where_parts.push(search_condition(search, Dialect::Sqlite, &mut params));
        }
        if let Some(event_type) = query.event_type {
            where_parts.push(format!("e.event_type = {}", params.push(event_type.as_str())));
        }

        let sql = format!(
            "{EVENT_SELECT} WHERE {} ORDER BY e.start_date ASC LIMIT {} OFFSET {}",
            where_parts.join(" AND "),
            query.limit,
            query.offset
        );

        let mut q = sqlx::query_as::<_, Event>(&sql);
        for value in params.into_values() {
            q = q.bind(value);
        }
        q.fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_admin(&self, admin_id: &str) -> Result<Vec<Event>, AppError> {
        sqlx::query_as::<_, Event>(&format!(
            "{EVENT_SELECT} WHERE e.admin_id = ? AND e.deleted_at IS NULL ORDER BY e.start_date DESC"
        ))
            .bind(admin_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_public_upcoming(&self, from: DateTime<Utc>, limit: i64, offset: i64) -> Result<Vec<Event>, AppError> {
        sqlx::query_as::<_, Event>(&format!(
            "{EVENT_SELECT} WHERE e.visibility = 'PUBLIC' AND e.start_date >= ? AND e.deleted_at IS NULL \
             ORDER BY e.start_date ASC LIMIT ? OFFSET ?"
        ))
            .bind(from)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_public_starting_between(&self, from: DateTime<Utc>, to: DateTime<Utc>, limit: i64) -> Result<Vec<Event>, AppError> {
        sqlx::query_as::<_, Event>(&format!(
            "{EVENT_SELECT} WHERE e.visibility = 'PUBLIC' AND e.start_date >= ? AND e.start_date <= ? \
             AND e.deleted_at IS NULL ORDER BY e.start_date ASC LIMIT ?"
        ))
            .bind(from)
            .bind(to)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_calendar(&self, user_id: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<Event>, AppError> {
        sqlx::query_as::<_, Event>(&format!(
            "{EVENT_SELECT} WHERE e.deleted_at IS NULL AND e.start_date >= ? AND e.start_date <= ? \
             AND (e.admin_id = ? OR EXISTS (SELECT 1 FROM guest_events g \
                  WHERE g.event_id = e.id AND g.user_id = ? AND g.deleted_at IS NULL)) \
             ORDER BY e.start_date ASC"
        ))
            .bind(from)
            .bind(to)
            .bind(user_id)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_joined(&self, user_id: &str) -> Result<Vec<Event>, AppError> {
        sqlx::query_as::<_, Event>(&format!(
            "{EVENT_SELECT} JOIN guest_events g ON g.event_id = e.id \
             WHERE g.user_id = ? AND g.deleted_at IS NULL AND e.deleted_at IS NULL \
             ORDER BY e.start_date ASC"
        ))
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update(&self, event: &Event) -> Result<Event, AppError> {
        let result = sqlx::query(
            r#"UPDATE events SET
                name = ?, description = ?, location = ?, time_zone = ?,
                start_date = ?, end_date = ?, visibility = ?, event_type = ?, updated_at = ?
               WHERE id = ? AND deleted_at IS NULL"#
        )
            .bind(&event.name)
            .bind(&event.description)
            .bind(&event.location)
            .bind(&event.time_zone)
            .bind(event.start_date)
            .bind(event.end_date)
            .bind(event.visibility.as_str())
            .bind(event.event_type.as_str())
            .bind(event.updated_at)
            .bind(&event.id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Event not found".into()));
        }
        self.find_by_id(&event.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".into()))
    }

    async fn soft_delete(&self, id: &str) -> Result<(), AppError> {
        let now = Utc::now();
        let result = sqlx::query("UPDATE events SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL")
            .bind(now)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Event not found".into()));
        }
        Ok(())
    }
}
