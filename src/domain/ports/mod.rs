use crate::domain::models::{
    announcement::Announcement, device::{Device, NotificationLog, PushMessage, PushOutcome},
    event::{Event, EventQuery}, guest_event::{Guest, GuestEvent}, realtime::RealtimeMessage,
    schedule::{ScheduleItem, ScheduleOrder}, user::User, RowScope,
};
use crate::domain::services::{membership::MembershipState, visibility::VisibilityFilter};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

// Every read below is active-only unless it takes a `RowScope`.

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_external_uid(&self, external_uid: &str) -> Result<Option<User>, AppError>;
    async fn link_external_uid(&self, id: &str, external_uid: &str) -> Result<User, AppError>;
}

#[async_trait]
pub trait ShortCodeRegistry: Send + Sync {
    /// Whether any event row, soft-deleted or not, already holds `code`.
    async fn is_taken(&self, code: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Inserts the event and its initial schedule items in one transaction.
    async fn create_with_schedule(&self, event: &Event, items: &[ScheduleItem]) -> Result<Event, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Event>, AppError>;
    async fn find_by_short_code(&self, code: &str) -> Result<Option<Event>, AppError>;
    async fn find_by_id_scoped(&self, id: &str, scope: RowScope) -> Result<Option<Event>, AppError>;
    async fn list_visible(&self, filter: &VisibilityFilter, query: &EventQuery) -> Result<Vec<Event>, AppError>;
    async fn list_by_admin(&self, admin_id: &str) -> Result<Vec<Event>, AppError>;
    async fn list_public_upcoming(&self, from: DateTime<Utc>, limit: i64, offset: i64) -> Result<Vec<Event>, AppError>;
    /// Public events starting within `[from, to]`, soonest first.
    async fn list_public_starting_between(&self, from: DateTime<Utc>, to: DateTime<Utc>, limit: i64) -> Result<Vec<Event>, AppError>;
    /// Events the user owns or holds an active membership on, starting within `[from, to]`.
    async fn list_calendar(&self, user_id: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<Event>, AppError>;
    async fn list_joined(&self, user_id: &str) -> Result<Vec<Event>, AppError>;
    async fn update(&self, event: &Event) -> Result<Event, AppError>;
    async fn soft_delete(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait GuestEventRepository: Send + Sync {
    async fn create(&self, guest_event: &GuestEvent) -> Result<GuestEvent, AppError>;
    async fn find_active(&self, user_id: &str, event_id: &str) -> Result<Option<GuestEvent>, AppError>;
    async fn has_active(&self, user_id: &str, event_id: &str) -> Result<bool, AppError>;
    async fn list_for_pair(&self, user_id: &str, event_id: &str, scope: RowScope) -> Result<Vec<GuestEvent>, AppError>;
    /// Writes the new state onto an active row. `None` if the row is gone or was left.
    async fn update_state(&self, id: &str, state: &MembershipState) -> Result<Option<GuestEvent>, AppError>;
    /// Soft-deletes an active row. `false` if there was nothing to delete.
    async fn soft_delete(&self, id: &str) -> Result<bool, AppError>;
    async fn list_guests(&self, event_id: &str) -> Result<Vec<Guest>, AppError>;
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<GuestEvent>, AppError>;
}

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn create(&self, item: &ScheduleItem) -> Result<ScheduleItem, AppError>;
    async fn list_by_event(&self, event_id: &str) -> Result<Vec<ScheduleItem>, AppError>;
    async fn next_order_index(&self, event_id: &str) -> Result<i32, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<ScheduleItem>, AppError>;
    async fn update(&self, item: &ScheduleItem) -> Result<ScheduleItem, AppError>;
    /// `false` if the item was already gone.
    async fn soft_delete(&self, id: &str) -> Result<bool, AppError>;
    /// Writes every new position in one transaction.
    async fn reorder(&self, event_id: &str, order: &[ScheduleOrder]) -> Result<(), AppError>;
}

#[async_trait]
pub trait AnnouncementRepository: Send + Sync {
    async fn create(&self, announcement: &Announcement) -> Result<Announcement, AppError>;
    /// Newest first.
    async fn list_by_event(&self, event_id: &str, limit: Option<i64>) -> Result<Vec<Announcement>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Announcement>, AppError>;
    async fn update(&self, announcement: &Announcement) -> Result<Announcement, AppError>;
    async fn soft_delete(&self, id: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait DeviceRepository: Send + Sync {
    /// Registers a token for a user, taking it over if another user held it.
    async fn upsert(&self, device: &Device) -> Result<Device, AppError>;
    /// Tokens of active devices whose owners hold an active membership on the event.
    async fn tokens_for_event(&self, event_id: &str) -> Result<Vec<String>, AppError>;
    async fn log_notification(&self, log: &NotificationLog) -> Result<(), AppError>;
    async fn list_logs(&self, event_id: &str) -> Result<Vec<NotificationLog>, AppError>;
}

#[async_trait]
pub trait PushService: Send + Sync {
    async fn send_multicast(&self, tokens: &[String], message: &PushMessage) -> Result<Vec<PushOutcome>, AppError>;
}

/// Fan-out to clients subscribed to an event. Fire-and-forget.
pub trait RealtimePublisher: Send + Sync {
    fn publish(&self, message: RealtimeMessage);
}
