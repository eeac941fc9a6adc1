pub mod sql;

pub mod sqlite_announcement_repo;
pub mod sqlite_device_repo;
pub mod sqlite_event_repo;
pub mod sqlite_guest_event_repo;
pub mod sqlite_schedule_repo;
pub mod sqlite_user_repo;

pub mod postgres_announcement_repo;
pub mod postgres_device_repo;
pub mod postgres_event_repo;
pub mod postgres_guest_event_repo;
pub mod postgres_schedule_repo;
pub mod postgres_user_repo;
