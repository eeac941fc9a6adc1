use crate::domain::models::{event::EventQuery, guest_event::GuestStatus};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Deserialize, Default)]
pub struct ListEventsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub search: Option<String>,
}

impl From<ListEventsQuery> for EventQuery {
    fn from(q: ListEventsQuery) -> Self {
        EventQuery::new(q.limit, q.offset, q.search)
    }
}

#[derive(Deserialize)]
pub struct UpdateGuestStatusRequest {
    pub status: GuestStatus,
}

#[derive(Deserialize, Default)]
pub struct CalendarQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}
