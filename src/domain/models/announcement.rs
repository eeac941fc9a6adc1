use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Announcement {
    pub id: String,
    pub event_id: String,
    pub sender_id: String,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NewAnnouncement {
    pub title: String,
    pub message: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AnnouncementPatch {
    pub title: Option<String>,
    pub message: Option<String>,
}

impl Announcement {
    pub fn new(event_id: String, sender_id: String, input: &NewAnnouncement) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            event_id,
            sender_id,
            title: input.title.trim().to_string(),
            message: input.message.trim().to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

impl AnnouncementPatch {
    /// Fields present but blank.
    pub fn has_blank_field(&self) -> bool {
        [&self.title, &self.message]
            .into_iter()
            .any(|f| f.as_deref().is_some_and(|v| v.trim().is_empty()))
    }

    pub fn apply(self, announcement: &mut Announcement) {
        if let Some(val) = self.title { announcement.title = val.trim().to_string(); }
        if let Some(val) = self.message { announcement.message = val.trim().to_string(); }
        announcement.updated_at = Utc::now();
    }
}
