use serde::Serialize;
use super::{announcement::Announcement, event::Event, schedule::ScheduleItem};

/// Payloads broadcast to everyone subscribed to an event's channel.
#[derive(Debug, Serialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RealtimeMessage {
    ScheduleUpdated { event_id: String, schedule_item: ScheduleItem },
    Announcement { event_id: String, announcement: Announcement },
    EventUpdated { event_id: String, event: Event },
    ScheduleItemDeleted { event_id: String, schedule_item_id: String },
    ScheduleReordered { event_id: String, schedule_items: Vec<ScheduleItem> },
    AnnouncementUpdated { event_id: String, announcement: Announcement },
    AnnouncementDeleted { event_id: String, announcement_id: String },
}

impl RealtimeMessage {
    pub fn event_id(&self) -> &str {
        match self {
            RealtimeMessage::ScheduleUpdated { event_id, .. }
            | RealtimeMessage::Announcement { event_id, .. }
            | RealtimeMessage::EventUpdated { event_id, .. }
            | RealtimeMessage::ScheduleItemDeleted { event_id, .. }
            | RealtimeMessage::ScheduleReordered { event_id, .. }
            | RealtimeMessage::AnnouncementUpdated { event_id, .. }
            | RealtimeMessage::AnnouncementDeleted { event_id, .. } => event_id,
        }
    }
}
