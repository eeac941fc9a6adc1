use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct ScheduleItem {
    pub id: String,
    pub event_id: String,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: Option<String>,
    pub order_index: i32,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NewScheduleItem {
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: Option<String>,
    pub order_index: Option<i32>,
}

/// Partial update. Times not given keep their stored value.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SchedulePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub order_index: Option<i32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleOrder {
    pub id: String,
    pub order_index: i32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReorderRequest {
    pub items: Vec<ScheduleOrder>,
}

impl ScheduleItem {
    pub fn new(event_id: String, created_by: String, input: &NewScheduleItem, order_index: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            event_id,
            title: input.title.trim().to_string(),
            description: input.description.clone(),
            start_time: input.start_time,
            end_time: input.end_time,
            location: input.location.clone(),
            order_index,
            created_by,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

impl SchedulePatch {
    pub fn effective_range(&self, item: &ScheduleItem) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            self.start_time.unwrap_or(item.start_time),
            self.end_time.unwrap_or(item.end_time),
        )
    }

    pub fn apply(self, item: &mut ScheduleItem) {
        if let Some(val) = self.title { item.title = val.trim().to_string(); }
        if let Some(val) = self.description { item.description = Some(val); }
        if let Some(val) = self.start_time { item.start_time = val; }
        if let Some(val) = self.end_time { item.end_time = val; }
        if let Some(val) = self.location { item.location = Some(val); }
        if let Some(val) = self.order_index { item.order_index = val; }
        item.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_patch_range_falls_back_to_stored_times() {
        let start = Utc::now();
        let input = NewScheduleItem {
            title: "Keynote".into(),
            description: None,
            start_time: start,
            end_time: start + Duration::hours(1),
            location: None,
            order_index: None,
        };
        let item = ScheduleItem::new("e1".into(), "u1".into(), &input, 0);

        let patch = SchedulePatch { end_time: Some(start + Duration::hours(3)), ..Default::default() };
        assert_eq!(patch.effective_range(&item), (start, start + Duration::hours(3)));

        let mut moved = item.clone();
        SchedulePatch { title: Some("  Closing  ".into()), order_index: Some(4), ..Default::default() }.apply(&mut moved);
        assert_eq!(moved.title, "Closing");
        assert_eq!(moved.order_index, 4);
        assert_eq!(moved.start_time, item.start_time);
    }
}
