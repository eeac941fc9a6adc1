use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use super::{announcement::Announcement, guest_event::GuestStatus, schedule::{NewScheduleItem, ScheduleItem}, text_enum};

text_enum! {
    Visibility {
        Public => "PUBLIC",
        Unlisted => "UNLISTED",
        Private => "PRIVATE",
    }
}

text_enum! {
    EventType {
        Wedding => "WEDDING",
        Birthday => "BIRTHDAY",
        Corporate => "CORPORATE",
        CollegeFest => "COLLEGE_FEST",
        Other => "OTHER",
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Event {
    pub id: String,
    pub short_code: String,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub time_zone: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[sqlx(try_from = "String")]
    pub visibility: Visibility,
    #[sqlx(try_from = "String")]
    pub event_type: EventType,
    pub admin_id: String,
    /// Joined from the owning user; not a column of `events`.
    pub admin_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Event {
    pub fn new(admin_id: String, admin_email: Option<String>, short_code: String, input: &NewEvent) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            short_code,
            name: input.name.trim().to_string(),
            description: input.description.clone(),
            location: input.resolved_location(),
            time_zone: input.time_zone.clone(),
            start_date: input.start_date,
            end_date: input.end_date,
            visibility: input.visibility.unwrap_or(Visibility::Public),
            event_type: input.event_type.unwrap_or(EventType::Other),
            admin_id,
            admin_email,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct VenueInput {
    pub name: Option<String>,
    pub full_address: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

impl VenueInput {
    /// Prefers the full address, otherwise joins the named parts.
    pub fn to_location(&self) -> Option<String> {
        if let Some(full) = self.full_address.as_ref().filter(|s| !s.trim().is_empty()) {
            return Some(full.clone());
        }
        self.name.as_ref()?;

        let parts: Vec<&str> = [&self.name, &self.address, &self.city, &self.state, &self.zip_code]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .filter(|p| !p.trim().is_empty())
            .collect();
        Some(parts.join(", "))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NewEvent {
    pub name: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: Option<String>,
    pub venue: Option<VenueInput>,
    pub time_zone: Option<String>,
    pub visibility: Option<Visibility>,
    #[serde(rename = "type")]
    pub event_type: Option<EventType>,
    #[serde(default)]
    pub schedule_items: Vec<NewScheduleItem>,
}

impl NewEvent {
    fn resolved_location(&self) -> Option<String> {
        self.venue
            .as_ref()
            .and_then(VenueInput::to_location)
            .or_else(|| self.location.clone())
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct EventPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub time_zone: Option<String>,
    pub visibility: Option<Visibility>,
    #[serde(rename = "type")]
    pub event_type: Option<EventType>,
}

impl EventPatch {
    pub fn touches_dates(&self) -> bool {
        self.start_date.is_some() || self.end_date.is_some()
    }

    /// The date range the event would have after this patch.
    pub fn effective_range(&self, event: &Event) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            self.start_date.unwrap_or(event.start_date),
            self.end_date.unwrap_or(event.end_date),
        )
    }

    pub fn apply(self, event: &mut Event) {
        if let Some(val) = self.name { event.name = val.trim().to_string(); }
        if let Some(val) = self.description { event.description = Some(val); }
        if let Some(val) = self.start_date { event.start_date = val; }
        if let Some(val) = self.end_date { event.end_date = val; }
        if let Some(val) = self.location { event.location = Some(val); }
        if let Some(val) = self.time_zone { event.time_zone = Some(val); }
        if let Some(val) = self.visibility { event.visibility = val; }
        if let Some(val) = self.event_type { event.event_type = val; }
        event.updated_at = Utc::now();
    }
}

/// An event with the read-side enrichment returned by single-event lookups.
#[derive(Debug, Serialize, Clone)]
pub struct EventDetails {
    #[serde(flatten)]
    pub event: Event,
    pub schedule_items: Vec<ScheduleItem>,
    pub announcements: Vec<Announcement>,
}

/// A calendar entry: the event, its schedule and the viewer's membership, if any.
#[derive(Debug, Serialize, Clone)]
pub struct CalendarEvent {
    #[serde(flatten)]
    pub event: Event,
    pub schedule_items: Vec<ScheduleItem>,
    pub membership_status: Option<GuestStatus>,
}

#[derive(Debug, Clone)]
pub struct EventQuery {
    pub limit: i64,
    pub offset: i64,
    pub search: Option<String>,
    pub event_type: Option<EventType>,
}

impl EventQuery {
    pub const DEFAULT_LIMIT: i64 = 20;
    pub const MAX_LIMIT: i64 = 100;

    pub fn new(limit: Option<i64>, offset: Option<i64>, search: Option<String>) -> Self {
        Self {
            limit: limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(1, Self::MAX_LIMIT),
            offset: offset.unwrap_or(0).max(0),
            search: search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            event_type: None,
        }
    }

    pub fn of_type(mut self, event_type: EventType) -> Self {
        self.event_type = Some(event_type);
        self
    }
}

impl Default for EventQuery {
    fn default() -> Self {
        Self::new(None, None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_venue_prefers_full_address() {
        let venue = VenueInput {
            name: Some("Hall".into()),
            full_address: Some("1 Main St, Springfield".into()),
            ..Default::default()
        };
        assert_eq!(venue.to_location().as_deref(), Some("1 Main St, Springfield"));
    }

    #[test]
    fn test_venue_joins_parts_when_named() {
        let venue = VenueInput {
            name: Some("Hall".into()),
            city: Some("Springfield".into()),
            zip_code: Some("12345".into()),
            ..Default::default()
        };
        assert_eq!(venue.to_location().as_deref(), Some("Hall, Springfield, 12345"));

        let unnamed = VenueInput { city: Some("Springfield".into()), ..Default::default() };
        assert_eq!(unnamed.to_location(), None);
    }

    #[test]
    fn test_event_query_clamps_paging() {
        let q = EventQuery::new(Some(5000), Some(-3), Some("  ".into()));
        assert_eq!(q.limit, EventQuery::MAX_LIMIT);
        assert_eq!(q.offset, 0);
        assert!(q.search.is_none());
    }

    #[test]
    fn test_visibility_text_round_trip() {
        assert_eq!("UNLISTED".parse::<Visibility>().unwrap(), Visibility::Unlisted);
        assert_eq!(EventType::CollegeFest.as_str(), "COLLEGE_FEST");
        assert!("secret".parse::<Visibility>().is_err());
    }
}
