use std::collections::HashSet;
use std::sync::Arc;
use chrono::{DateTime, Duration, Months, Utc};
use chrono_tz::Tz;
use tracing::{info, warn};
use crate::domain::{
    models::{
        announcement::{Announcement, AnnouncementPatch, NewAnnouncement},
        auth::Viewer,
        event::{Event, EventDetails, EventPatch, EventQuery, EventType, NewEvent, Visibility},
        realtime::RealtimeMessage,
        schedule::{NewScheduleItem, ScheduleItem, ScheduleOrder, SchedulePatch},
        user::User,
    },
    ports::{AnnouncementRepository, EventRepository, ScheduleRepository},
    services::{
        event_access::EventAccess,
        notification::{push_message, Notifier},
        short_code::{exhausted, normalize_short_code, ShortCodeAllocator, MAX_SHORT_CODE_ATTEMPTS},
    },
};
use crate::error::AppError;

/// Announcements embedded in single-event reads.
pub const RECENT_ANNOUNCEMENTS: i64 = 10;

/// How far ahead "happening now" looks, in hours.
pub const HAPPENING_NOW_WINDOW_HOURS: i64 = 48;
pub const HAPPENING_NOW_LIMIT: i64 = 5;

pub struct EventService {
    events: Arc<dyn EventRepository>,
    schedule: Arc<dyn ScheduleRepository>,
    announcements: Arc<dyn AnnouncementRepository>,
    access: EventAccess,
    codes: ShortCodeAllocator,
    notifier: Notifier,
}

impl EventService {
    pub fn new(
        events: Arc<dyn EventRepository>,
        schedule: Arc<dyn ScheduleRepository>,
        announcements: Arc<dyn AnnouncementRepository>,
        access: EventAccess,
        codes: ShortCodeAllocator,
        notifier: Notifier,
    ) -> Self {
        Self { events, schedule, announcements, access, codes, notifier }
    }

    pub fn access(&self) -> &EventAccess {
        &self.access
    }

    pub async fn create_event(&self, admin: &User, input: NewEvent) -> Result<EventDetails, AppError> {
        validate_name(&input.name)?;
        validate_range(input.start_date, input.end_date)?;
        validate_time_zone(input.time_zone.as_deref())?;
        for item in &input.schedule_items {
            validate_schedule_item(item)?;
        }

        for attempt in 1..=MAX_SHORT_CODE_ATTEMPTS {
            let code = self.codes.allocate().await?;
            let event = Event::new(admin.id.clone(), admin.email.clone(), code, &input);
            let items: Vec<ScheduleItem> = input
                .schedule_items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    ScheduleItem::new(event.id.clone(), admin.id.clone(), item, item.order_index.unwrap_or(i as i32))
                })
                .collect();

            match self.events.create_with_schedule(&event, &items).await {
                Ok(created) => {
                    info!(event_id = %created.id, short_code = %created.short_code, "Event created");
                    let mut schedule_items = items;
                    schedule_items.sort_by(|a, b| a.order_index.cmp(&b.order_index).then(a.start_time.cmp(&b.start_time)));
                    return Ok(EventDetails { event: created, schedule_items, announcements: vec![] });
                }
                // Lost the race for the code between the pre-check and the insert.
                Err(e) if e.is_unique_violation() => {
                    warn!(attempt, "Short code taken on insert, retrying");
                }
                Err(e) => return Err(e),
            }
        }
        Err(exhausted())
    }

    pub async fn update_event(&self, id: &str, viewer: &Viewer, patch: EventPatch) -> Result<Event, AppError> {
        let mut event = self.load(id).await?;
        self.access.authorize_mutation(&event, viewer).await?;

        if let Some(name) = &patch.name {
            validate_name(name)?;
        }
        if patch.touches_dates() {
            let (start, end) = patch.effective_range(&event);
            validate_range(start, end)?;
        }
        validate_time_zone(patch.time_zone.as_deref())?;

        patch.apply(&mut event);
        let updated = self.events.update(&event).await?;
        info!(event_id = %updated.id, "Event updated");

        self.notifier.dispatch(
            RealtimeMessage::EventUpdated { event_id: updated.id.clone(), event: updated.clone() },
            push_message("Event Updated", format!("{} has been updated", updated.name), "event_updated", &updated.id),
        );
        Ok(updated)
    }

    pub async fn delete_event(&self, id: &str, viewer: &Viewer) -> Result<(), AppError> {
        let event = self.load(id).await?;
        self.access.authorize_mutation(&event, viewer).await?;
        self.events.soft_delete(&event.id).await?;
        info!(event_id = %event.id, "Event soft-deleted");
        Ok(())
    }

    pub async fn get_event_by_id(&self, id: &str, viewer: Option<&Viewer>) -> Result<EventDetails, AppError> {
        let event = self.load(id).await?;
        self.access.authorize_read(&event, viewer).await?;
        self.details(event).await
    }

    /// Holding the code grants access to public and unlisted events.
    /// Private events still go through the read check.
    pub async fn get_event_by_short_code(&self, code: &str, viewer: Option<&Viewer>) -> Result<EventDetails, AppError> {
        let event = self.load_by_short_code(code).await?;
        if event.visibility == Visibility::Private {
            self.access.authorize_read(&event, viewer).await?;
        }
        self.details(event).await
    }

    pub async fn list_visible_events(&self, viewer: Option<&Viewer>, query: &EventQuery) -> Result<Vec<Event>, AppError> {
        let filter = self.access.visibility_filter(viewer);
        self.events.list_visible(&filter, query).await
    }

    pub async fn list_admin_events(&self, viewer: &Viewer) -> Result<Vec<Event>, AppError> {
        self.events.list_by_admin(&viewer.user_id).await
    }

    pub async fn list_public_events(&self, query: &EventQuery) -> Result<Vec<Event>, AppError> {
        self.events.list_public_upcoming(Utc::now(), query.limit, query.offset).await
    }

    /// Public events starting within the next two days.
    pub async fn list_happening_now(&self) -> Result<Vec<Event>, AppError> {
        let now = Utc::now();
        self.events
            .list_public_starting_between(now, now + Duration::hours(HAPPENING_NOW_WINDOW_HOURS), HAPPENING_NOW_LIMIT)
            .await
    }

    pub fn event_types(&self) -> &'static [EventType] {
        EventType::ALL
    }

    pub async fn list_events_by_type(&self, event_type: EventType, viewer: Option<&Viewer>, query: EventQuery) -> Result<Vec<Event>, AppError> {
        self.list_visible_events(viewer, &query.of_type(event_type)).await
    }

    /// Owned and joined events starting in `[from, to]`. `from` defaults to now
    /// and `to` to one month after `from`.
    pub async fn list_calendar_events(
        &self,
        viewer: &Viewer,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Event>, AppError> {
        let from = from.unwrap_or_else(Utc::now);
        let to = match to {
            Some(to) => to,
            None => from
                .checked_add_months(Months::new(1))
                .ok_or_else(|| AppError::Validation("Calendar range is out of bounds".into()))?,
        };
        validate_range(from, to)?;
        self.events.list_calendar(&viewer.user_id, from, to).await
    }

    pub async fn create_schedule_item(&self, event_id: &str, viewer: &Viewer, input: NewScheduleItem) -> Result<ScheduleItem, AppError> {
        let event = self.load(event_id).await?;
        self.access.authorize_mutation(&event, viewer).await?;
        validate_schedule_item(&input)?;

        let order_index = match input.order_index {
            Some(idx) => idx,
            None => self.schedule.next_order_index(&event.id).await?,
        };
        let item = ScheduleItem::new(event.id.clone(), viewer.user_id.clone(), &input, order_index);
        let created = self.schedule.create(&item).await?;

        self.notifier.dispatch(
            RealtimeMessage::ScheduleUpdated { event_id: event.id.clone(), schedule_item: created.clone() },
            push_message("Schedule Updated", format!("{}: {}", event.name, created.title), "schedule_updated", &event.id),
        );
        Ok(created)
    }

    pub async fn update_schedule_item(
        &self,
        event_id: &str,
        item_id: &str,
        viewer: &Viewer,
        patch: SchedulePatch,
    ) -> Result<ScheduleItem, AppError> {
        let event = self.load(event_id).await?;
        self.access.authorize_mutation(&event, viewer).await?;
        let mut item = self.load_schedule_item(&event, item_id).await?;

        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(AppError::Validation("Schedule item title is required".into()));
        }
        let (start, end) = patch.effective_range(&item);
        if start >= end {
            return Err(AppError::Validation("Schedule item must end after it starts".into()));
        }

        patch.apply(&mut item);
        let updated = self.schedule.update(&item).await?;
        info!(event_id = %event.id, schedule_item_id = %updated.id, "Schedule item updated");

        self.notifier.dispatch(
            RealtimeMessage::ScheduleUpdated { event_id: event.id.clone(), schedule_item: updated.clone() },
            push_message("Schedule Updated", format!("{}: {}", event.name, updated.title), "schedule_updated", &event.id),
        );
        Ok(updated)
    }

    pub async fn delete_schedule_item(&self, event_id: &str, item_id: &str, viewer: &Viewer) -> Result<(), AppError> {
        let event = self.load(event_id).await?;
        self.access.authorize_mutation(&event, viewer).await?;
        let item = self.load_schedule_item(&event, item_id).await?;

        if !self.schedule.soft_delete(&item.id).await? {
            return Err(AppError::NotFound("Schedule item not found".into()));
        }
        info!(event_id = %event.id, schedule_item_id = %item.id, "Schedule item soft-deleted");

        self.notifier.broadcast(RealtimeMessage::ScheduleItemDeleted {
            event_id: event.id.clone(),
            schedule_item_id: item.id,
        });
        Ok(())
    }

    /// Moves items to new positions. Every id must be a distinct active item
    /// of this event; the full schedule is returned in its new order.
    pub async fn reorder_schedule_items(
        &self,
        event_id: &str,
        viewer: &Viewer,
        order: Vec<ScheduleOrder>,
    ) -> Result<Vec<ScheduleItem>, AppError> {
        let event = self.load(event_id).await?;
        self.access.authorize_mutation(&event, viewer).await?;

        let current = self.schedule.list_by_event(&event.id).await?;
        let known: HashSet<&str> = current.iter().map(|i| i.id.as_str()).collect();
        let mut seen = HashSet::new();
        if !order.iter().all(|entry| known.contains(entry.id.as_str()) && seen.insert(entry.id.as_str())) {
            return Err(AppError::Validation("One or more schedule items are invalid".into()));
        }

        self.schedule.reorder(&event.id, &order).await?;
        let schedule_items = self.schedule.list_by_event(&event.id).await?;
        info!(event_id = %event.id, moved = order.len(), "Schedule reordered");

        self.notifier.broadcast(RealtimeMessage::ScheduleReordered {
            event_id: event.id.clone(),
            schedule_items: schedule_items.clone(),
        });
        Ok(schedule_items)
    }

    pub async fn list_schedule(&self, event_id: &str, viewer: Option<&Viewer>) -> Result<Vec<ScheduleItem>, AppError> {
        let event = self.load(event_id).await?;
        self.access.authorize_read(&event, viewer).await?;
        self.schedule.list_by_event(&event.id).await
    }

    pub async fn create_announcement(&self, event_id: &str, viewer: &Viewer, input: NewAnnouncement) -> Result<Announcement, AppError> {
        let event = self.load(event_id).await?;
        self.access.authorize_mutation(&event, viewer).await?;
        if input.title.trim().is_empty() || input.message.trim().is_empty() {
            return Err(AppError::Validation("Announcement title and message are required".into()));
        }

        let announcement = Announcement::new(event.id.clone(), viewer.user_id.clone(), &input);
        let created = self.announcements.create(&announcement).await?;

        self.notifier.dispatch(
            RealtimeMessage::Announcement { event_id: event.id.clone(), announcement: created.clone() },
            push_message(created.title.clone(), created.message.clone(), "announcement", &event.id),
        );
        Ok(created)
    }

    pub async fn list_announcements(&self, event_id: &str, viewer: Option<&Viewer>) -> Result<Vec<Announcement>, AppError> {
        let event = self.load(event_id).await?;
        self.access.authorize_read(&event, viewer).await?;
        self.announcements.list_by_event(&event.id, None).await
    }

    pub async fn get_announcement(&self, event_id: &str, announcement_id: &str, viewer: Option<&Viewer>) -> Result<Announcement, AppError> {
        let event = self.load(event_id).await?;
        self.access.authorize_read(&event, viewer).await?;
        self.load_announcement(&event, announcement_id).await
    }

    pub async fn update_announcement(
        &self,
        event_id: &str,
        announcement_id: &str,
        viewer: &Viewer,
        patch: AnnouncementPatch,
    ) -> Result<Announcement, AppError> {
        let event = self.load(event_id).await?;
        self.access.authorize_mutation(&event, viewer).await?;
        let mut announcement = self.load_announcement(&event, announcement_id).await?;
        if patch.has_blank_field() {
            return Err(AppError::Validation("Announcement title and message are required".into()));
        }

        patch.apply(&mut announcement);
        let updated = self.announcements.update(&announcement).await?;
        info!(event_id = %event.id, announcement_id = %updated.id, "Announcement updated");

        self.notifier.dispatch(
            RealtimeMessage::AnnouncementUpdated { event_id: event.id.clone(), announcement: updated.clone() },
            push_message(updated.title.clone(), updated.message.clone(), "announcement_updated", &event.id),
        );
        Ok(updated)
    }

    pub async fn delete_announcement(&self, event_id: &str, announcement_id: &str, viewer: &Viewer) -> Result<(), AppError> {
        let event = self.load(event_id).await?;
        self.access.authorize_mutation(&event, viewer).await?;
        let announcement = self.load_announcement(&event, announcement_id).await?;

        if !self.announcements.soft_delete(&announcement.id).await? {
            return Err(AppError::NotFound("Announcement not found".into()));
        }
        info!(event_id = %event.id, announcement_id = %announcement.id, "Announcement soft-deleted");

        self.notifier.broadcast(RealtimeMessage::AnnouncementDeleted {
            event_id: event.id.clone(),
            announcement_id: announcement.id,
        });
        Ok(())
    }

    pub async fn load(&self, id: &str) -> Result<Event, AppError> {
        self.events
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".into()))
    }

    pub async fn load_by_short_code(&self, code: &str) -> Result<Event, AppError> {
        self.events
            .find_by_short_code(&normalize_short_code(code))
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".into()))
    }

    /// Items of other events are reported as missing.
    async fn load_schedule_item(&self, event: &Event, item_id: &str) -> Result<ScheduleItem, AppError> {
        self.schedule
            .find_by_id(item_id)
            .await?
            .filter(|item| item.event_id == event.id)
            .ok_or_else(|| AppError::NotFound("Schedule item not found".into()))
    }

    async fn load_announcement(&self, event: &Event, announcement_id: &str) -> Result<Announcement, AppError> {
        self.announcements
            .find_by_id(announcement_id)
            .await?
            .filter(|a| a.event_id == event.id)
            .ok_or_else(|| AppError::NotFound("Announcement not found".into()))
    }

    pub async fn schedule_of(&self, event_id: &str) -> Result<Vec<ScheduleItem>, AppError> {
        self.schedule.list_by_event(event_id).await
    }

    pub async fn details(&self, event: Event) -> Result<EventDetails, AppError> {
        let schedule_items = self.schedule.list_by_event(&event.id).await?;
        let announcements = self.announcements.list_by_event(&event.id, Some(RECENT_ANNOUNCEMENTS)).await?;
        Ok(EventDetails { event, schedule_items, announcements })
    }
}

fn validate_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Event name is required".into()));
    }
    Ok(())
}

pub fn validate_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), AppError> {
    if start >= end {
        return Err(AppError::Validation("End date must be after start date".into()));
    }
    Ok(())
}

fn validate_time_zone(tz: Option<&str>) -> Result<(), AppError> {
    match tz {
        Some(name) if name.parse::<Tz>().is_err() => {
            Err(AppError::Validation(format!("Unknown time zone: {}", name)))
        }
        _ => Ok(()),
    }
}

fn validate_schedule_item(item: &NewScheduleItem) -> Result<(), AppError> {
    if item.title.trim().is_empty() {
        return Err(AppError::Validation("Schedule item title is required".into()));
    }
    if item.start_time >= item.end_time {
        return Err(AppError::Validation("Schedule item must end after it starts".into()));
    }
    Ok(())
}
