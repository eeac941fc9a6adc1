use std::collections::HashMap;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use tracing::{debug, info};
use crate::domain::{
    models::{
        auth::Viewer,
        event::{CalendarEvent, Event, Visibility},
        guest_event::{Guest, GuestEvent, GuestStatus, InviteRequest, JoinRequest, JoinedEvent, Membership},
        user::User,
        RowScope,
    },
    ports::{EventRepository, GuestEventRepository},
    services::{
        event_service::EventService,
        identity::IdentityService,
        membership::{transition, MembershipAction, Transition, TransitionError},
    },
};
use crate::error::AppError;

pub struct GuestService {
    guests: Arc<dyn GuestEventRepository>,
    events: Arc<dyn EventRepository>,
    event_service: Arc<EventService>,
    identity: IdentityService,
}

impl GuestService {
    pub fn new(
        guests: Arc<dyn GuestEventRepository>,
        events: Arc<dyn EventRepository>,
        event_service: Arc<EventService>,
        identity: IdentityService,
    ) -> Self {
        Self { guests, events, event_service, identity }
    }

    /// Self-service join. Idempotent per (user, event); private events are invitation-only.
    /// An authenticated caller always joins as themselves.
    pub async fn join_event(&self, request: JoinRequest, caller: Option<&User>) -> Result<JoinedEvent, AppError> {
        let event = self.resolve_event(&request).await?;
        if event.visibility == Visibility::Private {
            return Err(AppError::Forbidden("Private events can only be joined by invitation".into()));
        }

        let user_id = match caller {
            Some(user) => user.id.clone(),
            None => self.resolve_guest(request.user_id, request.email, request.name).await?.id,
        };

        let membership = self.apply(&user_id, &event.id, MembershipAction::Join).await?;
        info!(event_id = %event.id, user_id = %user_id, status = %membership.status, "Guest joined event");

        let event = self.event_service.details(event).await?;
        Ok(JoinedEvent { membership, event })
    }

    /// Owner-only. Existing members are left as they are.
    pub async fn invite_guest(&self, event_id: &str, viewer: &Viewer, request: InviteRequest) -> Result<GuestEvent, AppError> {
        let event = self.event_service.load(event_id).await?;
        self.event_service.access().authorize_mutation(&event, viewer).await?;

        let user = self.resolve_guest(request.user_id, request.email, request.name).await?;
        let membership = self.apply(&user.id, &event.id, MembershipAction::Invite).await?;
        info!(event_id = %event.id, user_id = %user.id, "Guest invited");
        Ok(membership)
    }

    pub async fn update_guest_status(&self, user_id: &str, event_id: &str, status: GuestStatus) -> Result<GuestEvent, AppError> {
        let event = self.event_service.load(event_id).await?;
        let membership = self.apply(user_id, &event.id, MembershipAction::SetStatus(status)).await?;
        info!(event_id, user_id, status = %membership.status, "Guest status updated");
        Ok(membership)
    }

    pub async fn leave_event(&self, user_id: &str, event_id: &str) -> Result<(), AppError> {
        let event = self.event_service.load(event_id).await?;
        let membership = self
            .guests
            .find_active(user_id, &event.id)
            .await?
            .ok_or(TransitionError::NoMembership)?;

        if !self.guests.soft_delete(&membership.id).await? {
            return Err(TransitionError::NoMembership.into());
        }
        info!(event_id, user_id, "Guest left event");
        Ok(())
    }

    pub async fn list_guests(&self, event_id: &str, viewer: Option<&Viewer>) -> Result<Vec<Guest>, AppError> {
        let event = self.event_service.load(event_id).await?;
        self.event_service.access().authorize_read(&event, viewer).await?;
        self.guests.list_guests(&event.id).await
    }

    /// The caller's active memberships together with the events they point at.
    pub async fn list_memberships(&self, user_id: &str) -> Result<Vec<Membership>, AppError> {
        let rows = self.guests.list_by_user(user_id).await?;
        let mut events = self.events.list_joined(user_id).await?;

        let mut memberships = Vec::with_capacity(rows.len());
        for membership in rows {
            if let Some(pos) = events.iter().position(|e| e.id == membership.event_id) {
                let event = events.swap_remove(pos);
                memberships.push(Membership { membership, event });
            }
        }
        Ok(memberships)
    }

    /// Owned and joined events in the range, each with its schedule and the
    /// caller's membership status. Owners without a membership get `None`.
    pub async fn calendar(
        &self,
        viewer: &Viewer,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<CalendarEvent>, AppError> {
        let events = self.event_service.list_calendar_events(viewer, from, to).await?;
        let statuses: HashMap<String, GuestStatus> = self
            .guests
            .list_by_user(&viewer.user_id)
            .await?
            .into_iter()
            .map(|m| (m.event_id, m.status))
            .collect();

        let mut entries = Vec::with_capacity(events.len());
        for event in events {
            let schedule_items = self.event_service.schedule_of(&event.id).await?;
            let membership_status = statuses.get(&event.id).copied();
            entries.push(CalendarEvent { event, schedule_items, membership_status });
        }
        Ok(entries)
    }

    /// Every row for the pair, left ones included.
    pub async fn membership_history(&self, user_id: &str, event_id: &str) -> Result<Vec<GuestEvent>, AppError> {
        self.guests.list_for_pair(user_id, event_id, RowScope::IncludeDeleted).await
    }

    async fn resolve_event(&self, request: &JoinRequest) -> Result<Event, AppError> {
        let event_id = request.event_id.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let short_code = request.short_code.as_deref().map(str::trim).filter(|s| !s.is_empty());
        match (event_id, short_code) {
            (Some(id), _) => self.event_service.load(id).await,
            (None, Some(code)) => self.event_service.load_by_short_code(code).await,
            (None, None) => Err(AppError::Validation("Either event_id or short_code is required".into())),
        }
    }

    async fn resolve_guest(&self, user_id: Option<String>, email: Option<String>, name: Option<String>) -> Result<User, AppError> {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        match (present(user_id), present(email), present(name)) {
            (Some(id), _, _) => self.identity.get(&id).await,
            (None, None, None) => Err(AppError::Validation("Either user_id, email or name is required".into())),
            (None, email, name) => self.identity.find_or_provision_by_contact(email.as_deref(), name).await,
        }
    }

    /// Runs a membership action against the active row. A create that loses the
    /// race on the active-membership index re-reads and applies the action once
    /// more to the winner's row.
    async fn apply(&self, user_id: &str, event_id: &str, action: MembershipAction) -> Result<GuestEvent, AppError> {
        let now = Utc::now();
        let mut raced = false;
        loop {
            let current = self.guests.find_active(user_id, event_id).await?;
            let state = current.as_ref().map(GuestEvent::state);

            match transition(state.as_ref(), action, now)? {
                Transition::Create(next) => {
                    let row = GuestEvent::new(user_id.to_string(), event_id.to_string(), next);
                    match self.guests.create(&row).await {
                        Ok(created) => return Ok(created),
                        Err(e) if e.is_unique_violation() && !raced => {
                            debug!(event_id, user_id, "Concurrent membership insert, re-reading");
                            raced = true;
                        }
                        Err(e) => return Err(e),
                    }
                }
                Transition::Update(next) => {
                    let row = current.ok_or(TransitionError::NoMembership)?;
                    return self
                        .guests
                        .update_state(&row.id, &next)
                        .await?
                        .ok_or_else(|| TransitionError::NoMembership.into());
                }
                Transition::Unchanged => return current.ok_or_else(|| TransitionError::NoMembership.into()),
            }
        }
    }
}
