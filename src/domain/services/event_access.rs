use std::sync::Arc;
use tracing::debug;
use crate::domain::{
    models::{auth::Viewer, event::Event},
    ports::GuestEventRepository,
    services::visibility::{can_access, is_owner, AccessDecision, AccessRule, Denial, VisibilityFilter},
};
use crate::error::AppError;

/// Authorization checks shared by every event read and mutation.
#[derive(Clone)]
pub struct EventAccess {
    guests: Arc<dyn GuestEventRepository>,
}

impl EventAccess {
    pub fn new(guests: Arc<dyn GuestEventRepository>) -> Self {
        Self { guests }
    }

    pub fn visibility_filter(&self, viewer: Option<&Viewer>) -> VisibilityFilter {
        VisibilityFilter::for_viewer(viewer)
    }

    pub async fn decide(&self, event: &Event, viewer: Option<&Viewer>) -> Result<AccessDecision, AppError> {
        let has_membership = match viewer {
            Some(v) if AccessRule::for_visibility(event.visibility).needs_membership() && !is_owner(event, v) => {
                self.guests.has_active(&v.user_id, &event.id).await?
            }
            _ => false,
        };
        Ok(can_access(event, viewer, has_membership))
    }

    pub async fn authorize_read(&self, event: &Event, viewer: Option<&Viewer>) -> Result<(), AppError> {
        match self.decide(event, viewer).await? {
            AccessDecision::Allowed => Ok(()),
            AccessDecision::Denied(Denial::LoginRequired) => {
                debug!(event_id = %event.id, "Anonymous access to non-public event");
                Err(AppError::Unauthorized("Login required to view this event".into()))
            }
            AccessDecision::Denied(Denial::Forbidden) => {
                Err(AppError::Forbidden("You do not have access to this event".into()))
            }
        }
    }

    /// Read access plus ownership.
    pub async fn authorize_mutation(&self, event: &Event, viewer: &Viewer) -> Result<(), AppError> {
        self.authorize_read(event, Some(viewer)).await?;
        if !is_owner(event, viewer) {
            return Err(AppError::Forbidden("Only the event owner can modify this event".into()));
        }
        Ok(())
    }
}
