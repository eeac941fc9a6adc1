use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use super::{event::{Event, EventDetails}, text_enum};
use crate::domain::services::membership::MembershipState;

text_enum! {
    GuestStatus {
        Invited => "INVITED",
        Joined => "JOINED",
        CheckedIn => "CHECKED_IN",
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct GuestEvent {
    pub id: String,
    pub user_id: String,
    pub event_id: String,
    #[sqlx(try_from = "String")]
    pub status: GuestStatus,
    pub joined_at: Option<DateTime<Utc>>,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl GuestEvent {
    pub fn new(user_id: String, event_id: String, state: MembershipState) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            event_id,
            status: state.status,
            joined_at: state.joined_at,
            checked_in_at: state.checked_in_at,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn state(&self) -> MembershipState {
        MembershipState {
            status: self.status,
            joined_at: self.joined_at,
            checked_in_at: self.checked_in_at,
        }
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// A membership row together with the guest's public profile.
#[derive(Debug, Serialize, FromRow, Clone)]
pub struct Guest {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub membership: GuestEvent,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

/// Resolution of the event a join request targets. An id wins over a short code.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct JoinRequest {
    pub event_id: Option<String>,
    pub short_code: Option<String>,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Who an owner is inviting: an existing user, or contact details to provision one.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct InviteRequest {
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct JoinedEvent {
    pub membership: GuestEvent,
    pub event: EventDetails,
}

#[derive(Debug, Serialize, Clone)]
pub struct Membership {
    #[serde(flatten)]
    pub membership: GuestEvent,
    pub event: Event,
}
