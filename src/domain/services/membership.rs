use chrono::{DateTime, Utc};
use thiserror::Error;
use crate::domain::models::guest_event::GuestStatus;
use crate::error::AppError;

/// The status axis of a membership together with the timestamps it drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MembershipState {
    pub status: GuestStatus,
    pub joined_at: Option<DateTime<Utc>>,
    pub checked_in_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipAction {
    /// An owner invites a user who is not yet a member.
    Invite,
    /// Self-service join through the public join path.
    Join,
    /// Explicit status update by an admin or the guest.
    SetStatus(GuestStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// No active row exists; insert one with this state.
    Create(MembershipState),
    /// Write this state onto the active row.
    Update(MembershipState),
    /// Leave the active row untouched.
    Unchanged,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Guest event not found")]
    NoMembership,
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        AppError::NotFound(err.to_string())
    }
}

/// Computes the next membership state. `current` is the active row, if any.
///
/// Leaving is not a transition: it soft-deletes the row and freezes its status.
pub fn transition(
    current: Option<&MembershipState>,
    action: MembershipAction,
    now: DateTime<Utc>,
) -> Result<Transition, TransitionError> {
    match (current, action) {
        (None, MembershipAction::Invite) => Ok(Transition::Create(MembershipState {
            status: GuestStatus::Invited,
            joined_at: None,
            checked_in_at: None,
        })),
        (None, MembershipAction::Join) => Ok(Transition::Create(MembershipState {
            status: GuestStatus::Joined,
            joined_at: Some(now),
            checked_in_at: None,
        })),
        (None, MembershipAction::SetStatus(_)) => Err(TransitionError::NoMembership),

        // Already a member in some form; an invitation never downgrades.
        (Some(_), MembershipAction::Invite) => Ok(Transition::Unchanged),

        (Some(state), MembershipAction::Join) => match state.status {
            GuestStatus::Invited => Ok(Transition::Update(MembershipState {
                status: GuestStatus::Joined,
                joined_at: Some(now),
                ..*state
            })),
            GuestStatus::Joined | GuestStatus::CheckedIn => Ok(Transition::Unchanged),
        },

        (Some(state), MembershipAction::SetStatus(target)) if state.status == target => {
            Ok(Transition::Unchanged)
        }
        (Some(state), MembershipAction::SetStatus(target)) => {
            let mut next = MembershipState { status: target, ..*state };
            match target {
                GuestStatus::Joined => next.joined_at = Some(now),
                GuestStatus::CheckedIn => next.checked_in_at = Some(now),
                GuestStatus::Invited => {}
            }
            Ok(Transition::Update(next))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn state(status: GuestStatus, joined: Option<DateTime<Utc>>, checked: Option<DateTime<Utc>>) -> MembershipState {
        MembershipState { status, joined_at: joined, checked_in_at: checked }
    }

    #[test]
    fn test_create_via_invite_and_join() {
        let now = Utc::now();
        assert_eq!(
            transition(None, MembershipAction::Invite, now),
            Ok(Transition::Create(state(GuestStatus::Invited, None, None)))
        );
        assert_eq!(
            transition(None, MembershipAction::Join, now),
            Ok(Transition::Create(state(GuestStatus::Joined, Some(now), None)))
        );
    }

    #[test]
    fn test_status_update_without_membership_is_not_found() {
        let result = transition(None, MembershipAction::SetStatus(GuestStatus::CheckedIn), Utc::now());
        assert_eq!(result, Err(TransitionError::NoMembership));
        let err: AppError = TransitionError::NoMembership.into();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_join_promotes_invited_only() {
        let now = Utc::now();
        let earlier = now - Duration::hours(2);

        let invited = state(GuestStatus::Invited, None, None);
        assert_eq!(
            transition(Some(&invited), MembershipAction::Join, now),
            Ok(Transition::Update(state(GuestStatus::Joined, Some(now), None)))
        );

        let joined = state(GuestStatus::Joined, Some(earlier), None);
        assert_eq!(transition(Some(&joined), MembershipAction::Join, now), Ok(Transition::Unchanged));

        let checked = state(GuestStatus::CheckedIn, Some(earlier), Some(earlier));
        assert_eq!(transition(Some(&checked), MembershipAction::Join, now), Ok(Transition::Unchanged));
    }

    #[test]
    fn test_invite_never_downgrades() {
        let joined = state(GuestStatus::Joined, Some(Utc::now()), None);
        assert_eq!(transition(Some(&joined), MembershipAction::Invite, Utc::now()), Ok(Transition::Unchanged));
    }

    #[test]
    fn test_direct_check_in_from_invited_leaves_joined_at_null() {
        let now = Utc::now();
        let invited = state(GuestStatus::Invited, None, None);
        let next = transition(Some(&invited), MembershipAction::SetStatus(GuestStatus::CheckedIn), now);
        assert_eq!(next, Ok(Transition::Update(state(GuestStatus::CheckedIn, None, Some(now)))));
    }

    #[test]
    fn test_checked_in_at_is_set_once_and_never_cleared() {
        let first = Utc::now() - Duration::hours(1);
        let now = Utc::now();
        let checked = state(GuestStatus::CheckedIn, Some(first), Some(first));

        // Re-setting the same status keeps the original timestamp.
        assert_eq!(
            transition(Some(&checked), MembershipAction::SetStatus(GuestStatus::CheckedIn), now),
            Ok(Transition::Unchanged)
        );

        for target in [GuestStatus::Invited, GuestStatus::Joined] {
            let Ok(Transition::Update(next)) = transition(Some(&checked), MembershipAction::SetStatus(target), now) else {
                panic!("expected an update to {target}");
            };
            assert_eq!(next.checked_in_at, Some(first));
        }
    }

    #[test]
    fn test_set_joined_refreshes_joined_at_only_when_status_changes() {
        let first = Utc::now() - Duration::days(1);
        let now = Utc::now();

        let joined = state(GuestStatus::Joined, Some(first), None);
        assert_eq!(
            transition(Some(&joined), MembershipAction::SetStatus(GuestStatus::Joined), now),
            Ok(Transition::Unchanged)
        );

        let checked = state(GuestStatus::CheckedIn, Some(first), Some(first));
        let Ok(Transition::Update(next)) = transition(Some(&checked), MembershipAction::SetStatus(GuestStatus::Joined), now) else {
            panic!("expected an update");
        };
        assert_eq!(next.status, GuestStatus::Joined);
        assert_eq!(next.joined_at, Some(now));
    }
}
