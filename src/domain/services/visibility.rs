use crate::domain::models::{auth::Viewer, event::{Event, Visibility}};

/// What a viewer needs in order to read an event of a given visibility class.
///
/// Both the single-event evaluator and the list filter are derived from
/// [`AccessRule::for_visibility`], so the two cannot drift apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRule {
    Anyone,
    Authenticated,
    OwnerOrMember,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    LoginRequired,
    Forbidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Denied(Denial),
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allowed)
    }
}

impl AccessRule {
    pub fn for_visibility(visibility: Visibility) -> Self {
        match visibility {
            Visibility::Public => AccessRule::Anyone,
            // Obscurity only: any signed-in viewer may read an unlisted event.
            Visibility::Unlisted => AccessRule::Authenticated,
            Visibility::Private => AccessRule::OwnerOrMember,
        }
    }

    pub fn needs_membership(&self) -> bool {
        matches!(self, AccessRule::OwnerOrMember)
    }

    pub fn evaluate(&self, authenticated: bool, is_owner: bool, is_member: bool) -> AccessDecision {
        match self {
            AccessRule::Anyone => AccessDecision::Allowed,
            _ if !authenticated => AccessDecision::Denied(Denial::LoginRequired),
            AccessRule::Authenticated => AccessDecision::Allowed,
            AccessRule::OwnerOrMember if is_owner || is_member => AccessDecision::Allowed,
            AccessRule::OwnerOrMember => AccessDecision::Denied(Denial::Forbidden),
        }
    }
}

/// Owner by id, or by the email the identity provider vouched for.
pub fn is_owner(event: &Event, viewer: &Viewer) -> bool {
    if event.admin_id == viewer.user_id {
        return true;
    }
    match (viewer.email.as_deref(), event.admin_email.as_deref()) {
        (Some(mine), Some(admin)) => emails_match(mine, admin),
        _ => false,
    }
}

fn emails_match(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Decides whether `viewer` may read `event`. `has_membership` is whether an
/// active membership row exists for the pair; it only matters for private events.
pub fn can_access(event: &Event, viewer: Option<&Viewer>, has_membership: bool) -> AccessDecision {
    let owner = viewer.is_some_and(|v| is_owner(event, v));
    AccessRule::for_visibility(event.visibility).evaluate(viewer.is_some(), owner, viewer.is_some() && has_membership)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterClause {
    /// Every active event of this visibility class.
    Visibility(Visibility),
    /// Events of this class owned by the viewer or joined by them.
    OwnerOrMember {
        visibility: Visibility,
        user_id: String,
        email: Option<String>,
    },
}

/// Disjunction of clauses scoping a list query to what a viewer may read.
/// Soft-deleted events are excluded by the repository, not by the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityFilter {
    pub clauses: Vec<FilterClause>,
}

impl VisibilityFilter {
    pub fn for_viewer(viewer: Option<&Viewer>) -> Self {
        let clauses = Visibility::ALL
            .iter()
            .filter_map(|&visibility| match (AccessRule::for_visibility(visibility), viewer) {
                (AccessRule::Anyone, _) => Some(FilterClause::Visibility(visibility)),
                (_, None) => None,
                (AccessRule::Authenticated, Some(_)) => Some(FilterClause::Visibility(visibility)),
                (AccessRule::OwnerOrMember, Some(v)) => Some(FilterClause::OwnerOrMember {
                    visibility,
                    user_id: v.user_id.clone(),
                    email: v.email.clone(),
                }),
            })
            .collect();
        Self { clauses }
    }

    /// In-memory form of the filter. `has_membership` as for [`can_access`].
    pub fn matches(&self, event: &Event, has_membership: bool) -> bool {
        self.clauses.iter().any(|clause| match clause {
            FilterClause::Visibility(v) => event.visibility == *v,
            FilterClause::OwnerOrMember { visibility, user_id, email } => {
                event.visibility == *visibility
                    && (has_membership || is_owner(event, &Viewer::new(user_id.clone(), email.clone())))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::event::{EventType, NewEvent};
    use chrono::{Duration, Utc};

    fn event(visibility: Visibility) -> Event {
        let input = NewEvent {
            name: "Launch".into(),
            description: None,
            start_date: Utc::now() + Duration::days(1),
            end_date: Utc::now() + Duration::days(2),
            location: None,
            venue: None,
            time_zone: None,
            visibility: Some(visibility),
            event_type: Some(EventType::Corporate),
            schedule_items: vec![],
        };
        Event::new("admin-1".into(), Some("alice@x.com".into()), "ABCD1234".into(), &input)
    }

    #[test]
    fn test_owner_always_wins_without_membership() {
        let by_email = Viewer::new("someone-else", Some("Alice@X.com".into()));
        let by_id = Viewer::new("admin-1", None);
        for visibility in Visibility::ALL.iter().copied() {
            let e = event(visibility);
            assert!(can_access(&e, Some(&by_email), false).is_allowed(), "{visibility}");
            assert!(can_access(&e, Some(&by_id), false).is_allowed(), "{visibility}");
        }
    }

    #[test]
    fn test_anonymous_blocked_on_non_public() {
        assert!(can_access(&event(Visibility::Public), None, false).is_allowed());
        for visibility in [Visibility::Unlisted, Visibility::Private] {
            // A membership flag without a viewer must not leak access.
            assert_eq!(
                can_access(&event(visibility), None, true),
                AccessDecision::Denied(Denial::LoginRequired)
            );
        }
    }

    #[test]
    fn test_private_requires_owner_or_member() {
        let bob = Viewer::new("bob", Some("bob@x.com".into()));
        let private = event(Visibility::Private);
        assert_eq!(can_access(&private, Some(&bob), false), AccessDecision::Denied(Denial::Forbidden));
        assert!(can_access(&private, Some(&bob), true).is_allowed());
    }

    #[test]
    fn test_unlisted_allows_any_signed_in_viewer() {
        let stranger = Viewer::new("stranger", None);
        assert!(can_access(&event(Visibility::Unlisted), Some(&stranger), false).is_allowed());
    }

    #[test]
    fn test_anonymous_filter_is_public_only() {
        let filter = VisibilityFilter::for_viewer(None);
        assert_eq!(filter.clauses, vec![FilterClause::Visibility(Visibility::Public)]);
    }

    #[test]
    fn test_filter_agrees_with_evaluator() {
        let viewers = [
            None,
            Some(Viewer::new("bob", Some("bob@x.com".into()))),
            Some(Viewer::new("carol", None)),
            Some(Viewer::new("admin-1", None)),
            Some(Viewer::new("other-id", Some("alice@x.com".into()))),
        ];
        for viewer in &viewers {
            let filter = VisibilityFilter::for_viewer(viewer.as_ref());
            for visibility in Visibility::ALL.iter().copied() {
                for has_membership in [false, true] {
                    let e = event(visibility);
                    assert_eq!(
                        filter.matches(&e, has_membership),
                        can_access(&e, viewer.as_ref(), has_membership).is_allowed(),
                        "viewer={viewer:?} visibility={visibility} member={has_membership}"
                    );
                }
            }
        }
    }
}
