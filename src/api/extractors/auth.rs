use axum::{
    extract::{FromRequestParts, FromRef},
    http::{header::AUTHORIZATION, request::Parts},
};
use crate::state::AppState;
use crate::domain::models::{auth::Viewer, user::User};
use crate::error::AppError;
use std::sync::Arc;
use tracing::Span;

/// A caller with a valid identity token, resolved to a local user.
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn viewer(&self) -> Viewer {
        Viewer::from(&self.0)
    }
}

pub(crate) fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub(crate) async fn resolve_user(app_state: &AppState, token: &str) -> Result<User, AppError> {
    let claims = app_state.auth_service.verify(token)?;
    let user = app_state.identity.resolve(&claims).await?;
    Span::current().record("user_id", user.id.as_str());
    Ok(user)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("Missing bearer token".into()))?
            .to_string();

        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);
        let user = resolve_user(&app_state, &token).await?;
        Ok(AuthUser(user))
    }
}
