use axum::{
    extract::{FromRequestParts, FromRef},
    http::request::Parts,
};
use crate::api::extractors::auth::{bearer_token, resolve_user};
use crate::state::AppState;
use crate::domain::models::{auth::Viewer, user::User};
use crate::error::AppError;
use std::sync::Arc;
use tracing::debug;

/// Like `AuthUser`, but a missing or rejected token means an anonymous caller.
pub struct MaybeAuthUser(pub Option<User>);

impl MaybeAuthUser {
    pub fn viewer(&self) -> Option<Viewer> {
        self.0.as_ref().map(Viewer::from)
    }
}

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts).map(str::to_string) else {
            return Ok(MaybeAuthUser(None));
        };

        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);
        match resolve_user(&app_state, &token).await {
            Ok(user) => Ok(MaybeAuthUser(Some(user))),
            Err(AppError::Unauthorized(reason)) => {
                debug!("MaybeAuth: treating caller as anonymous: {}", reason);
                Ok(MaybeAuthUser(None))
            }
            Err(e) => Err(e),
        }
    }
}
