use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::{auth::AuthUser, maybe_auth::MaybeAuthUser};
use crate::api::dtos::{
    requests::UpdateGuestStatusRequest,
    responses::{ApiResponse, MessageResponse},
};
use crate::domain::models::guest_event::{InviteRequest, JoinRequest};
use crate::error::AppError;
use std::sync::Arc;

pub async fn join_event(
    State(state): State<Arc<AppState>>,
    caller: MaybeAuthUser,
    Json(payload): Json<JoinRequest>,
) -> Result<impl IntoResponse, AppError> {
    let joined = state.guest_service.join_event(payload, caller.0.as_ref()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(joined))))
}

pub async fn my_events(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let memberships = state.guest_service.list_memberships(&user.0.id).await?;
    Ok(Json(ApiResponse::ok(memberships)))
}

/// Any signed-in caller may update a membership's status.
pub async fn update_guest_status(
    State(state): State<Arc<AppState>>,
    Path((user_id, event_id)): Path<(String, String)>,
    _user: AuthUser,
    Json(payload): Json<UpdateGuestStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let membership = state.guest_service.update_guest_status(&user_id, &event_id, payload.status).await?;
    Ok(Json(ApiResponse::ok(membership)))
}

pub async fn leave_event(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    state.guest_service.leave_event(&user.0.id, &event_id).await?;
    Ok(Json(MessageResponse::ok("Left event successfully")))
}

pub async fn list_guests(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    viewer: MaybeAuthUser,
) -> Result<impl IntoResponse, AppError> {
    let guests = state.guest_service.list_guests(&event_id, viewer.viewer().as_ref()).await?;
    Ok(Json(ApiResponse::ok(guests)))
}

pub async fn invite_guest(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    user: AuthUser,
    Json(payload): Json<InviteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let membership = state.guest_service.invite_guest(&event_id, &user.viewer(), payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(membership))))
}
