use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::{auth::AuthUser, maybe_auth::MaybeAuthUser};
use crate::api::dtos::responses::{ApiResponse, MessageResponse};
use crate::domain::models::announcement::{AnnouncementPatch, NewAnnouncement};
use crate::error::AppError;
use std::sync::Arc;

pub async fn create_announcement(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    user: AuthUser,
    Json(payload): Json<NewAnnouncement>,
) -> Result<impl IntoResponse, AppError> {
    let announcement = state.event_service.create_announcement(&event_id, &user.viewer(), payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(announcement))))
}

pub async fn list_announcements(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    viewer: MaybeAuthUser,
) -> Result<impl IntoResponse, AppError> {
    let announcements = state.event_service.list_announcements(&event_id, viewer.viewer().as_ref()).await?;
    Ok(Json(ApiResponse::ok(announcements)))
}

pub async fn get_announcement(
    State(state): State<Arc<AppState>>,
    Path((event_id, announcement_id)): Path<(String, String)>,
    viewer: MaybeAuthUser,
) -> Result<impl IntoResponse, AppError> {
    let announcement = state
        .event_service
        .get_announcement(&event_id, &announcement_id, viewer.viewer().as_ref())
        .await?;
    Ok(Json(ApiResponse::ok(announcement)))
}

pub async fn update_announcement(
    State(state): State<Arc<AppState>>,
    Path((event_id, announcement_id)): Path<(String, String)>,
    user: AuthUser,
    Json(patch): Json<AnnouncementPatch>,
) -> Result<impl IntoResponse, AppError> {
    let announcement = state
        .event_service
        .update_announcement(&event_id, &announcement_id, &user.viewer(), patch)
        .await?;
    Ok(Json(ApiResponse::ok(announcement)))
}

pub async fn delete_announcement(
    State(state): State<Arc<AppState>>,
    Path((event_id, announcement_id)): Path<(String, String)>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    state.event_service.delete_announcement(&event_id, &announcement_id, &user.viewer()).await?;
    Ok(Json(MessageResponse::ok("Announcement deleted successfully")))
}
