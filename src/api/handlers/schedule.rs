use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::{auth::AuthUser, maybe_auth::MaybeAuthUser};
use crate::api::dtos::responses::{ApiResponse, MessageResponse};
use crate::domain::models::schedule::{NewScheduleItem, ReorderRequest, SchedulePatch};
use crate::error::AppError;
use std::sync::Arc;

pub async fn create_schedule_item(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    user: AuthUser,
    Json(payload): Json<NewScheduleItem>,
) -> Result<impl IntoResponse, AppError> {
    let item = state.event_service.create_schedule_item(&event_id, &user.viewer(), payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(item))))
}

pub async fn list_schedule(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    viewer: MaybeAuthUser,
) -> Result<impl IntoResponse, AppError> {
    let items = state.event_service.list_schedule(&event_id, viewer.viewer().as_ref()).await?;
    Ok(Json(ApiResponse::ok(items)))
}

pub async fn update_schedule_item(
    State(state): State<Arc<AppState>>,
    Path((event_id, item_id)): Path<(String, String)>,
    user: AuthUser,
    Json(patch): Json<SchedulePatch>,
) -> Result<impl IntoResponse, AppError> {
    let item = state.event_service.update_schedule_item(&event_id, &item_id, &user.viewer(), patch).await?;
    Ok(Json(ApiResponse::ok(item)))
}

pub async fn delete_schedule_item(
    State(state): State<Arc<AppState>>,
    Path((event_id, item_id)): Path<(String, String)>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    state.event_service.delete_schedule_item(&event_id, &item_id, &user.viewer()).await?;
    Ok(Json(MessageResponse::ok("Schedule item deleted successfully")))
}

pub async fn reorder_schedule(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    user: AuthUser,
    Json(payload): Json<ReorderRequest>,
) -> Result<impl IntoResponse, AppError> {
    let items = state.event_service.reorder_schedule_items(&event_id, &user.viewer(), payload.items).await?;
    Ok(Json(ApiResponse::ok(items)))
}
