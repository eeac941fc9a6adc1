use axum::{extract::{State, Path, Query}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::{auth::AuthUser, maybe_auth::MaybeAuthUser};
use crate::api::dtos::{
    requests::{CalendarQuery, ListEventsQuery},
    responses::{ApiResponse, MessageResponse},
};
use crate::domain::models::{
    event::{EventPatch, EventQuery, EventType, NewEvent},
    UnknownVariant,
};
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn create_event(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<NewEvent>,
) -> Result<impl IntoResponse, AppError> {
    info!("Creating event '{}' for admin {}", payload.name, user.0.id);
    let created = state.event_service.create_event(&user.0, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(created))))
}

pub async fn list_events(
    State(state): State<Arc<AppState>>,
    viewer: MaybeAuthUser,
    Query(query): Query<ListEventsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let events = state
        .event_service
        .list_visible_events(viewer.viewer().as_ref(), &query.into())
        .await?;
    Ok(Json(ApiResponse::ok(events)))
}

pub async fn list_admin_events(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let events = state.event_service.list_admin_events(&user.viewer()).await?;
    Ok(Json(ApiResponse::ok(events)))
}

pub async fn list_public_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListEventsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let query: EventQuery = query.into();
    let events = state.event_service.list_public_events(&query).await?;
    Ok(Json(ApiResponse::ok(events)))
}

pub async fn list_happening_now(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let events = state.event_service.list_happening_now().await?;
    Ok(Json(ApiResponse::ok(events)))
}

pub async fn list_calendar_events(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<CalendarQuery>,
) -> Result<impl IntoResponse, AppError> {
    let events = state.guest_service.calendar(&user.viewer(), query.from, query.to).await?;
    Ok(Json(ApiResponse::ok(events)))
}

pub async fn list_event_types(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(ApiResponse::ok(state.event_service.event_types())))
}

pub async fn list_events_by_type(
    State(state): State<Arc<AppState>>,
    Path(event_type): Path<String>,
    viewer: MaybeAuthUser,
    Query(query): Query<ListEventsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let event_type: EventType = event_type
        .to_uppercase()
        .parse()
        .map_err(|e: UnknownVariant| AppError::Validation(e.to_string()))?;
    let events = state
        .event_service
        .list_events_by_type(event_type, viewer.viewer().as_ref(), query.into())
        .await?;
    Ok(Json(ApiResponse::ok(events)))
}

pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    viewer: MaybeAuthUser,
) -> Result<impl IntoResponse, AppError> {
    let event = state.event_service.get_event_by_id(&id, viewer.viewer().as_ref()).await?;
    Ok(Json(ApiResponse::ok(event)))
}

pub async fn get_event_by_code(
    State(state): State<Arc<AppState>>,
    Path(short_code): Path<String>,
    viewer: MaybeAuthUser,
) -> Result<impl IntoResponse, AppError> {
    let event = state
        .event_service
        .get_event_by_short_code(&short_code, viewer.viewer().as_ref())
        .await?;
    Ok(Json(ApiResponse::ok(event)))
}

pub async fn update_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    user: AuthUser,
    Json(patch): Json<EventPatch>,
) -> Result<impl IntoResponse, AppError> {
    let event = state.event_service.update_event(&id, &user.viewer(), patch).await?;
    Ok(Json(ApiResponse::ok(event)))
}

pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    state.event_service.delete_event(&id, &user.viewer()).await?;
    Ok(Json(MessageResponse::ok("Event deleted successfully")))
}
