use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::responses::ApiResponse;
use crate::domain::models::device::{Device, NewDevice};
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn register_device(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<NewDevice>,
) -> Result<impl IntoResponse, AppError> {
    if payload.fcm_token.trim().is_empty() {
        return Err(AppError::Validation("fcm_token is required".into()));
    }

    let device = state.device_repo.upsert(&Device::new(user.0.id.clone(), &payload)).await?;
    info!(user_id = %user.0.id, device_type = %device.device_type, "Device registered");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(device))))
}
