use axum::{
    body::Body,
    extract::Request,
    routing::{get, patch, post, delete},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{announcement, device, event, guest_event, health, live, schedule};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Events
        .route("/api/v1/events", post(event::create_event).get(event::list_events))
        .route("/api/v1/events/admin", get(event::list_admin_events))
        .route("/api/v1/events/public", get(event::list_public_events))
        .route("/api/v1/events/code/{short_code}", get(event::get_event_by_code))
        .route("/api/v1/events/happening-now", get(event::list_happening_now))
        .route("/api/v1/events/calendar", get(event::list_calendar_events))
        .route("/api/v1/events/types", get(event::list_event_types))
        .route("/api/v1/events/types/{event_type}", get(event::list_events_by_type))
        .route("/api/v1/events/{id}", get(event::get_event).patch(event::update_event).delete(event::delete_event))

        // Event content
        .route("/api/v1/events/{id}/schedule", get(schedule::list_schedule).post(schedule::create_schedule_item))
        .route("/api/v1/events/{id}/schedule/reorder", post(schedule::reorder_schedule))
        .route(
            "/api/v1/events/{id}/schedule/{item_id}",
            patch(schedule::update_schedule_item).delete(schedule::delete_schedule_item),
        )
        .route("/api/v1/events/{id}/announcements", get(announcement::list_announcements).post(announcement::create_announcement))
        .route(
            "/api/v1/events/{id}/announcements/{announcement_id}",
            get(announcement::get_announcement)
                .patch(announcement::update_announcement)
                .delete(announcement::delete_announcement),
        )
        .route("/api/v1/events/{id}/live", get(live::subscribe))

        // Membership
        .route("/api/v1/events/{id}/invitations", post(guest_event::invite_guest))
        .route("/api/v1/events/{id}/guests", get(guest_event::list_guests))
        .route("/api/v1/guest-events/join", post(guest_event::join_event))
        .route("/api/v1/guest-events/mine", get(guest_event::my_events))
        .route("/api/v1/guest-events/{user_id}/{event_id}/status", patch(guest_event::update_guest_status))
        .route("/api/v1/guest-events/{event_id}", delete(guest_event::leave_event))

        // Devices
        .route("/api/v1/devices", post(device::register_device))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}
