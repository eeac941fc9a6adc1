use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::{IntoResponse, Response},
};
use crate::state::AppState;
use crate::api::extractors::maybe_auth::MaybeAuthUser;
use crate::domain::models::realtime::RealtimeMessage;
use crate::error::AppError;
use futures::{stream::StreamExt, SinkExt};
use std::sync::Arc;
use tokio::sync::broadcast::{error::RecvError, Receiver};
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Streams an event's realtime messages as JSON text frames.
///
/// The read check runs before the upgrade, so a caller who may not see the
/// event gets the usual 401/403/404 instead of a socket.
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    viewer: MaybeAuthUser,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, AppError> {
    let event = state.event_service.load(&event_id).await?;
    state.event_service.access().authorize_read(&event, viewer.viewer().as_ref()).await?;

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    // Subscribed before the handshake completes so nothing published in between is missed.
    let rx = state.realtime.subscribe(&event.id);
    info!(event_id = %event.id, "Live subscription requested");
    let span = info_span!("live_socket", event_id = %event.id);
    Ok(ws.on_upgrade(move |socket| forward(socket, rx).instrument(span)))
}

async fn forward(socket: WebSocket, mut rx: Receiver<RealtimeMessage>) {
    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        loop {
            let message = match rx.recv().await {
                Ok(message) => message,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Live subscriber lagged, messages dropped");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(e) => {
                    error!(error = %e, "Failed to serialize realtime message");
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
        debug!("Live send task terminated");
    }.in_current_span());

    // Clients only listen; anything they send besides a close is ignored.
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    }.in_current_span());

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    }
    info!("Live socket closed");
}
