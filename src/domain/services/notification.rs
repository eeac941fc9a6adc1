use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, warn, Instrument};
use crate::domain::{
    models::{device::{NotificationLog, PushMessage}, realtime::RealtimeMessage},
    ports::{DeviceRepository, PushService, RealtimePublisher},
};
use crate::error::AppError;

/// Post-mutation fan-out. Nothing here fails the request that triggered it.
#[derive(Clone)]
pub struct Notifier {
    devices: Arc<dyn DeviceRepository>,
    push: Arc<dyn PushService>,
    realtime: Arc<dyn RealtimePublisher>,
}

impl Notifier {
    pub fn new(
        devices: Arc<dyn DeviceRepository>,
        push: Arc<dyn PushService>,
        realtime: Arc<dyn RealtimePublisher>,
    ) -> Self {
        Self { devices, push, realtime }
    }

    /// Broadcasts to connected clients, then pushes to the event's guests in the background.
    pub fn dispatch(&self, message: RealtimeMessage, push: PushMessage) -> JoinHandle<()> {
        let event_id = message.event_id().to_string();
        self.realtime.publish(message);
        self.push_to_event(event_id, push)
    }

    /// Connected clients only. Removals are not pushed to devices.
    pub fn broadcast(&self, message: RealtimeMessage) {
        self.realtime.publish(message);
    }

    pub fn push_to_event(&self, event_id: String, message: PushMessage) -> JoinHandle<()> {
        let notifier = self.clone();
        let span = info_span!("push_fanout", event_id = %event_id);
        tokio::spawn(
            async move {
                if let Err(e) = notifier.deliver(&event_id, &message).await {
                    error!("Push fan-out failed: {}", e);
                }
            }
            .instrument(span),
        )
    }

    async fn deliver(&self, event_id: &str, message: &PushMessage) -> Result<(), AppError> {
        let tokens = self.devices.tokens_for_event(event_id).await?;
        if tokens.is_empty() {
            info!("No registered devices for event, skipping push");
            return Ok(());
        }

        let outcomes = self.push.send_multicast(&tokens, message).await?;
        let delivered = outcomes.iter().filter(|o| o.success).count();
        info!(delivered, failed = outcomes.len() - delivered, "Push multicast finished");

        for outcome in &outcomes {
            if !outcome.success {
                warn!(token = %outcome.token, error = ?outcome.error, "Push delivery failed");
            }
            let log = NotificationLog::new(event_id.to_string(), message.title.clone(), message.body.clone(), outcome);
            if let Err(e) = self.devices.log_notification(&log).await {
                error!("Failed to record notification log: {}", e);
            }
        }
        Ok(())
    }
}

pub fn push_message(title: impl Into<String>, body: impl Into<String>, kind: &str, event_id: &str) -> PushMessage {
    let mut data = serde_json::Map::new();
    data.insert("type".into(), kind.into());
    data.insert("event_id".into(), event_id.into());
    PushMessage { title: title.into(), body: body.into(), data }
}
