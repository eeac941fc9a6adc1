use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::debug;
use crate::domain::{models::realtime::RealtimeMessage, ports::RealtimePublisher};

/// In-process fan-out with one broadcast channel per event.
///
/// Channels are created on first subscribe and dropped once the last
/// subscriber is gone. Slow subscribers lag rather than block publishers.
pub struct BroadcastHub {
    capacity: usize,
    channels: Mutex<HashMap<String, broadcast::Sender<RealtimeMessage>>>,
}

impl BroadcastHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            channels: Mutex::new(HashMap::new()),
        }
    }

    pub fn subscribe(&self, event_id: &str) -> broadcast::Receiver<RealtimeMessage> {
        let mut channels = self.channels();
        channels
            .entry(event_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    pub fn subscriber_count(&self, event_id: &str) -> usize {
        self.channels().get(event_id).map_or(0, |tx| tx.receiver_count())
    }

    fn channels(&self) -> MutexGuard<'_, HashMap<String, broadcast::Sender<RealtimeMessage>>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.channels.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RealtimePublisher for BroadcastHub {
    fn publish(&self, message: RealtimeMessage) {
        let mut channels = self.channels();
        let event_id = message.event_id().to_string();
        let Some(tx) = channels.get(&event_id) else {
            return;
        };
        match tx.send(message) {
            Ok(delivered) => debug!(event_id = %event_id, delivered, "Realtime message published"),
            Err(_) => {
                channels.remove(&event_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::announcement::{Announcement, NewAnnouncement};

    fn announcement(event_id: &str) -> RealtimeMessage {
        let input = NewAnnouncement { title: "Doors open".into(), message: "Welcome".into() };
        RealtimeMessage::Announcement {
            event_id: event_id.into(),
            announcement: Announcement::new(event_id.into(), "admin".into(), &input),
        }
    }

    #[tokio::test]
    async fn test_subscribers_only_see_their_event() {
        let hub = BroadcastHub::new(8);
        let mut e1 = hub.subscribe("e1");
        let mut e2 = hub.subscribe("e2");

        hub.publish(announcement("e1"));

        assert_eq!(e1.recv().await.unwrap().event_id(), "e1");
        assert!(e2.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_channel_dropped_after_last_subscriber_leaves() {
        let hub = BroadcastHub::new(8);
        let rx = hub.subscribe("e1");
        assert_eq!(hub.subscriber_count("e1"), 1);
        drop(rx);

        hub.publish(announcement("e1"));
        assert_eq!(hub.subscriber_count("e1"), 0);
        assert!(hub.channels().is_empty());
    }

    #[test]
    fn test_publish_without_subscribers_is_a_no_op() {
        let hub = BroadcastHub::new(8);
        hub.publish(announcement("nobody"));
        assert!(hub.channels().is_empty());
    }
}
