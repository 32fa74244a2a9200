//! Event publisher trait and the in-process broadcast bus.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

use super::types::LiveEvent;

/// Capacity of the broadcast ring. Listeners further behind than this lag.
const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum EventBusError {
    #[error("failed to publish event: {0}")]
    Publish(String),
}

/// One-way sink for live events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event to every current listener.
    ///
    /// Returns how many listeners the event was handed to. Having no
    /// listeners is not an error.
    async fn publish(&self, event: LiveEvent) -> Result<usize, EventBusError>;
}

/// [`EventPublisher`] backed by a `tokio::sync::broadcast` channel.
#[derive(Debug, Clone)]
pub struct BroadcastBus {
    sender: broadcast::Sender<LiveEvent>,
}

impl BroadcastBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Attach a new listener. It only sees events published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.sender.subscribe()
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for BroadcastBus {
    async fn publish(&self, event: LiveEvent) -> Result<usize, EventBusError> {
        // send only fails when nobody is subscribed
        Ok(self.sender.send(event).unwrap_or(0))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crm_core::UserId;
    use tokio::sync::broadcast::error::RecvError;

    use super::*;

    #[tokio::test]
    async fn test_publish_without_listeners_is_ok() {
        let bus = BroadcastBus::new();
        let delivered = bus
            .publish(LiveEvent::notification(UserId::new(1), "nobody home"))
            .await
            .unwrap();
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_every_listener_receives_event() {
        let bus = BroadcastBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        assert_eq!(bus.listener_count(), 2);

        let event = LiveEvent::notification(UserId::new(3), "New task Call Acme created");
        assert_eq!(bus.publish(event.clone()).await.unwrap(), 2);

        assert_eq!(first.recv().await.unwrap(), event);
        assert_eq!(second.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_slow_listener_skips_missed_events() {
        let bus = BroadcastBus::with_capacity(2);
        let mut slow = bus.subscribe();

        for n in 0..4 {
            bus.publish(LiveEvent::notification(UserId::new(1), format!("event {n}")))
                .await
                .unwrap();
        }

        assert!(matches!(slow.recv().await, Err(RecvError::Lagged(2))));
        assert_eq!(
            slow.recv().await.unwrap(),
            LiveEvent::notification(UserId::new(1), "event 2")
        );
    }

    #[tokio::test]
    async fn test_late_listener_gets_no_backlog() {
        let bus = BroadcastBus::new();
        let _early = bus.subscribe();
        bus.publish(LiveEvent::notification(UserId::new(1), "before"))
            .await
            .unwrap();

        let mut late = bus.subscribe();
        assert!(late.try_recv().is_err());
    }
}
