//! Notification side effects of mutations.
//!
//! A qualifying mutation writes one notification row for the affected user
//! and publishes one live event with the same message. Both halves are
//! best-effort: a failure is logged and never reaches the caller.

use std::sync::Arc;

use async_trait::async_trait;

use crm_core::{Role, UserId};

use crate::db::RepositoryError;
use crate::events::{EventPublisher, LiveEvent};

/// Where notification rows are written.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, user_id: UserId, message: &str) -> Result<(), RepositoryError>;
}

/// Every message the server sends to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationMessage<'a> {
    CustomerCreated { name: &'a str },
    CustomerUpdated { name: &'a str },
    CustomerDeleted,
    TaskCreated { title: &'a str },
    DealCreated { title: &'a str },
    RoleChanged { role: Role },
    PremiumUpgrade,
}

impl std::fmt::Display for NotificationMessage<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CustomerCreated { name } => write!(f, "New customer {name} added"),
            Self::CustomerUpdated { name } => write!(f, "Customer {name} updated"),
            Self::CustomerDeleted => f.write_str("Customer deleted"),
            Self::TaskCreated { title } => write!(f, "New task {title} created"),
            Self::DealCreated { title } => write!(f, "New deal {title} created"),
            Self::RoleChanged { role } => write!(f, "Your role has been updated to {role}"),
            Self::PremiumUpgrade => f.write_str("Your account has been upgraded to Premium!"),
        }
    }
}

/// Persists notifications and pushes them to live listeners.
#[derive(Clone)]
pub struct Notifier {
    store: Arc<dyn NotificationStore>,
    publisher: Arc<dyn EventPublisher>,
}

impl Notifier {
    #[must_use]
    pub fn new(store: Arc<dyn NotificationStore>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self { store, publisher }
    }

    /// Write a notification row for `user_id`, then broadcast it.
    pub async fn notify(&self, user_id: UserId, message: NotificationMessage<'_>) {
        let text = message.to_string();

        if let Err(e) = self.store.insert(user_id, &text).await {
            tracing::warn!(
                user_id = %user_id,
                error = %e,
                "Failed to persist notification"
            );
        }

        self.publish(user_id, text).await;
    }

    /// Broadcast without writing a notification row.
    pub async fn broadcast(&self, user_id: UserId, message: NotificationMessage<'_>) {
        self.publish(user_id, message.to_string()).await;
    }

    async fn publish(&self, user_id: UserId, text: String) {
        match self
            .publisher
            .publish(LiveEvent::notification(user_id, text))
            .await
        {
            Ok(listeners) => tracing::debug!(user_id = %user_id, listeners, "Live event published"),
            Err(e) => tracing::warn!(
                user_id = %user_id,
                error = %e,
                "Failed to publish live event"
            ),
        }
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::events::{BroadcastBus, EventBusError};

    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<Vec<(UserId, String)>>,
    }

    #[async_trait]
    impl NotificationStore for MemoryStore {
        async fn insert(&self, user_id: UserId, message: &str) -> Result<(), RepositoryError> {
            self.rows
                .lock()
                .unwrap()
                .push((user_id, message.to_owned()));
            Ok(())
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl NotificationStore for BrokenStore {
        async fn insert(&self, _: UserId, _: &str) -> Result<(), RepositoryError> {
            Err(RepositoryError::DataCorruption("disk on fire".to_owned()))
        }
    }

    struct BrokenPublisher;

    #[async_trait]
    impl EventPublisher for BrokenPublisher {
        async fn publish(&self, _: LiveEvent) -> Result<usize, EventBusError> {
            Err(EventBusError::Publish("transport down".to_owned()))
        }
    }

    #[test]
    fn test_message_templates() {
        assert_eq!(
            NotificationMessage::CustomerCreated { name: "Acme" }.to_string(),
            "New customer Acme added"
        );
        assert_eq!(
            NotificationMessage::TaskCreated { title: "Call" }.to_string(),
            "New task Call created"
        );
        assert_eq!(
            NotificationMessage::DealCreated { title: "Renewal" }.to_string(),
            "New deal Renewal created"
        );
        assert_eq!(
            NotificationMessage::RoleChanged { role: Role::Admin }.to_string(),
            "Your role has been updated to admin"
        );
        assert_eq!(
            NotificationMessage::PremiumUpgrade.to_string(),
            "Your account has been upgraded to Premium!"
        );
        assert_eq!(
            NotificationMessage::CustomerUpdated { name: "Acme" }.to_string(),
            "Customer Acme updated"
        );
        assert_eq!(NotificationMessage::CustomerDeleted.to_string(), "Customer deleted");
    }

    #[tokio::test]
    async fn test_notify_persists_one_row_and_broadcasts_once() {
        let store = Arc::new(MemoryStore::default());
        let bus = Arc::new(BroadcastBus::new());
        let mut listener = bus.subscribe();
        let notifier = Notifier::new(store.clone(), bus.clone());

        notifier
            .notify(UserId::new(1), NotificationMessage::CustomerCreated { name: "Acme" })
            .await;

        let rows = store.rows.lock().unwrap().clone();
        assert_eq!(rows, vec![(UserId::new(1), "New customer Acme added".to_owned())]);
        assert_eq!(
            listener.recv().await.unwrap(),
            LiveEvent::notification(UserId::new(1), "New customer Acme added")
        );
        assert!(listener.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_writes_no_row() {
        let store = Arc::new(MemoryStore::default());
        let bus = Arc::new(BroadcastBus::new());
        let mut listener = bus.subscribe();
        let notifier = Notifier::new(store.clone(), bus);

        notifier
            .broadcast(UserId::new(2), NotificationMessage::CustomerDeleted)
            .await;

        assert!(store.rows.lock().unwrap().is_empty());
        assert_eq!(
            listener.recv().await.unwrap(),
            LiveEvent::notification(UserId::new(2), "Customer deleted")
        );
    }

    #[tokio::test]
    async fn test_store_failure_still_broadcasts() {
        let bus = Arc::new(BroadcastBus::new());
        let mut listener = bus.subscribe();
        let notifier = Notifier::new(Arc::new(BrokenStore), bus);

        notifier
            .notify(UserId::new(3), NotificationMessage::PremiumUpgrade)
            .await;

        assert_eq!(
            listener.recv().await.unwrap(),
            LiveEvent::notification(UserId::new(3), "Your account has been upgraded to Premium!")
        );
    }

    #[tokio::test]
    async fn test_publish_failure_still_persists() {
        let store = Arc::new(MemoryStore::default());
        let notifier = Notifier::new(store.clone(), Arc::new(BrokenPublisher));

        notifier
            .notify(UserId::new(4), NotificationMessage::DealCreated { title: "Q3" })
            .await;

        assert_eq!(store.rows.lock().unwrap().len(), 1);
    }
}
