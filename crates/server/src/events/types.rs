//! Live event frames.

use serde::{Deserialize, Serialize};

use crm_core::UserId;

/// An event as it appears on the wire.
///
/// Serializes as `{"event": "<name>", "data": {...}}`. Listeners receive
/// every event and filter on `userId` themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum LiveEvent {
    #[serde(rename = "newNotification", rename_all = "camelCase")]
    NewNotification { user_id: UserId, message: String },
}

impl LiveEvent {
    #[must_use]
    pub fn notification(user_id: UserId, message: impl Into<String>) -> Self {
        Self::NewNotification {
            user_id,
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_notification_frame_shape() {
        let event = LiveEvent::notification(UserId::new(1), "New customer Acme added");
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "event": "newNotification",
                "data": {"userId": 1, "message": "New customer Acme added"}
            })
        );
    }

    #[test]
    fn test_frame_parses_back() {
        let frame = r#"{"event":"newNotification","data":{"userId":5,"message":"hi"}}"#;
        let event: LiveEvent = serde_json::from_str(frame).unwrap();
        assert_eq!(event, LiveEvent::notification(UserId::new(5), "hi"));
    }
}
