// Event types and payload structures for host updates
// These are broadcast to whatever view is driving the interview

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::prd_workflow::WorkflowPhase;

// Event name constants
pub const EVENT_PHASE_CHANGED: &str = "workflow:phase_changed";
pub const EVENT_NOTIFICATION: &str = "workflow:notification";
pub const EVENT_DOCUMENT_READY: &str = "workflow:document_ready";

// Timer events
pub const EVENT_COUNTDOWN_TICK: &str = "countdown:tick";
pub const EVENT_COUNTDOWN_EXPIRED: &str = "countdown:expired";
pub const EVENT_TIP_ROTATED: &str = "tips:rotated";

/// Payload for phase change events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseChangedPayload {
    pub session_id: String,
    pub old_phase: WorkflowPhase,
    pub new_phase: WorkflowPhase,
}

/// Severity of a user-facing notification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Info,
    Error,
}

/// A toast-style message for the user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// Payload for countdown tick events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountdownTickPayload {
    pub remaining_secs: u32,
    pub expired: bool,
}

/// Payload for tip rotation events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TipRotatedPayload {
    pub index: usize,
    pub tip: String,
}

/// Payload for document ready events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReadyPayload {
    pub session_id: String,
    pub title: Option<String>,
    pub node_count: usize,
}

/// An event as seen by subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowEvent {
    /// Event type (e.g., "workflow:phase_changed", "countdown:tick")
    pub event: String,
    /// Event payload as JSON value
    pub payload: serde_json::Value,
}

impl WorkflowEvent {
    /// Decode the payload into a concrete type
    pub fn payload_as<T: serde::de::DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_value(self.payload.clone()).ok()
    }
}

/// Broadcasts workflow events to all subscribers
#[derive(Debug)]
pub struct EventBroadcaster {
    tx: broadcast::Sender<WorkflowEvent>,
}

impl EventBroadcaster {
    /// Create a new event broadcaster with a channel capacity of 256 events
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    /// Broadcast an event to all subscribers
    pub fn broadcast(&self, event_type: &str, payload: impl Serialize) {
        let event = WorkflowEvent {
            event: event_type.to_string(),
            payload: serde_json::to_value(payload).unwrap_or(serde_json::Value::Null),
        };

        // Ignore send errors (no receivers)
        let _ = self.tx.send(event);
    }

    /// Broadcast a user-facing notification
    pub fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Error => log::warn!("Notify: {}", notification.message),
            _ => log::info!("Notify: {}", notification.message),
        }
        self.broadcast(EVENT_NOTIFICATION, notification);
    }

    /// Subscribe to events (returns a receiver)
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_without_subscribers() {
        let broadcaster = EventBroadcaster::new();
        broadcaster.notify(Notification::info("nobody listening"));
    }

    #[test]
    fn test_notification_round_trip() {
        let broadcaster = EventBroadcaster::new();
        let mut rx = broadcaster.subscribe();

        broadcaster.notify(Notification::error("Please enter your idea"));

        let event = rx.try_recv().unwrap();
        assert_eq!(event.event, EVENT_NOTIFICATION);
        let notification: Notification = event.payload_as().unwrap();
        assert_eq!(notification.level, NotificationLevel::Error);
        assert_eq!(notification.message, "Please enter your idea");
    }

    #[test]
    fn test_payload_serialization() {
        let payload = PhaseChangedPayload {
            session_id: "s1".to_string(),
            old_phase: WorkflowPhase::Idea,
            new_phase: WorkflowPhase::Questioning,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["oldPhase"], "idea");
        assert_eq!(json["newPhase"], "questioning");
        assert_eq!(json["sessionId"], "s1");
    }
}
