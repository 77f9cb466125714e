use serde::Serialize;
use tokio::sync::mpsc;

use crate::api::models::ChatMessage;

// ── Events ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Everything a background task can tell the app. All transports publish
/// onto one channel; [`crate::app::App::handle_event`] is the only consumer.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "event", content = "data")]
pub enum AppEvent {
    #[serde(rename_all = "camelCase")]
    PresenceRefreshed { online: usize },
    #[serde(rename_all = "camelCase")]
    ChatConnected { team_id: i64 },
    #[serde(rename_all = "camelCase")]
    ChatMessage { team_id: i64, message: ChatMessage },
    #[serde(rename_all = "camelCase")]
    ChatDisconnected { team_id: i64 },
    KanbanConnected { room: String },
    KanbanChanged { room: String },
    #[serde(rename_all = "camelCase")]
    KanbanDisconnected { room: String, gave_up: bool },
    /// Partial (or final) HTML of the assistant bubble being streamed.
    StreamUpdate { html: String },
    Toast { level: ToastLevel, text: String },
    DashboardTick,
}

impl AppEvent {
    pub fn toast(level: ToastLevel, text: impl Into<String>) -> Self {
        Self::Toast {
            level,
            text: text.into(),
        }
    }
}

pub type EventSender = mpsc::UnboundedSender<AppEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<AppEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Publish, ignoring a closed receiver (the app is shutting down).
pub fn emit(tx: &EventSender, event: AppEvent) {
    if tx.send(event).is_err() {
        tracing::trace!("event receiver dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tagged_serialization() {
        let event = AppEvent::KanbanDisconnected {
            room: "team_3".into(),
            gave_up: true,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"event": "kanbanDisconnected", "data": {"room": "team_3", "gaveUp": true}})
        );
        assert_eq!(
            serde_json::to_value(AppEvent::DashboardTick).unwrap(),
            json!({"event": "dashboardTick"})
        );
    }

    #[tokio::test]
    async fn emit_after_receiver_dropped_is_silent() {
        let (tx, rx) = channel();
        drop(rx);
        emit(&tx, AppEvent::toast(ToastLevel::Info, "Kanban updated"));
    }
}
