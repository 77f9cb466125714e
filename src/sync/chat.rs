use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::api::models::{ChatMessage, OutgoingMessage};
use crate::api::HttpClient;
use crate::events::{emit, AppEvent, EventSender, ToastLevel};

// ── Log ─────────────────────────────────────────────────────────────────────

/// Append-only message list of the room currently shown.
#[derive(Clone, Debug, Default)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
    ids: HashSet<i64>,
}

impl ChatLog {
    /// Appends unless a message with the same server id is already present.
    pub fn push(&mut self, message: ChatMessage) -> bool {
        if let Some(id) = message.id {
            if !self.ids.insert(id) {
                return false;
            }
        }
        self.messages.push(message);
        true
    }

    /// Replace with a freshly fetched history (oldest first).
    pub fn replace(&mut self, history: Vec<ChatMessage>) {
        self.messages.clear();
        self.ids.clear();
        for message in history {
            self.push(message);
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Apply a pin toggle answered by the backend.
    pub fn set_pinned(&mut self, message_id: i64, pinned: bool) {
        if let Some(m) = self.messages.iter_mut().find(|m| m.id == Some(message_id)) {
            m.is_pinned = pinned;
        }
    }

    pub fn set_reactions(&mut self, message_id: i64, reactions: std::collections::BTreeMap<String, u32>) {
        if let Some(m) = self.messages.iter_mut().find(|m| m.id == Some(message_id)) {
            m.reactions = reactions;
        }
    }
}

// ── State ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatState {
    Disconnected,
    Connecting,
    Connected,
}

struct Shared {
    state: ChatState,
    team_id: Option<i64>,
    /// Bumped on every connect so a stale socket task cannot overwrite
    /// the state of its replacement.
    generation: u64,
    outbound: Option<mpsc::UnboundedSender<String>>,
    log: ChatLog,
}

#[derive(Deserialize)]
struct Frame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(flatten)]
    message: ChatMessage,
}

/// Team chat socket, at most one room at a time, no reconnect.
pub struct ChatTransport {
    http: HttpClient,
    ws_base: String,
    events: EventSender,
    shared: Arc<Mutex<Shared>>,
    handle: Arc<tokio::sync::Mutex<Option<JoinHandle<()>>>>,
}

impl ChatTransport {
    pub fn new(http: HttpClient, ws_base: impl Into<String>, events: EventSender) -> Self {
        Self {
            http,
            ws_base: ws_base.into(),
            events,
            shared: Arc::new(Mutex::new(Shared {
                state: ChatState::Disconnected,
                team_id: None,
                generation: 0,
                outbound: None,
                log: ChatLog::default(),
            })),
            handle: Arc::new(tokio::sync::Mutex::new(None)),
        }
    }

    pub fn state(&self) -> ChatState {
        lock(&self.shared).state
    }

    pub fn team_id(&self) -> Option<i64> {
        lock(&self.shared).team_id
    }

    pub fn log(&self) -> ChatLog {
        lock(&self.shared).log.clone()
    }

    pub fn with_log<R>(&self, f: impl FnOnce(&mut ChatLog) -> R) -> R {
        f(&mut lock(&self.shared).log)
    }

    /// Open the socket for `team_id`, closing whatever was open before.
    pub async fn connect(&self, team_id: i64) {
        self.close().await;

        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let generation = {
            let mut shared = lock(&self.shared);
            if shared.team_id != Some(team_id) {
                shared.log = ChatLog::default();
            }
            shared.team_id = Some(team_id);
            shared.state = ChatState::Connecting;
            shared.generation += 1;
            shared.outbound = Some(out_tx);
            shared.generation
        };

        let url = format!("{}/api/chat/ws/{team_id}", self.ws_base);
        let shared = self.shared.clone();
        let events = self.events.clone();
        let handle = tokio::spawn(async move {
            run_socket(url, team_id, generation, shared, events, out_rx).await;
        });
        *self.handle.lock().await = Some(handle);
    }

    pub async fn close(&self) {
        if let Some(handle) = self.handle.lock().await.take() {
            handle.abort();
        }
        let mut shared = lock(&self.shared);
        if shared.state != ChatState::Disconnected {
            tracing::info!("chat socket closed");
        }
        shared.state = ChatState::Disconnected;
        shared.outbound = None;
    }

    /// Deliver a message: over the socket when open, otherwise shown
    /// locally right away. Always persisted over HTTP as well; a failed
    /// POST is only logged.
    pub async fn send(&self, team_id: i64, sender: &str, content: &str) {
        let outgoing = OutgoingMessage {
            team_id,
            sender: sender.to_string(),
            content: content.to_string(),
        };

        let sent_over_socket = {
            let mut shared = lock(&self.shared);
            let open = shared.state == ChatState::Connected && shared.team_id == Some(team_id);
            let frame = serde_json::json!({
                "team_id": team_id,
                "sender": sender,
                "content": content,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            });
            let delivered = open
                && shared
                    .outbound
                    .as_ref()
                    .map(|tx| tx.send(frame.to_string()).is_ok())
                    .unwrap_or(false);
            if !delivered {
                let message = ChatMessage::local(team_id, sender, content);
                shared.log.push(message.clone());
                emit(&self.events, AppEvent::ChatMessage { team_id, message });
            }
            delivered
        };
        tracing::debug!("chat send (socket: {sent_over_socket})");

        if let Err(e) = self.http.post_chat_message(&outgoing).await {
            tracing::warn!("chat message POST failed: {e}");
        }
    }
}

impl Drop for ChatTransport {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.handle.try_lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}

// ── Socket task ─────────────────────────────────────────────────────────────

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Returns false when a newer connection has taken over.
fn set_state(shared: &Mutex<Shared>, generation: u64, state: ChatState) -> bool {
    let mut guard = lock(shared);
    if guard.generation != generation {
        return false;
    }
    guard.state = state;
    if state == ChatState::Disconnected {
        guard.outbound = None;
    }
    true
}

async fn run_socket(
    url: String,
    team_id: i64,
    generation: u64,
    shared: Arc<Mutex<Shared>>,
    events: EventSender,
    mut outbound: mpsc::UnboundedReceiver<String>,
) {
    let stream = match connect_async(url.as_str()).await {
        Ok((stream, _)) => stream,
        Err(e) => {
            tracing::warn!("chat socket {url} failed: {e}");
            if set_state(&shared, generation, ChatState::Disconnected) {
                emit(&events, AppEvent::toast(ToastLevel::Warning, "Chat connection failed"));
            }
            return;
        }
    };

    if !set_state(&shared, generation, ChatState::Connected) {
        return;
    }
    tracing::info!("chat connected to team {team_id}");
    emit(&events, AppEvent::ChatConnected { team_id });

    let (mut sink, mut source) = stream.split();
    loop {
        tokio::select! {
            frame = source.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    handle_frame(text.as_str(), team_id, generation, &shared, &events);
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("chat socket error: {e}");
                    break;
                }
            },
            Some(text) = outbound.recv() => {
                if let Err(e) = sink.send(Message::Text(text.into())).await {
                    tracing::warn!("chat socket send failed: {e}");
                    break;
                }
            }
        }
    }

    if set_state(&shared, generation, ChatState::Disconnected) {
        tracing::info!("chat disconnected from team {team_id}");
        emit(&events, AppEvent::ChatDisconnected { team_id });
    }
}

fn handle_frame(text: &str, team_id: i64, generation: u64, shared: &Mutex<Shared>, events: &EventSender) {
    let frame: Frame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!("ignoring chat frame: {e}");
            return;
        }
    };
    if frame.kind != "message" && frame.kind != "system" {
        return;
    }
    let mut message = frame.message;
    message.team_id.get_or_insert(team_id);

    let appended = {
        let mut guard = lock(shared);
        guard.generation == generation && guard.log.push(message.clone())
    };
    if appended {
        emit(events, AppEvent::ChatMessage { team_id, message });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::SenderType;
    use crate::events;
    use crate::store::LocalStore;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn msg(id: Option<i64>, content: &str) -> ChatMessage {
        ChatMessage {
            id,
            ..ChatMessage::local(1, "alice", content)
        }
    }

    #[test]
    fn log_dedupes_by_server_id_only() {
        let mut log = ChatLog::default();
        assert!(log.push(msg(Some(1), "hi")));
        assert!(!log.push(msg(Some(1), "hi again")));
        assert!(log.push(msg(None, "local")));
        assert!(log.push(msg(None, "local")));
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn pin_updates_message() {
        let mut log = ChatLog::default();
        log.replace(vec![msg(Some(7), "pin me")]);
        log.set_pinned(7, true);
        assert!(log.messages()[0].is_pinned);
    }

    async fn http_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 99, "team_id": 5, "sender": "alice", "content": "hello", "sender_type": "human"
            })))
            .expect(1)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn offline_send_is_optimistic_and_posts() {
        let server = http_server().await;
        let (tx, mut rx) = events::channel();
        let http = HttpClient::new(&server.uri(), Arc::new(LocalStore::in_memory()));
        let chat = ChatTransport::new(http, "ws://127.0.0.1:9", tx);

        chat.send(5, "alice", "hello").await;
        assert_eq!(chat.log().len(), 1);
        match rx.recv().await {
            Some(AppEvent::ChatMessage { team_id, message }) => {
                assert_eq!(team_id, 5);
                assert_eq!(message.content, "hello");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn socket_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            // Echo what the client sends as a broadcast, like the backend does.
            while let Some(Ok(Message::Text(text))) = ws.next().await {
                let sent: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
                let echo = serde_json::json!({
                    "type": "message",
                    "sender": sent["sender"],
                    "content": sent["content"],
                    "sender_type": "human",
                });
                ws.send(Message::Text(echo.to_string().into())).await.unwrap();
                ws.send(Message::Text(r#"{"type":"typing"}"#.into())).await.unwrap();
                ws.send(Message::Text(
                    r#"{"type":"system","content":"left","sender_type":"system"}"#.into(),
                ))
                .await
                .unwrap();
            }
        });

        let server = http_server().await;
        let (tx, mut rx) = events::channel();
        let http = HttpClient::new(&server.uri(), Arc::new(LocalStore::in_memory()));
        let chat = ChatTransport::new(http, format!("ws://{addr}"), tx);
        chat.connect(5).await;

        let connected = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
        assert_eq!(connected, Some(AppEvent::ChatConnected { team_id: 5 }));
        assert_eq!(chat.state(), ChatState::Connected);

        chat.send(5, "alice", "hello").await;

        let mut received = Vec::new();
        while received.len() < 2 {
            match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap() {
                Some(AppEvent::ChatMessage { message, .. }) => received.push(message),
                Some(_) => {}
                None => break,
            }
        }
        assert_eq!(received[0].content, "hello");
        assert_eq!(received[1].sender_type, SenderType::System);
        assert_eq!(received[1].sender, "System");
        assert_eq!(chat.log().len(), 2);

        chat.close().await;
        assert_eq!(chat.state(), ChatState::Disconnected);
    }

    #[tokio::test]
    async fn server_close_falls_back_to_local_send() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            ws.close(None).await.unwrap();
            while let Some(Ok(_)) = ws.next().await {}
        });

        let server = http_server().await;
        let (tx, mut rx) = events::channel();
        let http = HttpClient::new(&server.uri(), Arc::new(LocalStore::in_memory()));
        let chat = ChatTransport::new(http, format!("ws://{addr}"), tx);
        chat.connect(5).await;

        let wait = Duration::from_secs(5);
        let connected = tokio::time::timeout(wait, rx.recv()).await.unwrap();
        assert_eq!(connected, Some(AppEvent::ChatConnected { team_id: 5 }));
        let dropped = tokio::time::timeout(wait, rx.recv()).await.unwrap();
        assert_eq!(dropped, Some(AppEvent::ChatDisconnected { team_id: 5 }));
        assert_eq!(chat.state(), ChatState::Disconnected);

        chat.send(5, "alice", "hello").await;
        assert_eq!(chat.log().len(), 1);
        assert!(chat.log().messages()[0].id.is_none());
        match tokio::time::timeout(wait, rx.recv()).await.unwrap() {
            Some(AppEvent::ChatMessage { team_id, message }) => {
                assert_eq!(team_id, 5);
                assert_eq!(message.content, "hello");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
