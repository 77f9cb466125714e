use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::api::models::{KanbanTask, TaskStatus};
use crate::config::ReconnectPolicy;
use crate::events::{emit, AppEvent, EventSender};

// ── Board cache ─────────────────────────────────────────────────────────────

/// Last fetched task list, grouped by column. Every fetch replaces it whole.
#[derive(Clone, Debug, Default)]
pub struct KanbanBoard {
    columns: BTreeMap<TaskStatus, Vec<KanbanTask>>,
}

impl KanbanBoard {
    pub fn from_tasks(tasks: Vec<KanbanTask>) -> Self {
        let mut board = Self::default();
        board.replace(tasks);
        board
    }

    pub fn replace(&mut self, tasks: Vec<KanbanTask>) {
        self.columns.clear();
        for task in tasks {
            self.columns.entry(task.status).or_default().push(task);
        }
    }

    pub fn column(&self, status: TaskStatus) -> &[KanbanTask] {
        self.columns.get(&status).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Per-column counts in board order, empty columns included.
    pub fn counts(&self) -> [(TaskStatus, usize); 5] {
        TaskStatus::ALL.map(|status| (status, self.column(status).len()))
    }

    pub fn total(&self) -> usize {
        self.columns.values().map(Vec::len).sum()
    }

    pub fn find(&self, task_id: i64) -> Option<&KanbanTask> {
        self.columns.values().flatten().find(|t| t.id == task_id)
    }

    /// Done / total, 0 for an empty board.
    pub fn done_ratio(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.column(TaskStatus::Done).len() as f64 / total as f64
    }
}

// ── State ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KanbanState {
    Idle,
    Connecting,
    Open,
    /// Closed, reconnect scheduled.
    Waiting,
    /// Reconnect budget exhausted.
    GaveUp,
}

impl KanbanState {
    fn is_live(self) -> bool {
        matches!(self, Self::Connecting | Self::Open | Self::Waiting)
    }
}

struct Shared {
    room: Option<String>,
    state: KanbanState,
    generation: u64,
}

/// Change notifications for one board room, with keep-alive pings and
/// bounded reconnects.
pub struct KanbanSync {
    ws_base: String,
    ping: Duration,
    policy: ReconnectPolicy,
    events: EventSender,
    shared: Arc<Mutex<Shared>>,
    handle: Arc<tokio::sync::Mutex<Option<JoinHandle<()>>>>,
}

impl KanbanSync {
    pub fn new(ws_base: impl Into<String>, ping: Duration, policy: ReconnectPolicy, events: EventSender) -> Self {
        Self {
            ws_base: ws_base.into(),
            ping,
            policy,
            events,
            shared: Arc::new(Mutex::new(Shared {
                room: None,
                state: KanbanState::Idle,
                generation: 0,
            })),
            handle: Arc::new(tokio::sync::Mutex::new(None)),
        }
    }

    pub fn state(&self) -> KanbanState {
        lock(&self.shared).state
    }

    pub fn room(&self) -> Option<String> {
        lock(&self.shared).room.clone()
    }

    /// Join `room`. Already connected (or reconnecting) to it: nothing happens.
    pub async fn connect(&self, room: &str) {
        let generation = {
            let mut shared = lock(&self.shared);
            if shared.room.as_deref() == Some(room) && shared.state.is_live() {
                tracing::debug!("kanban already on {room}");
                return;
            }
            shared.room = Some(room.to_string());
            shared.state = KanbanState::Connecting;
            shared.generation += 1;
            shared.generation
        };

        let mut handle = self.handle.lock().await;
        if let Some(old) = handle.take() {
            old.abort();
        }

        let task = Worker {
            url: format!("{}/api/kanban/ws/{room}", self.ws_base),
            room: room.to_string(),
            ping: self.ping,
            policy: self.policy.clone(),
            generation,
            shared: self.shared.clone(),
            events: self.events.clone(),
        };
        *handle = Some(tokio::spawn(task.run()));
    }

    pub async fn disconnect(&self) {
        if let Some(handle) = self.handle.lock().await.take() {
            handle.abort();
        }
        let mut shared = lock(&self.shared);
        shared.generation += 1;
        shared.room = None;
        shared.state = KanbanState::Idle;
    }
}

impl Drop for KanbanSync {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.handle.try_lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}

// ── Worker ──────────────────────────────────────────────────────────────────

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct Worker {
    url: String,
    room: String,
    ping: Duration,
    policy: ReconnectPolicy,
    generation: u64,
    shared: Arc<Mutex<Shared>>,
    events: EventSender,
}

impl Worker {
    fn set_state(&self, state: KanbanState) -> bool {
        let mut shared = lock(&self.shared);
        if shared.generation != self.generation {
            return false;
        }
        shared.state = state;
        true
    }

    async fn run(self) {
        let mut attempt: u32 = 0;
        loop {
            if !self.set_state(KanbanState::Connecting) {
                return;
            }
            match connect_async(self.url.as_str()).await {
                Ok((stream, _)) => {
                    attempt = 0;
                    if !self.set_state(KanbanState::Open) {
                        return;
                    }
                    tracing::info!("kanban connected to {}", self.room);
                    emit(&self.events, AppEvent::KanbanConnected { room: self.room.clone() });
                    self.pump(stream).await;
                    tracing::info!("kanban socket for {} closed", self.room);
                }
                Err(e) => tracing::warn!("kanban socket {} failed: {e}", self.url),
            }

            attempt += 1;
            if !self.policy.allows(attempt) {
                if self.set_state(KanbanState::GaveUp) {
                    tracing::warn!("kanban gave up on {} after {} attempts", self.room, attempt - 1);
                    emit(
                        &self.events,
                        AppEvent::KanbanDisconnected {
                            room: self.room.clone(),
                            gave_up: true,
                        },
                    );
                }
                return;
            }
            if !self.set_state(KanbanState::Waiting) {
                return;
            }
            emit(
                &self.events,
                AppEvent::KanbanDisconnected {
                    room: self.room.clone(),
                    gave_up: false,
                },
            );
            tokio::time::sleep(self.policy.delay()).await;
        }
    }

    async fn pump(&self, stream: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>) {
        let (mut sink, mut source) = stream.split();
        let mut ticker = interval_at(Instant::now() + self.ping, self.ping);
        let ping = serde_json::json!({ "type": "ping" }).to_string();

        loop {
            tokio::select! {
                frame = source.next() => match frame {
                    Some(Ok(Message::Text(text))) => self.on_frame(text.as_str()),
                    Some(Ok(Message::Close(_))) | None => return,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!("kanban socket error: {e}");
                        return;
                    }
                },
                _ = ticker.tick() => {
                    if let Err(e) = sink.send(Message::Text(ping.clone().into())).await {
                        tracing::warn!("kanban ping failed: {e}");
                        return;
                    }
                }
            }
        }
    }

    fn on_frame(&self, text: &str) {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(text) else {
            tracing::debug!("ignoring non-JSON kanban frame");
            return;
        };
        if value.get("type").and_then(|t| t.as_str()) == Some("pong") {
            return;
        }
        tracing::debug!("kanban change on {}", self.room);
        emit(&self.events, AppEvent::KanbanChanged { room: self.room.clone() });
    }
}
