//! The application state object.
//!
//! `App` owns every transport and cache the pages read from. User actions
//! are methods on it; background tasks talk to it only through the event
//! channel, drained by [`App::handle_event`].

use std::sync::Arc;

use chrono::Local;
use tokio::task::JoinHandle;

use crate::api::kanban::TaskScope;
use crate::api::models::{
    KanbanTask, PersonalChatEntry, RegisterRequest, TaskDraft, TaskStatus, Team, User,
};
use crate::api::HttpClient;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::events::{self, emit, AppEvent, EventReceiver, EventSender, ToastLevel};
use crate::features::burnout::{parse_tasks, BurnoutForm};
use crate::features::notes::{self, QuickNote};
use crate::features::role_test::{self, RoleResult, RoleTest, ROLE_TEST_XP};
use crate::features::timers::Pomodoro;
use crate::features::{notifications, record_learn, theme, LearnEntry};
use crate::router::{LazyLoad, NavHighlight, Page, Router};
use crate::session;
use crate::store::{keys, LocalStore};
use crate::sync::stream::{stream_personal_chat, StreamRequest};
use crate::sync::{ChatTransport, KanbanBoard, KanbanSync, Presence, StreamOutcome};
use crate::util::{now_millis, ws_base};
use crate::view::{self, ChatLine, ColumnView, DashboardData, DashboardView, GaugeView, SidebarView, ViewHint};

pub const QUICK_NOTE_XP: i64 = 5;
const STORE_FILE: &str = "store.json";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub text: String,
}

pub struct App {
    config: ClientConfig,
    store: Arc<LocalStore>,
    http: HttpClient,
    events_tx: EventSender,
    events_rx: EventReceiver,
    presence: Presence,
    chat: ChatTransport,
    kanban: KanbanSync,
    router: Router,

    pub teams: Vec<Team>,
    pub board: KanbanBoard,
    pub dashboard_team: Option<i64>,
    pub dashboard: Option<DashboardView>,
    pub leaderboard: Vec<User>,
    pub personal_history: Vec<PersonalChatEntry>,
    pub burnout: BurnoutForm,
    pub burnout_gauge: Option<GaugeView>,
    pub role_test: RoleTest,
    pub pomodoro: Pomodoro,
    /// HTML of the assistant bubble currently streaming (or last streamed).
    pub stream_html: Option<String>,
    pub hint: Option<ViewHint>,
    toasts: Vec<Toast>,
}

impl App {
    /// Open the store under the configured data directory and build the app.
    pub fn open(config: ClientConfig) -> Result<Self> {
        let data_dir = config.data_dir();
        std::fs::create_dir_all(&data_dir)?;
        let store = LocalStore::open(data_dir.join(STORE_FILE))?;
        Ok(Self::new(config, Arc::new(store)))
    }

    pub fn new(config: ClientConfig, store: Arc<LocalStore>) -> Self {
        let (events_tx, events_rx) = events::channel();
        let http = HttpClient::new(&config.base_url, store.clone());
        let ws = ws_base(&config.base_url);
        let presence = Presence::new(http.clone(), config.heartbeat_interval(), events_tx.clone());
        let chat = ChatTransport::new(http.clone(), ws.clone(), events_tx.clone());
        let kanban = KanbanSync::new(ws, config.kanban_ping(), config.reconnect.clone(), events_tx.clone());
        Self {
            config,
            store,
            http,
            events_tx,
            events_rx,
            presence,
            chat,
            kanban,
            router: Router::new(),
            teams: Vec::new(),
            board: KanbanBoard::default(),
            dashboard_team: None,
            dashboard: None,
            leaderboard: Vec::new(),
            personal_history: Vec::new(),
            burnout: BurnoutForm::default(),
            burnout_gauge: None,
            role_test: RoleTest::new(),
            pomodoro: Pomodoro::default(),
            stream_html: None,
            hint: None,
            toasts: Vec::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<LocalStore> {
        &self.store
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    pub fn chat(&self) -> &ChatTransport {
        &self.chat
    }

    pub fn kanban(&self) -> &KanbanSync {
        &self.kanban
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Sender for tasks outside the app that want to publish events.
    pub fn events(&self) -> EventSender {
        self.events_tx.clone()
    }

    pub fn user(&self) -> Option<User> {
        session::current_user(&self.store)
    }

    pub fn language(&self) -> String {
        theme::language(&self.store)
    }

    // ── Toasts & hints ──────────────────────────────────────────────────

    pub fn toast(&mut self, level: ToastLevel, text: impl Into<String>) {
        let text = text.into();
        tracing::debug!("toast {level:?}: {text}");
        self.toasts.push(Toast { level, text });
    }

    pub fn take_toasts(&mut self) -> Vec<Toast> {
        std::mem::take(&mut self.toasts)
    }

    /// Surface a failed action: validation as a warning, everything else
    /// as an error with the backend's message verbatim.
    pub fn report<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                let level = match e {
                    ClientError::Validation(_) => ToastLevel::Warning,
                    _ => ToastLevel::Error,
                };
                if matches!(e, ClientError::Unauthorized) {
                    self.presence.stop();
                }
                self.toast(level, e.to_string());
                None
            }
        }
    }

    fn invalid(&mut self, field: &'static str, msg: &str) -> ClientError {
        self.hint = Some(ViewHint::Shake(field));
        ClientError::validation(msg)
    }

    // ── Auth ────────────────────────────────────────────────────────────

    pub async fn login(&mut self, username: &str, password: &str) -> Result<User> {
        if username.trim().is_empty() {
            return Err(self.invalid("loginUsername", "Enter your username"));
        }
        if password.is_empty() {
            return Err(self.invalid("loginPassword", "Enter your password"));
        }
        let auth = self.http.login(username.trim(), password).await?;
        self.begin_session(&auth.access_token, auth.user).await
    }

    pub async fn register(&mut self, request: RegisterRequest) -> Result<User> {
        if request.username.trim().is_empty() {
            return Err(self.invalid("regUsername", "Enter a username"));
        }
        if request.password.is_empty() {
            return Err(self.invalid("regPassword", "Enter a password"));
        }
        let auth = self.http.register(&request).await?;
        self.begin_session(&auth.access_token, auth.user).await
    }

    pub async fn guest(&mut self) -> Result<User> {
        let auth = self.http.guest_login().await?;
        self.begin_session(&auth.access_token, auth.user).await
    }

    /// Pick up a stored session on startup. Returns `None` when there is
    /// none or the backend no longer accepts it.
    pub async fn resume(&mut self) -> Option<User> {
        session::token(&self.store)?;
        match self.http.me().await {
            Ok(user) => {
                if let Err(e) = session::set_user(&self.store, &user) {
                    tracing::warn!("failed to cache user: {e}");
                }
                self.after_login(&user).await;
                Some(user)
            }
            Err(e) => {
                tracing::warn!("session not resumed: {e}");
                None
            }
        }
    }

    async fn begin_session(&mut self, token: &str, user: User) -> Result<User> {
        session::save(&self.store, token, &user)?;
        tracing::info!("logged in as {}", user.username);
        self.after_login(&user).await;
        Ok(user)
    }

    async fn after_login(&mut self, user: &User) {
        self.presence.start().await;
        if let Err(e) = notifications::check_auto(&self.store, Some(user), Local::now()) {
            tracing::warn!("notification check failed: {e}");
        }
    }

    pub async fn logout(&mut self) -> Result<()> {
        self.presence.stop();
        self.chat.close().await;
        self.kanban.disconnect().await;
        self.router.cancel_dashboard_poll();
        self.teams.clear();
        self.board = KanbanBoard::default();
        self.dashboard = None;
        session::clear(&self.store)?;
        tracing::info!("logged out");
        Ok(())
    }

    /// Spend XP in the background; the result never blocks the caller.
    fn award_xp(&self, amount: i64, reason: &'static str) {
        if !session::is_logged_in(&self.store) {
            return;
        }
        let http = self.http.clone();
        tokio::spawn(async move {
            if let Err(e) = http.award_xp(amount, reason).await {
                tracing::warn!("xp award ({reason}) failed: {e}");
            }
        });
    }

    // ── Navigation ──────────────────────────────────────────────────────

    /// Show `page` and run its lazy load. Load failures become toasts.
    pub async fn show_page(&mut self, page: Page) {
        let Some(load) = self.router.show(page) else {
            return;
        };
        let result = match load {
            LazyLoad::Kanban => self.load_kanban().await,
            LazyLoad::Dashboard => self.open_dashboard().await,
            LazyLoad::Teams | LazyLoad::MyTeam => self.refresh_teams().await,
            LazyLoad::BurnoutMembers => self.start_burnout().await,
            LazyLoad::RoleTest => {
                self.role_test = RoleTest::new();
                Ok(())
            }
            LazyLoad::Leaderboard => self.load_leaderboard().await,
            LazyLoad::Profile => self.refresh_profile().await,
            LazyLoad::PersonalHistory => self.load_personal_history().await,
            other => {
                tracing::debug!("no cached state for {other:?}");
                Ok(())
            }
        };
        self.report(result);
    }

    pub fn nav(&self) -> NavHighlight {
        self.router.nav()
    }

    pub fn sidebar(&self) -> Option<SidebarView> {
        view::sidebar(self.user().as_ref())
    }

    pub async fn refresh_profile(&mut self) -> Result<()> {
        let user = self.http.me().await?;
        session::set_user(&self.store, &user)
    }

    pub async fn load_leaderboard(&mut self) -> Result<()> {
        self.leaderboard = self.http.leaderboard(20).await?;
        Ok(())
    }

    // ── Teams ───────────────────────────────────────────────────────────

    pub async fn refresh_teams(&mut self) -> Result<()> {
        self.teams = self.http.teams().await?;
        if self.dashboard_team.is_none() {
            self.dashboard_team = self.teams.first().map(|t| t.id);
        }
        Ok(())
    }

    // ── Dashboard ───────────────────────────────────────────────────────

    async fn open_dashboard(&mut self) -> Result<()> {
        if self.teams.is_empty() {
            self.refresh_teams().await?;
        }
        self.refresh_dashboard().await;
        if !self.router.has_dashboard_poll() {
            self.router.set_dashboard_poll(spawn_ticker(self.config.dashboard_poll(), self.events_tx.clone()));
        }
        Ok(())
    }

    /// Fetch members, tasks, messages and online users together; any single
    /// failure shows up as an empty list.
    pub async fn refresh_dashboard(&mut self) {
        let Some(team_id) = self.dashboard_team else {
            return;
        };
        let (members, tasks, messages, online) = tokio::join!(
            self.http.team_members(team_id),
            self.http.kanban_tasks(TaskScope::Team(team_id)),
            self.http.chat_messages(team_id),
            self.http.online_users(),
        );
        let data = DashboardData {
            members: or_empty(members, "members"),
            tasks: or_empty(tasks, "tasks"),
            messages: or_empty(messages, "messages"),
            online: or_empty(online, "online users"),
        };
        self.dashboard = Some(view::dashboard(&data));
    }

    // ── Kanban ──────────────────────────────────────────────────────────

    /// Board to show: the saved team filter, else the user's own tasks.
    pub fn kanban_scope(&self) -> TaskScope {
        let team = self
            .store
            .get(keys::KANBAN_TEAM)
            .and_then(|v| v.trim().parse::<i64>().ok());
        match (team, self.user()) {
            (Some(id), _) => TaskScope::Team(id),
            (None, Some(user)) => TaskScope::User(user.id),
            (None, None) => TaskScope::All,
        }
    }

    pub async fn set_kanban_team(&mut self, team_id: Option<i64>) -> Result<()> {
        match team_id {
            Some(id) => self.store.set(keys::KANBAN_TEAM, id.to_string())?,
            None => self.store.set(keys::KANBAN_TEAM, "")?,
        }
        self.load_kanban().await
    }

    /// Replace the board with a fresh fetch and make sure the change feed
    /// for it is joined.
    pub async fn load_kanban(&mut self) -> Result<()> {
        let scope = self.kanban_scope();
        let tasks = self.http.kanban_tasks(scope).await?;
        self.board.replace(tasks);
        if let Some(room) = scope.room() {
            self.kanban.connect(&room).await;
        }
        Ok(())
    }

    pub fn kanban_columns(&self) -> Vec<ColumnView> {
        view::kanban_columns(&self.board, Local::now().date_naive())
    }

    pub fn kanban_banner(&self) -> Option<&'static str> {
        view::kanban_banner(self.kanban.state())
    }

    /// A card dropped on `status`: move it, then reload the whole board.
    pub async fn drop_task(&mut self, task_id: i64, status: TaskStatus) -> Result<()> {
        self.http.move_task(task_id, status).await?;
        if status == TaskStatus::Done {
            self.toast(ToastLevel::Success, "✅ Task completed!");
        }
        self.load_kanban().await
    }

    pub async fn create_task(&mut self, mut draft: TaskDraft) -> Result<KanbanTask> {
        if draft.title.trim().is_empty() {
            return Err(self.invalid("ktTitle", "Enter a task title"));
        }
        match self.kanban_scope() {
            TaskScope::Team(id) => draft.team_id = draft.team_id.or(Some(id)),
            TaskScope::User(id) => draft.user_id = draft.user_id.or(Some(id)),
            TaskScope::All => {}
        }
        let task = self.http.create_task(&draft).await?;
        self.load_kanban().await?;
        Ok(task)
    }

    pub async fn update_task(&mut self, task_id: i64, draft: TaskDraft) -> Result<()> {
        if draft.title.trim().is_empty() {
            return Err(self.invalid("ktTitle", "Enter a task title"));
        }
        self.http.update_task(task_id, &draft).await?;
        self.load_kanban().await
    }

    pub async fn delete_task(&mut self, task_id: i64) -> Result<()> {
        self.http.delete_task(task_id).await?;
        self.load_kanban().await
    }

    // ── Chat ────────────────────────────────────────────────────────────

    /// Join a team's chat: socket first, then the stored history.
    pub async fn open_chat(&mut self, team_id: i64) -> Result<()> {
        self.chat.connect(team_id).await;
        let history = self.http.chat_messages(team_id).await?;
        self.chat.with_log(|log| log.replace(history));
        Ok(())
    }

    pub async fn send_chat(&mut self, content: &str) -> Result<()> {
        let content = content.trim();
        if content.is_empty() {
            return Err(self.invalid("chatInput", "Type a message"));
        }
        let Some(team_id) = self.chat.team_id() else {
            return Err(ClientError::validation("Pick a team chat first"));
        };
        let sender = self.user().map_or_else(|| "Guest".to_string(), |u| u.username);
        self.chat.send(team_id, &sender, content).await;
        Ok(())
    }

    pub async fn toggle_pin(&mut self, message_id: i64) -> Result<()> {
        let state = self.http.toggle_pin(message_id).await?;
        self.chat.with_log(|log| log.set_pinned(message_id, state.pinned));
        Ok(())
    }

    pub async fn react(&mut self, message_id: i64, emoji: &str) -> Result<()> {
        let username = self.user().map_or_else(|| "Guest".to_string(), |u| u.username);
        let summary = self.http.react_to_message(message_id, emoji, &username).await?;
        self.chat.with_log(|log| log.set_reactions(message_id, summary.reactions));
        Ok(())
    }

    pub fn chat_lines(&self) -> Vec<ChatLine> {
        self.chat.log().messages().iter().map(view::chat_line).collect()
    }

    // ── Personal chat ───────────────────────────────────────────────────

    pub async fn load_personal_history(&mut self) -> Result<()> {
        let Some(user) = self.user() else {
            self.personal_history.clear();
            return Ok(());
        };
        self.personal_history = self.http.personal_history(user.id).await?;
        Ok(())
    }

    /// Stream one answer. Bubble updates arrive as `StreamUpdate` events;
    /// the final state is also kept in `stream_html`.
    pub async fn send_personal_chat(&mut self, message: &str, mode: &str) -> Result<StreamOutcome> {
        let message = message.trim();
        if message.is_empty() {
            return Err(self.invalid("personalChatInput", "Type a message"));
        }
        let language = self.language();
        let user_id = self.user().map(|u| u.id);
        self.stream_html = None;
        let request = StreamRequest {
            message,
            language: &language,
            mode,
            user_id,
        };
        let outcome = stream_personal_chat(&self.http, &request, &self.events_tx).await;
        self.stream_html = Some(outcome.html());
        Ok(outcome)
    }

    // ── Burnout ─────────────────────────────────────────────────────────

    /// Fresh questionnaire plus the team list to pick a member from.
    pub async fn start_burnout(&mut self) -> Result<()> {
        if self.teams.is_empty() {
            self.refresh_teams().await?;
        }
        let questions = self.http.burnout_questions(&self.language()).await?;
        self.burnout = BurnoutForm::new(questions);
        self.burnout_gauge = None;
        Ok(())
    }

    pub async fn submit_burnout(&mut self) -> Result<GaugeView> {
        let (member_id, answers) = match self.burnout.submission() {
            Ok(s) => s,
            Err(e) => {
                self.hint = Some(ViewHint::Shake("burnoutMember"));
                return Err(e);
            }
        };
        let language = self.language();
        let response = self.http.check_burnout(member_id, &answers, &language).await?;
        let score = response.metadata_f64("burnout_score").unwrap_or(0.0);
        let gauge = view::burnout_gauge(score, &language);
        self.burnout_gauge = Some(gauge.clone());
        self.burnout.reset();
        Ok(gauge)
    }

    pub async fn optimize_schedule(&mut self, member_id: i64, remaining_hours: f64, tasks: &str) -> Result<String> {
        let tasks = match parse_tasks(tasks) {
            Ok(t) => t,
            Err(e) => {
                self.hint = Some(ViewHint::Shake("scheduleTasks"));
                return Err(e);
            }
        };
        let response = self
            .http
            .optimize_schedule(member_id, remaining_hours, &tasks, &self.language())
            .await?;
        Ok(crate::markdown::render_markdown(&response.content))
    }

    // ── Role test ───────────────────────────────────────────────────────

    pub fn finish_role_test(&mut self) -> Result<RoleResult> {
        let result = self.role_test.result()?;
        role_test::save_result(&self.store, &result)?;
        self.award_xp(ROLE_TEST_XP, "role_test");
        Ok(result)
    }

    // ── Notes & learning ────────────────────────────────────────────────

    pub fn save_quick_note(&mut self, title: &str, content: &str) -> Result<QuickNote> {
        let note = match notes::add_quick_note(&self.store, title, content) {
            Ok(n) => n,
            Err(e @ ClientError::Validation(_)) => {
                self.hint = Some(ViewHint::Shake("quickNoteContent"));
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        self.award_xp(QUICK_NOTE_XP, "quick_note");
        Ok(note)
    }

    /// Explain a topic and remember it in the learn history.
    pub async fn learn_topic(&mut self, topic: &str, level: &str) -> Result<String> {
        if topic.trim().is_empty() {
            return Err(self.invalid("learnTopic", "Enter a topic"));
        }
        let response = self.http.explain_topic(topic.trim(), level, &self.language()).await?;
        record_learn(
            &self.store,
            LearnEntry {
                title: topic.trim().to_string(),
                emoji: None,
                level: level.to_string(),
                topic: topic.trim().to_string(),
                lessons: response.metadata.clone().unwrap_or_default(),
                date: now_millis(),
            },
        )?;
        Ok(crate::markdown::render_markdown(&response.content))
    }

    pub fn notification_badge(&self) -> Option<String> {
        view::notification_badge(notifications::unread_count(&self.store))
    }

    // ── Events ──────────────────────────────────────────────────────────

    /// Wait for the next background event. `None` never happens while the
    /// app is alive since it holds a sender itself.
    pub async fn next_event(&mut self) -> Option<AppEvent> {
        self.events_rx.recv().await
    }

    /// Handle everything already queued without waiting.
    pub async fn drain_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event).await;
            handled += 1;
        }
        handled
    }

    pub async fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::KanbanChanged { room } => {
                tracing::debug!("kanban change in {room}");
                if self.router.is_active(Page::Kanban) {
                    let result = self.load_kanban().await;
                    self.report(result);
                }
                self.toast(ToastLevel::Info, "📋 Kanban updated");
            }
            AppEvent::KanbanDisconnected { room, gave_up: true } => {
                tracing::warn!("kanban feed for {room} gave up");
            }
            AppEvent::DashboardTick => {
                if self.router.is_active(Page::Dashboard) {
                    self.refresh_dashboard().await;
                } else {
                    self.router.cancel_dashboard_poll();
                }
            }
            AppEvent::StreamUpdate { html } => self.stream_html = Some(html),
            AppEvent::Toast { level, text } => self.toast(level, text),
            AppEvent::ChatDisconnected { team_id } => {
                tracing::info!("chat {team_id} offline, sending over HTTP");
            }
            AppEvent::PresenceRefreshed { .. }
            | AppEvent::ChatConnected { .. }
            | AppEvent::ChatMessage { .. }
            | AppEvent::KanbanConnected { .. }
            | AppEvent::KanbanDisconnected { .. } => {
                tracing::trace!("{event:?}");
            }
        }
    }
}

fn or_empty<T>(result: Result<Vec<T>>, what: &str) -> Vec<T> {
    result.unwrap_or_else(|e| {
        tracing::warn!("dashboard {what} unavailable: {e}");
        Vec::new()
    })
}

fn spawn_ticker(every: std::time::Duration, events: EventSender) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticks = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
        loop {
            ticks.tick().await;
            if events.is_closed() {
                break;
            }
            emit(&events, AppEvent::DashboardTick);
        }
    })
}
