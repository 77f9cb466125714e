//! Render functions: plain data in, view descriptions out.
//!
//! Nothing here touches the network or the store. The app re-derives these
//! after every state change and a front end draws whatever comes back.

use chrono::NaiveDate;
use serde::Serialize;

use crate::api::models::{ChatMessage, KanbanTask, Member, OnlineUser, Priority, SenderType, TaskStatus, User};
use crate::features::timers::Remaining;
use crate::markdown::{escape_html, render_markdown};
use crate::sync::{KanbanBoard, KanbanState};

pub const XP_PER_LEVEL: i64 = 200;

/// Input field to shake and focus after a failed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "hint", content = "field")]
pub enum ViewHint {
    Shake(&'static str),
}

/// `1234567` → `1,234,567`
pub fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ── Sidebar ─────────────────────────────────────────────────────────────────

const RANKS: [(i64, &str, &str); 6] = [
    (5000, "Legend", "👑"),
    (2000, "Mentor", "🧠"),
    (1000, "Hacker", "🔥"),
    (500, "Developer", "💻"),
    (200, "Intern", "⚡"),
    (0, "Novice", "🌱"),
];

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SidebarView {
    pub username: String,
    pub avatar: char,
    pub xp: String,
    pub rank: String,
    pub rank_icon: &'static str,
    pub level: i64,
    pub xp_in_level: i64,
    /// 0..=100
    pub level_progress: u32,
}

/// `None` when nobody is logged in; the widget is hidden.
pub fn sidebar(user: Option<&User>) -> Option<SidebarView> {
    let user = user?;
    let xp = user.xp.max(0);
    let (_, fallback_rank, rank_icon) = RANKS
        .iter()
        .copied()
        .find(|(threshold, _, _)| xp >= *threshold)
        .unwrap_or(RANKS[RANKS.len() - 1]);
    let xp_in_level = xp % XP_PER_LEVEL;
    Some(SidebarView {
        username: user.username.clone(),
        avatar: user
            .username
            .chars()
            .next()
            .map_or('U', |c| c.to_uppercase().next().unwrap_or(c)),
        xp: group_thousands(xp),
        rank: user
            .rank_title
            .clone()
            .unwrap_or_else(|| fallback_rank.to_string()),
        rank_icon,
        level: (xp / XP_PER_LEVEL + 1).max(1),
        xp_in_level,
        level_progress: ((xp_in_level as f64 / XP_PER_LEVEL as f64) * 100.0).round() as u32,
    })
}

// ── Burnout ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GaugeView {
    pub value: String,
    /// Fill of the gauge arc, 0.0..=100.0.
    pub percent: f64,
    pub color: &'static str,
    pub label: &'static str,
}

pub fn burnout_gauge(score: f64, lang: &str) -> GaugeView {
    let pct = score.clamp(0.0, 100.0);
    let (color, tier) = if pct < 30.0 {
        ("#22c55e", 0)
    } else if pct < 60.0 {
        ("#f59e0b", 1)
    } else {
        ("#ef4444", 2)
    };
    let labels = match lang {
        "en" => ["🟢 Great", "🟡 Moderate", "🔴 Burnout"],
        "kz" => ["🟢 Жақсы", "🟡 Орташа", "🔴 Жану"],
        _ => ["🟢 Отлично", "🟡 Умеренно", "🔴 Выгорание"],
    };
    GaugeView {
        value: format!("{}", pct.round() as i64),
        percent: pct,
        color,
        label: labels[tier],
    }
}

// ── Kanban ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum DueBadge {
    Overdue { days: i64 },
    Today,
    Soon { days: i64 },
    Ok { date: NaiveDate },
}

impl DueBadge {
    pub fn css_class(&self) -> &'static str {
        match self {
            DueBadge::Overdue { .. } => "due-overdue",
            DueBadge::Today => "due-today",
            DueBadge::Soon { .. } => "due-soon",
            DueBadge::Ok { .. } => "due-ok",
        }
    }

    pub fn label(&self) -> String {
        match self {
            DueBadge::Overdue { days } => format!("🔴 Overdue ({days}d)"),
            DueBadge::Today => "🟡 Today".to_string(),
            DueBadge::Soon { days } => format!("⏳ In {days}d"),
            DueBadge::Ok { date } => format!("📅 {}", date.format("%-d %b")),
        }
    }
}

/// Badge for a `YYYY-MM-DD[...]` due date relative to `today`.
pub fn due_badge(due_date: &str, today: NaiveDate) -> Option<DueBadge> {
    let day = NaiveDate::parse_from_str(due_date.get(..10)?, "%Y-%m-%d").ok()?;
    let diff = (day - today).num_days();
    Some(match diff {
        d if d < 0 => DueBadge::Overdue { days: -d },
        0 => DueBadge::Today,
        d if d <= 2 => DueBadge::Soon { days: d },
        _ => DueBadge::Ok { date: day },
    })
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CardView {
    pub id: i64,
    pub title: String,
    pub priority: Priority,
    pub assignee: Option<String>,
    pub due: Option<DueBadge>,
    pub color: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ColumnView {
    pub status: TaskStatus,
    pub count: usize,
    pub cards: Vec<CardView>,
}

fn card(task: &KanbanTask, today: NaiveDate) -> CardView {
    CardView {
        id: task.id,
        title: task.title.clone(),
        priority: task.priority,
        assignee: task.assignee_name.clone(),
        due: task.due_date.as_deref().and_then(|d| due_badge(d, today)),
        color: task.color.clone(),
    }
}

/// The five columns in board order; `count` always equals `cards.len()`.
pub fn kanban_columns(board: &KanbanBoard, today: NaiveDate) -> Vec<ColumnView> {
    TaskStatus::ALL
        .into_iter()
        .map(|status| {
            let cards: Vec<CardView> = board.column(status).iter().map(|t| card(t, today)).collect();
            ColumnView {
                status,
                count: cards.len(),
                cards,
            }
        })
        .collect()
}

/// Banner above the board while the change feed is down.
pub fn kanban_banner(state: KanbanState) -> Option<&'static str> {
    match state {
        KanbanState::Waiting => Some("Live updates lost, reconnecting…"),
        KanbanState::GaveUp => Some("Live updates disconnected. Reload the board to retry."),
        KanbanState::Idle | KanbanState::Connecting | KanbanState::Open => None,
    }
}

// ── Chat ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatLine {
    pub sender: String,
    pub css_class: String,
    pub html: String,
    pub reactions: Vec<(String, u32)>,
}

pub fn chat_line(message: &ChatMessage) -> ChatLine {
    let mut css_class = match message.sender_type {
        SenderType::Human => "chat-msg msg-human",
        SenderType::Agent => "chat-msg msg-agent",
        SenderType::System => "chat-msg msg-system",
    }
    .to_string();
    if message.is_pinned {
        css_class.push_str(" msg-pinned");
    }
    // Agents answer in markdown; people and the server do not.
    let html = match message.sender_type {
        SenderType::Agent => render_markdown(&message.content),
        SenderType::Human | SenderType::System => escape_html(&message.content),
    };
    ChatLine {
        sender: message.sender.clone(),
        css_class,
        html,
        reactions: message
            .reactions
            .iter()
            .filter(|(_, n)| **n > 0)
            .map(|(e, n)| (e.clone(), *n))
            .collect(),
    }
}

// ── Dashboard ───────────────────────────────────────────────────────────────

/// Everything the dashboard fetches in one refresh. Failed fetches arrive
/// here as empty lists.
#[derive(Clone, Debug, Default)]
pub struct DashboardData {
    pub members: Vec<Member>,
    pub tasks: Vec<KanbanTask>,
    pub messages: Vec<ChatMessage>,
    pub online: Vec<OnlineUser>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardView {
    pub members: usize,
    pub online_in_team: usize,
    pub tasks_done: usize,
    /// One decimal; `None` without members.
    pub burnout_avg: Option<String>,
    /// Per column: count and share of all tasks in percent.
    pub breakdown: Vec<(TaskStatus, usize, u32)>,
    /// Newest first, at most eight.
    pub recent: Vec<(String, String)>,
}

pub fn dashboard(data: &DashboardData) -> DashboardView {
    let online_in_team = data
        .online
        .iter()
        .filter(|u| data.members.iter().any(|m| m.name == u.username))
        .count();
    let board = KanbanBoard::from_tasks(data.tasks.clone());
    let total = board.total();
    let breakdown = board
        .counts()
        .into_iter()
        .map(|(status, n)| {
            let pct = if total == 0 { 0 } else { (n as f64 / total as f64 * 100.0).round() as u32 };
            (status, n, pct)
        })
        .collect();
    let burnout_avg = (!data.members.is_empty()).then(|| {
        let sum: f64 = data.members.iter().map(|m| m.burnout_score.unwrap_or(0.0)).sum();
        format!("{:.1}", sum / data.members.len() as f64)
    });
    DashboardView {
        members: data.members.len(),
        online_in_team,
        tasks_done: board.column(TaskStatus::Done).len(),
        burnout_avg,
        breakdown,
        recent: data
            .messages
            .iter()
            .rev()
            .take(8)
            .map(|m| (m.sender.clone(), m.content.chars().take(100).collect()))
            .collect(),
    }
}

// ── Small widgets ───────────────────────────────────────────────────────────

/// Unread counter on the bell; hidden at zero.
pub fn notification_badge(unread: usize) -> Option<String> {
    match unread {
        0 => None,
        1..=9 => Some(unread.to_string()),
        _ => Some("9+".to_string()),
    }
}

/// Days, hours, minutes and seconds, each zero-padded to two digits.
pub fn countdown_display(remaining: &Remaining) -> [String; 4] {
    [remaining.days, remaining.hours, remaining.minutes, remaining.seconds].map(|v| format!("{v:02}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn gauge_burnout_tier() {
        let gauge = burnout_gauge(75.0, "en");
        assert_eq!(gauge.value, "75");
        assert_eq!(gauge.color, "#ef4444");
        assert_eq!(gauge.label, "🔴 Burnout");

        assert_eq!(burnout_gauge(140.0, "en").value, "100");
        assert_eq!(burnout_gauge(29.6, "en").color, "#22c55e");
        assert_eq!(burnout_gauge(45.0, "xx").label, "🟡 Умеренно");
    }

    #[test]
    fn sidebar_shows_xp() {
        let user = User {
            username: "alice".into(),
            xp: 150,
            ..User::default()
        };
        let view = sidebar(Some(&user)).unwrap();
        assert_eq!(view.xp, "150");
        assert_eq!(view.avatar, 'A');
        assert_eq!(view.level, 1);
        assert_eq!(view.level_progress, 75);
        assert_eq!(view.rank, "Novice");
        assert!(sidebar(None).is_none());
    }

    #[test]
    fn thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1250), "1,250");
        assert_eq!(group_thousands(-1234567), "-1,234,567");
    }

    #[test]
    fn due_badges() {
        let today = date("2026-03-10");
        assert_eq!(due_badge("2026-03-07", today), Some(DueBadge::Overdue { days: 3 }));
        assert_eq!(due_badge("2026-03-10T18:00:00", today), Some(DueBadge::Today));
        assert_eq!(due_badge("2026-03-12", today), Some(DueBadge::Soon { days: 2 }));
        assert_eq!(
            due_badge("2026-03-20", today),
            Some(DueBadge::Ok { date: date("2026-03-20") })
        );
        assert_eq!(due_badge("soon", today), None);
    }

    #[test]
    fn badge_caps_at_nine() {
        assert_eq!(notification_badge(0), None);
        assert_eq!(notification_badge(4).as_deref(), Some("4"));
        assert_eq!(notification_badge(12).as_deref(), Some("9+"));
    }

    #[test]
    fn countdown_padding() {
        let r = Remaining {
            days: 1,
            hours: 2,
            minutes: 30,
            seconds: 5,
            urgent: false,
        };
        assert_eq!(countdown_display(&r), ["01", "02", "30", "05"]);
    }

    #[test]
    fn chat_lines_escape_people() {
        let mut msg = ChatMessage::local(1, "bob", "<b>hi</b>");
        msg.is_pinned = true;
        let line = chat_line(&msg);
        assert_eq!(line.html, "&lt;b&gt;hi&lt;/b&gt;");
        assert_eq!(line.css_class, "chat-msg msg-human msg-pinned");
    }

    #[test]
    fn dashboard_summary() {
        let data: DashboardData = DashboardData {
            members: serde_json::from_value(serde_json::json!([
                {"id": 1, "name": "alice", "burnout_score": 40.0},
                {"id": 2, "name": "bob"}
            ]))
            .unwrap(),
            tasks: serde_json::from_value(serde_json::json!([
                {"id": 1, "title": "a", "status": "done"},
                {"id": 2, "title": "b", "status": "todo"},
                {"id": 3, "title": "c", "status": "todo"},
                {"id": 4, "title": "d", "status": "done"}
            ]))
            .unwrap(),
            messages: Vec::new(),
            online: serde_json::from_value(serde_json::json!([
                {"id": 7, "username": "alice"},
                {"id": 8, "username": "carol"}
            ]))
            .unwrap(),
        };
        let view = dashboard(&data);
        assert_eq!(view.online_in_team, 1);
        assert_eq!(view.tasks_done, 2);
        assert_eq!(view.burnout_avg.as_deref(), Some("20.0"));
        assert_eq!(view.breakdown[1], (TaskStatus::Todo, 2, 50));
        assert!(view.recent.is_empty());
    }

    #[test]
    fn columns_match_counts() {
        let board = KanbanBoard::from_tasks(
            serde_json::from_value(serde_json::json!([
                {"id": 1, "title": "a", "status": "review", "due_date": "2026-03-11"},
                {"id": 2, "title": "b", "status": "backlog"}
            ]))
            .unwrap(),
        );
        let cols = kanban_columns(&board, date("2026-03-10"));
        assert_eq!(cols.len(), 5);
        for col in &cols {
            assert_eq!(col.count, col.cards.len());
        }
        assert_eq!(cols[3].cards[0].due, Some(DueBadge::Soon { days: 1 }));
        assert_eq!(kanban_banner(KanbanState::Open), None);
        assert!(kanban_banner(KanbanState::GaveUp).is_some());
    }
}
