//! Request and response shapes of the backend API.
//!
//! Everything is parsed here, at the HTTP boundary; feature code only sees
//! these types. Optional backend fields default instead of failing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ── Auth ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub xp: i64,
    #[serde(default = "first_level")]
    pub level: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank_title: Option<String>,
    #[serde(default)]
    pub is_looking_for_team: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
}

fn first_level() -> i64 {
    1
}

#[derive(Clone, Debug, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub user: User,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub is_looking_for_team: bool,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_looking_for_team: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct OnlineUser {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub last_active: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct XpAward {
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub rank_title: Option<String>,
    #[serde(default)]
    pub leveled_up: bool,
}

// ── Teams ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub hackathon_theme: Option<String>,
    #[serde(default)]
    pub invite_code: Option<String>,
    #[serde(default)]
    pub members: Vec<Member>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Member {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub team_id: Option<i64>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience_level: Option<String>,
    #[serde(default)]
    pub burnout_score: Option<f64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct NewMember {
    pub name: String,
    pub team_id: i64,
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub experience_level: String,
    pub language: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct JoinByCode {
    pub code: String,
    pub name: String,
    pub skills: Vec<String>,
    pub experience_level: String,
    pub language: String,
}

// ── Chat ────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderType {
    #[default]
    Human,
    Agent,
    System,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub team_id: Option<i64>,
    #[serde(default = "system_sender")]
    pub sender: String,
    #[serde(default)]
    pub sender_type: SenderType,
    pub content: String,
    #[serde(default)]
    pub is_pinned: bool,
    /// emoji → count
    #[serde(default)]
    pub reactions: BTreeMap<String, u32>,
    #[serde(default)]
    pub created_at: Option<String>,
}

fn system_sender() -> String {
    "System".to_string()
}

impl ChatMessage {
    /// A locally authored message that has not been echoed by the server.
    pub fn local(team_id: i64, sender: &str, content: &str) -> Self {
        Self {
            id: None,
            team_id: Some(team_id),
            sender: sender.to_string(),
            sender_type: SenderType::Human,
            content: content.to_string(),
            is_pinned: false,
            reactions: BTreeMap::new(),
            created_at: Some(chrono::Utc::now().to_rfc3339()),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct OutgoingMessage {
    pub team_id: i64,
    pub sender: String,
    pub content: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ReactionSummary {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub reactions: BTreeMap<String, u32>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PinState {
    pub pinned: bool,
    pub message_id: i64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PinnedMessage {
    pub id: i64,
    pub sender: String,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Channel {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub team_id: Option<i64>,
    #[serde(default)]
    pub ai_enabled: bool,
}

// ── Kanban ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Backlog,
    Todo,
    Doing,
    Review,
    Done,
}

impl TaskStatus {
    /// Board column order.
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Backlog,
        TaskStatus::Todo,
        TaskStatus::Doing,
        TaskStatus::Review,
        TaskStatus::Done,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Backlog => "backlog",
            TaskStatus::Todo => "todo",
            TaskStatus::Doing => "doing",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KanbanTask {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub assignee_name: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub team_id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct TaskDraft {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

// ── AI ──────────────────────────────────────────────────────────────────────

/// Common envelope of every AI-backed endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct AiResponse {
    #[serde(default = "succeeded")]
    pub success: bool,
    pub content: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

fn succeeded() -> bool {
    true
}

impl AiResponse {
    pub fn metadata_f64(&self, key: &str) -> Option<f64> {
        self.metadata.as_ref()?.get(key)?.as_f64()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Scale,
    Number,
    Bool,
    Choice,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BurnoutQuestion {
    pub id: String,
    pub q: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PersonalChatEntry {
    pub role: String,
    pub content: String,
}

// ── Media ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Deserialize)]
pub struct MoodImage {
    pub data: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Moodboard {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub images: Vec<MoodImage>,
    #[serde(default)]
    pub color_palette: Vec<String>,
    #[serde(default)]
    pub mood_description: Option<String>,
    #[serde(default)]
    pub style_tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chat_frame_without_optional_fields() {
        let msg: ChatMessage =
            serde_json::from_value(json!({"type": "system", "content": "alice joined"})).unwrap();
        assert_eq!(msg.sender, "System");
        assert_eq!(msg.sender_type, SenderType::Human);
        assert!(msg.id.is_none());
    }

    #[test]
    fn task_defaults() {
        let task: KanbanTask = serde_json::from_value(json!({"id": 1, "title": "Pitch"})).unwrap();
        assert_eq!(task.status, TaskStatus::Backlog);
        assert_eq!(task.priority, Priority::Medium);
    }

    #[test]
    fn burnout_metadata() {
        let res: AiResponse = serde_json::from_value(json!({
            "success": true,
            "content": "Take a break",
            "metadata": {"burnout_score": 75}
        }))
        .unwrap();
        assert_eq!(res.metadata_f64("burnout_score"), Some(75.0));
        assert_eq!(res.metadata_f64("missing"), None);
    }

    #[test]
    fn question_kind_from_type_field() {
        let q: BurnoutQuestion = serde_json::from_value(json!({
            "id": "mood", "q": "Mood?", "type": "choice", "options": ["good", "bad"]
        }))
        .unwrap();
        assert_eq!(q.kind, QuestionKind::Choice);
        assert_eq!(q.options.len(), 2);
    }
}
