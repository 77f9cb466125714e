use serde_json::Value;

use super::models::{KanbanTask, TaskDraft, TaskStatus};
use super::{ApiRequest, HttpClient};
use crate::error::Result;

/// Whose tasks to list: a team board, or a user's personal board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskScope {
    Team(i64),
    User(i64),
    All,
}

impl TaskScope {
    /// Realtime room carrying change notifications for this board.
    pub fn room(self) -> Option<String> {
        match self {
            TaskScope::Team(id) => Some(format!("team_{id}")),
            TaskScope::User(id) => Some(format!("user_{id}")),
            TaskScope::All => None,
        }
    }
}

impl HttpClient {
    pub async fn kanban_tasks(&self, scope: TaskScope) -> Result<Vec<KanbanTask>> {
        let request = match scope {
            TaskScope::Team(id) => ApiRequest::get("/api/kanban/tasks").query("team_id", id),
            TaskScope::User(id) => ApiRequest::get("/api/kanban/tasks").query("user_id", id),
            TaskScope::All => ApiRequest::get("/api/kanban/tasks"),
        };
        self.send(request).await
    }

    pub async fn create_task(&self, draft: &TaskDraft) -> Result<KanbanTask> {
        self.send(ApiRequest::post("/api/kanban/tasks").json(draft))
            .await
    }

    pub async fn move_task(&self, task_id: i64, status: TaskStatus) -> Result<Value> {
        self.call(
            ApiRequest::patch(format!("/api/kanban/tasks/{task_id}/status"))
                .query("status", status),
        )
        .await
    }

    pub async fn update_task(&self, task_id: i64, draft: &TaskDraft) -> Result<Value> {
        self.call(ApiRequest::patch(format!("/api/kanban/tasks/{task_id}")).json(draft))
            .await
    }

    pub async fn delete_task(&self, task_id: i64) -> Result<()> {
        self.execute(ApiRequest::delete(format!("/api/kanban/tasks/{task_id}")))
            .await
    }
}
