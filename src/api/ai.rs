//! AI-backed feature endpoints. Most answer the common [`AiResponse`]
//! envelope; the catalog and daily challenge answer free-form JSON.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use super::models::{AiResponse, BurnoutQuestion, PersonalChatEntry};
use super::{ApiRequest, HttpClient};
use crate::error::Result;

/// A single burnout answer as collected from the questionnaire.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Number(f64),
    Bool(bool),
    Choice(String),
}

#[derive(Clone, Debug, Serialize)]
pub struct CodeRequest<'a> {
    pub code: &'a str,
    pub language: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdin: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui_language: Option<&'a str>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RunResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub stderr: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CodeAssist {
    #[serde(default)]
    pub result: String,
}

impl HttpClient {
    // ── teacher ─────────────────────────────────────────────────────────

    pub async fn topics(&self, language: &str) -> Result<Value> {
        self.call(ApiRequest::get("/api/teacher/topics").query("language", language))
            .await
    }

    pub async fn explain_topic(&self, topic: &str, level: &str, language: &str) -> Result<AiResponse> {
        self.send(ApiRequest::post("/api/teacher/explain").json(&json!({
            "topic": topic,
            "level": level,
            "language": language,
        })))
        .await
    }

    pub async fn generate_quiz(&self, topic: &str, level: &str, language: &str, count: u32) -> Result<AiResponse> {
        self.send(
            ApiRequest::post("/api/teacher/quiz")
                .query("topic", topic)
                .query("level", level)
                .query("language", language)
                .query("num_questions", count),
        )
        .await
    }

    pub async fn debug_help(&self, code: &str, error: &str, language: &str) -> Result<AiResponse> {
        self.send(
            ApiRequest::post("/api/teacher/debug-helper")
                .query("code", code)
                .query("error", error)
                .query("language", language),
        )
        .await
    }

    pub async fn learning_roadmap(&self, goal: &str, skills: &[String], hours: u32, language: &str) -> Result<AiResponse> {
        self.send(
            ApiRequest::post("/api/teacher/roadmap")
                .query("goal", goal)
                .query("available_hours", hours)
                .query("language", language)
                .query_all("current_skills", skills),
        )
        .await
    }

    // ── team analysis & insights ────────────────────────────────────────

    pub async fn analyze_team(&self, team_id: i64, language: &str) -> Result<AiResponse> {
        self.send(
            ApiRequest::post("/api/hackathon/analyze-team")
                .query("team_id", team_id)
                .query("language", language),
        )
        .await
    }

    pub async fn assign_tasks(&self, team_id: i64, description: &str, language: &str) -> Result<AiResponse> {
        self.send(
            ApiRequest::post("/api/hackathon/assign-tasks")
                .query("team_id", team_id)
                .query("project_description", description)
                .query("language", language),
        )
        .await
    }

    pub async fn agent_discussion(&self, topic: &str, language: &str) -> Result<AiResponse> {
        self.send(
            ApiRequest::post("/api/hackathon/agent-discussion")
                .query("topic", topic)
                .query("language", language),
        )
        .await
    }

    pub async fn quick_feedback(&self, situation: &str, language: &str) -> Result<AiResponse> {
        self.send(
            ApiRequest::post("/api/hackathon/quick-feedback")
                .query("situation", situation)
                .query("language", language),
        )
        .await
    }

    pub async fn predict_failure(&self, team_id: i64, language: &str) -> Result<AiResponse> {
        self.send(
            ApiRequest::post("/api/insights/predict-failure")
                .query("team_id", team_id)
                .query("language", language),
        )
        .await
    }

    pub async fn skill_match(&self, request: &Value) -> Result<AiResponse> {
        self.send(ApiRequest::post("/api/insights/skill-match").json(request))
            .await
    }

    pub async fn post_hackathon_report(&self, team_id: i64, summary: &str, language: &str) -> Result<AiResponse> {
        self.send(
            ApiRequest::post("/api/insights/post-hackathon-report")
                .query("team_id", team_id)
                .query("project_summary", summary)
                .query("language", language),
        )
        .await
    }

    // ── burnout ─────────────────────────────────────────────────────────

    pub async fn burnout_questions(&self, language: &str) -> Result<Vec<BurnoutQuestion>> {
        self.send(ApiRequest::get("/api/burnout/questions").query("language", language))
            .await
    }

    pub async fn check_burnout(
        &self,
        member_id: i64,
        answers: &BTreeMap<String, AnswerValue>,
        language: &str,
    ) -> Result<AiResponse> {
        self.send(ApiRequest::post("/api/burnout/check").json(&json!({
            "member_id": member_id,
            "answers": answers,
            "language": language,
        })))
        .await
    }

    pub async fn optimize_schedule(
        &self,
        member_id: i64,
        remaining_hours: f64,
        tasks: &[String],
        language: &str,
    ) -> Result<AiResponse> {
        self.send(
            ApiRequest::post("/api/burnout/schedule-optimizer")
                .query("member_id", member_id)
                .query("remaining_hours", remaining_hours)
                .query("language", language)
                .query_all("tasks", tasks),
        )
        .await
    }

    // ── tools ───────────────────────────────────────────────────────────

    pub async fn generate_ideas(&self, request: &Value) -> Result<AiResponse> {
        self.send(ApiRequest::post("/api/tools/generate-ideas").json(request))
            .await
    }

    pub async fn validate_idea(&self, idea: &str, team_skills: &str, language: &str) -> Result<AiResponse> {
        self.send(
            ApiRequest::post("/api/tools/validate-idea")
                .query("idea", idea)
                .query("team_skills", team_skills)
                .query("language", language),
        )
        .await
    }

    pub async fn code_review(&self, request: &Value) -> Result<AiResponse> {
        self.send(ApiRequest::post("/api/tools/code-review").json(request))
            .await
    }

    pub async fn build_pitch(&self, request: &Value) -> Result<AiResponse> {
        self.send(ApiRequest::post("/api/tools/build-pitch").json(request))
            .await
    }

    pub async fn analyze_progress(
        &self,
        completed: u32,
        total: u32,
        remaining_hours: f64,
        blockers: &str,
        language: &str,
    ) -> Result<AiResponse> {
        self.send(
            ApiRequest::post("/api/tools/analyze-progress")
                .query("completed_tasks", completed)
                .query("total_tasks", total)
                .query("remaining_hours", remaining_hours)
                .query("blockers", blockers)
                .query("language", language),
        )
        .await
    }

    // ── hackathon catalog ───────────────────────────────────────────────

    pub async fn catalog_list(&self, category: Option<&str>, tag: Option<&str>) -> Result<Value> {
        self.call(
            ApiRequest::get("/api/catalog/list")
                .query_opt("category", category)
                .query_opt("tag", tag),
        )
        .await
    }

    pub async fn catalog_search(&self, request: &Value) -> Result<Value> {
        self.call(ApiRequest::post("/api/catalog/search").json(request))
            .await
    }

    pub async fn catalog_match(&self, request: &Value) -> Result<Value> {
        self.call(ApiRequest::post("/api/catalog/match").json(request))
            .await
    }

    pub async fn catalog_ideas(&self, request: &Value) -> Result<Value> {
        self.call(ApiRequest::post("/api/catalog/ideas").json(request))
            .await
    }

    // ── personal chat (non-streaming) ───────────────────────────────────

    pub async fn personal_chat(&self, message: &str, user_id: Option<i64>, language: &str, mode: &str) -> Result<AiResponse> {
        self.send(ApiRequest::post("/api/personal-chat/message").json(&json!({
            "message": message,
            "user_id": user_id,
            "language": language,
            "mode": mode,
        })))
        .await
    }

    pub async fn personal_history(&self, user_id: i64) -> Result<Vec<PersonalChatEntry>> {
        self.send(ApiRequest::get(format!("/api/personal-chat/history/{user_id}")))
            .await
    }

    pub async fn clear_personal_history(&self, user_id: i64) -> Result<()> {
        self.execute(ApiRequest::delete(format!("/api/personal-chat/history/{user_id}")))
            .await
    }

    // ── daily challenge ─────────────────────────────────────────────────

    pub async fn daily_challenge(&self) -> Result<Value> {
        self.call(ApiRequest::get("/api/daily/challenge")).await
    }

    pub async fn complete_challenge(&self) -> Result<Value> {
        self.call(ApiRequest::post("/api/daily/challenge/complete"))
            .await
    }

    pub async fn challenge_history(&self) -> Result<Value> {
        self.call(ApiRequest::get("/api/daily/challenge/history"))
            .await
    }

    // ── codespace ───────────────────────────────────────────────────────

    pub async fn run_code(&self, request: &CodeRequest<'_>) -> Result<RunResult> {
        self.send(ApiRequest::post("/api/codespace/run").json(request))
            .await
    }

    pub async fn complete_code(&self, request: &CodeRequest<'_>) -> Result<CodeAssist> {
        self.send(ApiRequest::post("/api/codespace/complete").json(request))
            .await
    }

    pub async fn explain_code(&self, request: &CodeRequest<'_>) -> Result<CodeAssist> {
        self.send(ApiRequest::post("/api/codespace/explain").json(request))
            .await
    }

    pub async fn fix_code(&self, request: &CodeRequest<'_>) -> Result<CodeAssist> {
        self.send(ApiRequest::post("/api/codespace/fix").json(request))
            .await
    }
}
