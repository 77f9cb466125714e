use serde_json::json;

use super::models::{
    AiResponse, Channel, ChatMessage, OutgoingMessage, PinState, PinnedMessage, ReactionSummary,
};
use super::{ApiRequest, HttpClient};
use crate::error::Result;

impl HttpClient {
    /// Team history, oldest first.
    pub async fn chat_messages(&self, team_id: i64) -> Result<Vec<ChatMessage>> {
        self.send(ApiRequest::get(format!("/api/chat/messages/{team_id}")))
            .await
    }

    pub async fn post_chat_message(&self, message: &OutgoingMessage) -> Result<ChatMessage> {
        self.send(ApiRequest::post("/api/chat/messages").json(message))
            .await
    }

    pub async fn ai_chat_message(&self, team_id: i64, message: &str, language: &str) -> Result<AiResponse> {
        self.send(
            ApiRequest::post("/api/chat/ai-message")
                .query("team_id", team_id)
                .query("message", message)
                .query("language", language),
        )
        .await
    }

    pub async fn react_to_message(&self, message_id: i64, emoji: &str, username: &str) -> Result<ReactionSummary> {
        self.send(
            ApiRequest::post(format!("/api/chat/messages/{message_id}/react"))
                .json(&json!({ "emoji": emoji, "username": username })),
        )
        .await
    }

    pub async fn toggle_pin(&self, message_id: i64) -> Result<PinState> {
        self.send(ApiRequest::patch(format!("/api/chat/messages/{message_id}/pin")))
            .await
    }

    pub async fn pinned_messages(&self, team_id: i64) -> Result<Vec<PinnedMessage>> {
        self.send(ApiRequest::get(format!("/api/chat/messages/{team_id}/pinned")))
            .await
    }

    // ── channels ────────────────────────────────────────────────────────

    pub async fn channels(&self, team_id: i64) -> Result<Vec<Channel>> {
        self.send(ApiRequest::get(format!("/api/channels/team/{team_id}")))
            .await
    }

    pub async fn create_channel(&self, team_id: i64, name: &str) -> Result<Channel> {
        self.send(
            ApiRequest::post("/api/channels").json(&json!({ "team_id": team_id, "name": name })),
        )
        .await
    }

    pub async fn delete_channel(&self, channel_id: i64) -> Result<()> {
        self.execute(ApiRequest::delete(format!("/api/channels/{channel_id}")))
            .await
    }

    pub async fn toggle_channel_ai(&self, channel_id: i64) -> Result<Channel> {
        self.send(ApiRequest::patch(format!("/api/channels/{channel_id}/toggle-ai")))
            .await
    }

    pub async fn channel_messages(&self, channel_id: i64, limit: u32) -> Result<Vec<ChatMessage>> {
        self.send(
            ApiRequest::get(format!("/api/channels/{channel_id}/messages")).query("limit", limit),
        )
        .await
    }

    pub async fn send_channel_message(&self, channel_id: i64, sender: &str, content: &str) -> Result<ChatMessage> {
        self.send(
            ApiRequest::post(format!("/api/channels/{channel_id}/messages"))
                .json(&json!({ "sender": sender, "content": content })),
        )
        .await
    }

    pub async fn channel_ai_reply(&self, channel_id: i64, message: &str, language: &str) -> Result<AiResponse> {
        self.send(
            ApiRequest::post(format!("/api/channels/{channel_id}/ai-reply"))
                .query("message", message)
                .query("language", language),
        )
        .await
    }

    pub async fn channel_summary(&self, channel_id: i64, language: &str) -> Result<AiResponse> {
        self.send(
            ApiRequest::post(format!("/api/channels/{channel_id}/ai-summary"))
                .query("language", language),
        )
        .await
    }
}
