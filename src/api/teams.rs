use serde_json::{json, Value};

use super::models::{JoinByCode, Member, NewMember, Team};
use super::{ApiRequest, HttpClient};
use crate::error::Result;

// Two team surfaces exist on the backend: the original hackathon one
// (`/api/hackathon/teams*`) and the account-bound one (`/api/teams*`).

impl HttpClient {
    pub async fn teams(&self) -> Result<Vec<Team>> {
        self.send(ApiRequest::get("/api/hackathon/teams")).await
    }

    pub async fn team(&self, team_id: i64) -> Result<Team> {
        self.send(ApiRequest::get(format!("/api/hackathon/teams/{team_id}")))
            .await
    }

    pub async fn create_team(&self, name: &str, theme: &str) -> Result<Team> {
        self.send(
            ApiRequest::post("/api/hackathon/teams")
                .json(&json!({ "name": name, "hackathon_theme": theme })),
        )
        .await
    }

    pub async fn team_members(&self, team_id: i64) -> Result<Vec<Member>> {
        self.send(ApiRequest::get(format!("/api/hackathon/teams/{team_id}/members")))
            .await
    }

    pub async fn add_member(&self, member: &NewMember) -> Result<Member> {
        self.send(ApiRequest::post("/api/hackathon/members").json(member))
            .await
    }

    pub async fn team_by_code(&self, code: &str) -> Result<Team> {
        self.send(ApiRequest::get(format!("/api/hackathon/teams/by-code/{code}")))
            .await
    }

    pub async fn join_team_by_code(&self, join: &JoinByCode) -> Result<Value> {
        self.call(
            ApiRequest::post("/api/hackathon/teams/join-by-code")
                .query("code", &join.code)
                .query("name", &join.name)
                .query("experience_level", &join.experience_level)
                .query("language", &join.language)
                .query_all("skills", &join.skills),
        )
        .await
    }

    pub async fn regenerate_invite_code(&self, team_id: i64) -> Result<Team> {
        self.send(ApiRequest::post(format!(
            "/api/hackathon/teams/{team_id}/regenerate-code"
        )))
        .await
    }

    // ── account-bound teams ─────────────────────────────────────────────

    pub async fn my_team(&self) -> Result<Value> {
        self.call(ApiRequest::get("/api/teams/my-team")).await
    }

    pub async fn my_invitations(&self) -> Result<Value> {
        self.call(ApiRequest::get("/api/teams/my-invitations")).await
    }

    pub async fn request_to_join(&self, team_id: i64, message: &str) -> Result<Value> {
        self.call(
            ApiRequest::post(format!("/api/teams/{team_id}/join-request"))
                .json(&json!({ "message": message })),
        )
        .await
    }

    pub async fn join_requests(&self, team_id: i64) -> Result<Value> {
        self.call(ApiRequest::get(format!("/api/teams/{team_id}/join-requests")))
            .await
    }

    pub async fn respond_join_request(&self, request_id: i64, accept: bool) -> Result<Value> {
        self.call(
            ApiRequest::post(format!("/api/teams/join-requests/{request_id}/respond"))
                .json(&json!({ "accept": accept })),
        )
        .await
    }

    pub async fn invite_user(&self, team_id: i64, username: &str) -> Result<Value> {
        self.call(
            ApiRequest::post(format!("/api/teams/{team_id}/invite"))
                .json(&json!({ "username": username })),
        )
        .await
    }

    pub async fn respond_invitation(&self, invitation_id: i64, accept: bool) -> Result<Value> {
        self.call(
            ApiRequest::post(format!("/api/teams/invitations/{invitation_id}/respond"))
                .json(&json!({ "accept": accept })),
        )
        .await
    }

    pub async fn update_team_settings(&self, team_id: i64, settings: &Value) -> Result<Value> {
        self.call(ApiRequest::put(format!("/api/teams/{team_id}/settings")).json(settings))
            .await
    }

    pub async fn kick_member(&self, team_id: i64, user_id: i64) -> Result<Value> {
        self.call(ApiRequest::delete(format!(
            "/api/teams/{team_id}/members/{user_id}"
        )))
        .await
    }

    pub async fn leave_team(&self, team_id: i64) -> Result<Value> {
        self.call(ApiRequest::post(format!("/api/teams/{team_id}/leave")))
            .await
    }

    pub async fn transfer_leadership(&self, team_id: i64, user_id: i64) -> Result<Value> {
        self.call(ApiRequest::post(format!(
            "/api/teams/{team_id}/transfer-leadership/{user_id}"
        )))
        .await
    }
}
