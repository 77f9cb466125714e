use super::models::{AuthResponse, OnlineUser, ProfileUpdate, RegisterRequest, User, XpAward};
use super::{ApiRequest, HttpClient};
use crate::error::Result;

/// Filters for the teammate search page.
#[derive(Clone, Debug, Default)]
pub struct UserSearch {
    pub query: Option<String>,
    pub skills: Option<String>,
    pub role: Option<String>,
    pub looking_for_team: Option<bool>,
}

impl HttpClient {
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        self.send(ApiRequest::post("/api/auth/register").json(request).anonymous())
            .await
    }

    /// OAuth2 password flow: the backend expects a form body here.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse> {
        self.send(
            ApiRequest::post("/api/auth/login")
                .form(&[("username", username), ("password", password)])
                .anonymous(),
        )
        .await
    }

    pub async fn guest_login(&self) -> Result<AuthResponse> {
        self.send(ApiRequest::post("/api/auth/guest").anonymous()).await
    }

    pub async fn me(&self) -> Result<User> {
        self.send(ApiRequest::get("/api/auth/me")).await
    }

    pub async fn update_me(&self, update: &ProfileUpdate) -> Result<User> {
        self.send(ApiRequest::put("/api/auth/me").json(update)).await
    }

    pub async fn heartbeat(&self) -> Result<()> {
        self.execute(ApiRequest::post("/api/auth/heartbeat")).await
    }

    pub async fn online_users(&self) -> Result<Vec<OnlineUser>> {
        self.send(ApiRequest::get("/api/auth/users/online")).await
    }

    pub async fn award_xp(&self, amount: i64, reason: &str) -> Result<XpAward> {
        self.send(
            ApiRequest::post("/api/auth/award-xp")
                .json(&serde_json::json!({ "amount": amount, "reason": reason })),
        )
        .await
    }

    pub async fn search_users(&self, search: &UserSearch) -> Result<Vec<User>> {
        self.send(
            ApiRequest::get("/api/auth/users/search")
                .query_opt("q", search.query.as_deref())
                .query_opt("skills", search.skills.as_deref())
                .query_opt("role", search.role.as_deref())
                .query_opt("looking", search.looking_for_team),
        )
        .await
    }

    pub async fn leaderboard(&self, limit: u32) -> Result<Vec<User>> {
        self.send(ApiRequest::get("/api/auth/leaderboard").query("limit", limit))
            .await
    }
}
