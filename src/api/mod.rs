//! Single request path to the backend.
//!
//! Attaches the bearer token when one is stored, serializes the body, and
//! turns non-2xx answers into [`ClientError::Api`] carrying the backend's
//! `detail`. One attempt per call: no retries, no timeout.

pub mod ai;
pub mod auth;
pub mod chat;
pub mod kanban;
pub mod media;
pub mod models;
pub mod teams;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::error::{ClientError, Result};
use crate::session;
use crate::store::LocalStore;

pub enum Body {
    Empty,
    Json(Value),
    /// `application/x-www-form-urlencoded`
    Form(Vec<(String, String)>),
    /// Passed through untouched; reqwest sets the boundary header.
    Multipart(reqwest::multipart::Form),
}

/// One backend call: method, origin-relative path, query pairs and body.
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: std::result::Result<Body, serde_json::Error>,
    anonymous: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: Ok(Body::Empty),
            anonymous: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Send without the stored token. A 401 then carries the backend's
    /// message and leaves the session alone.
    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn query_opt(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    /// Repeats `key` once per value (`skills=a&skills=b`).
    pub fn query_all<S: ToString>(mut self, key: &str, values: impl IntoIterator<Item = S>) -> Self {
        for value in values {
            self.query.push((key.to_string(), value.to_string()));
        }
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        self.body = serde_json::to_value(body).map(Body::Json);
        self
    }

    pub fn form(mut self, pairs: &[(&str, &str)]) -> Self {
        self.body = Ok(Body::Form(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ));
        self
    }

    pub fn multipart(mut self, form: reqwest::multipart::Form) -> Self {
        self.body = Ok(Body::Multipart(form));
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[derive(Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    base_url: String,
    store: Arc<LocalStore>,
}

impl HttpClient {
    pub fn new(base_url: &str, store: Arc<LocalStore>) -> Self {
        Self {
            inner: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &Arc<LocalStore> {
        &self.store
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Raw request builder with auth attached, for streaming endpoints.
    pub(crate) fn authorized(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.inner.request(method, self.url(path));
        match session::token(&self.store) {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and return the JSON body (`Null` for empty bodies).
    pub async fn call(&self, request: ApiRequest) -> Result<Value> {
        let ApiRequest {
            method,
            path,
            query,
            body,
            anonymous,
        } = request;

        let had_token = !anonymous && session::token(&self.store).is_some();
        let mut builder = if anonymous {
            self.inner.request(method.clone(), self.url(&path))
        } else {
            self.authorized(method.clone(), &path)
        };
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        builder = match body? {
            Body::Empty => builder,
            Body::Json(value) => builder.json(&value),
            Body::Form(pairs) => builder.form(&pairs),
            Body::Multipart(form) => builder.multipart(form),
        };

        tracing::debug!("{method} {path}");
        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            if status == reqwest::StatusCode::UNAUTHORIZED && had_token {
                tracing::warn!("{method} {path} → 401, dropping session");
                if let Err(e) = session::clear(&self.store) {
                    tracing::warn!("failed to clear session: {e}");
                }
                return Err(ClientError::Unauthorized);
            }
            let detail = extract_detail(&bytes);
            tracing::debug!("{method} {path} → {status}: {detail}");
            return Err(ClientError::Api {
                status: status.as_u16(),
                detail,
            });
        }

        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Send a request and deserialize the body into `T`.
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let value = self.call(request).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Send a request whose answer is not needed.
    pub async fn execute(&self, request: ApiRequest) -> Result<()> {
        self.call(request).await.map(|_| ())
    }
}

/// Pull a human-readable message out of an error body.
///
/// FastAPI answers `{"detail": "..."}` for raised errors and
/// `{"detail": [{"msg": "..."}, ...]}` for validation failures.
fn extract_detail(bytes: &[u8]) -> String {
    let Ok(value) = serde_json::from_slice::<Value>(bytes) else {
        return "Unknown error".to_string();
    };
    match value.get("detail") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Array(items)) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if msgs.is_empty() {
                "Request failed".to_string()
            } else {
                msgs.join("; ")
            }
        }
        _ => "Request failed".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::keys;
    use serde_json::json;
    use wiremock::matchers::{body_string, header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> HttpClient {
        HttpClient::new(&server.uri(), Arc::new(LocalStore::in_memory()))
    }

    #[test]
    fn detail_variants() {
        assert_eq!(extract_detail(br#"{"detail":"Team not found"}"#), "Team not found");
        assert_eq!(
            extract_detail(br#"{"detail":[{"msg":"field required"},{"msg":"too short"}]}"#),
            "field required; too short"
        );
        assert_eq!(extract_detail(br#"{"error":"x"}"#), "Request failed");
        assert_eq!(extract_detail(b"<html>502</html>"), "Unknown error");
    }

    #[tokio::test]
    async fn attaches_bearer_and_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/kanban/tasks"))
            .and(header("authorization", "Bearer t1"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5})))
            .expect(1)
            .mount(&server)
            .await;

        let http = client(&server);
        http.store().set(keys::TOKEN, "t1").unwrap();
        let value = http
            .call(ApiRequest::post("/api/kanban/tasks").json(&json!({"title": "x"})))
            .await
            .unwrap();
        assert_eq!(value["id"], 5);
    }

    #[tokio::test]
    async fn no_auth_header_without_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/hackathon/teams"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/hackathon/teams"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let teams: Vec<models::Team> = client(&server)
            .send(ApiRequest::get("/api/hackathon/teams"))
            .await
            .unwrap();
        assert!(teams.is_empty());
    }

    #[tokio::test]
    async fn form_body_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .and(body_string("username=alice&password=secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/auth/leaderboard"))
            .and(query_param("limit", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let http = client(&server);
        http.call(
            ApiRequest::post("/api/auth/login").form(&[("username", "alice"), ("password", "secret")]),
        )
        .await
        .unwrap();
        http.call(ApiRequest::get("/api/auth/leaderboard").query("limit", 50))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn backend_detail_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/hackathon/teams"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"detail": "Name already taken"})),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .call(ApiRequest::post("/api/hackathon/teams").json(&json!({"name": "A"})))
            .await
            .unwrap_err();
        match err {
            ClientError::Api { status, detail } => {
                assert_eq!(status, 400);
                assert_eq!(detail, "Name already taken");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn unauthorized_drops_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "expired"})))
            .mount(&server)
            .await;

        let http = client(&server);
        http.store().set(keys::TOKEN, "stale").unwrap();
        let err = http.call(ApiRequest::get("/api/auth/me")).await.unwrap_err();
        assert!(matches!(err, ClientError::Unauthorized));
        assert!(!session::is_logged_in(http.store()));
    }

    #[tokio::test]
    async fn anonymous_401_keeps_session_and_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"detail": "Неверный логин или пароль"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let http = client(&server);
        http.store().set(keys::TOKEN, "still-valid-token").unwrap();
        let err = http.login("alice", "wrong").await.unwrap_err();
        match err {
            ClientError::Api { status, detail } => {
                assert_eq!(status, 401);
                assert_eq!(detail, "Неверный логин или пароль");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(session::token(http.store()).as_deref(), Some("still-valid-token"));
    }

    #[tokio::test]
    async fn empty_body_is_null() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/kanban/tasks/3"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let value = client(&server)
            .call(ApiRequest::delete("/api/kanban/tasks/3"))
            .await
            .unwrap();
        assert!(value.is_null());
    }
}
