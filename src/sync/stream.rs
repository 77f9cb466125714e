//! Token streaming for the personal assistant.
//!
//! The backend sends SSE `data:` frames carrying one of `{"token": ..}`,
//! `{"done": true}` or `{"error": ..}`. While tokens arrive the bubble shows
//! escaped plain text with a cursor; once done it is rendered as markdown.

use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use reqwest::Method;
use serde::Deserialize;

use crate::api::HttpClient;
use crate::events::{emit, AppEvent, EventSender};
use crate::markdown::{escape_html, render_markdown};

pub const STREAM_CURSOR: &str = "<span class=\"stream-cursor\">▋</span>";

// ── Frames ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum StreamFrame {
    Token(String),
    Done,
    Error(String),
}

#[derive(Deserialize)]
struct RawFrame {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

impl StreamFrame {
    /// Decode one `data:` payload. Frames carrying nothing usable are `None`.
    pub fn parse(data: &str) -> Option<Self> {
        let raw: RawFrame = serde_json::from_str(data).ok()?;
        if let Some(error) = raw.error {
            return Some(Self::Error(error));
        }
        if raw.done {
            return Some(Self::Done);
        }
        raw.token.filter(|t| !t.is_empty()).map(Self::Token)
    }
}

// ── Outcome ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum StreamOutcome {
    Complete { text: String },
    /// The server reported an error; tokens received so far are dropped.
    Failed { error: String },
    /// The connection ended early after some tokens.
    Partial { text: String },
    /// The connection ended before any token.
    ConnectionLost,
}

impl StreamOutcome {
    pub fn html(&self) -> String {
        match self {
            Self::Complete { text } | Self::Partial { text } => render_markdown(text),
            Self::Failed { error } => {
                format!("<em class=\"stream-error\">Error: {}</em>", escape_html(error))
            }
            Self::ConnectionLost => "<em class=\"stream-error\">Connection error</em>".to_string(),
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Complete { text } | Self::Partial { text } => Some(text),
            _ => None,
        }
    }
}

// ── Accumulator ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
pub struct StreamAccumulator {
    text: String,
    outcome: Option<StreamOutcome>,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn outcome(&self) -> Option<&StreamOutcome> {
        self.outcome.as_ref()
    }

    /// Apply a frame and return the bubble's new HTML. Frames after the
    /// stream finished are ignored.
    pub fn apply(&mut self, frame: StreamFrame) -> Option<String> {
        if self.outcome.is_some() {
            return None;
        }
        match frame {
            StreamFrame::Token(token) => {
                self.text.push_str(&token);
                Some(self.partial_html())
            }
            StreamFrame::Done => Some(self.finish(StreamOutcome::Complete {
                text: self.text.clone(),
            })),
            StreamFrame::Error(error) => Some(self.finish(StreamOutcome::Failed { error })),
        }
    }

    /// The transport went away without a terminal frame.
    pub fn connection_dropped(&mut self) -> Option<String> {
        if self.outcome.is_some() {
            return None;
        }
        let outcome = if self.text.is_empty() {
            StreamOutcome::ConnectionLost
        } else {
            StreamOutcome::Partial {
                text: self.text.clone(),
            }
        };
        Some(self.finish(outcome))
    }

    pub fn partial_html(&self) -> String {
        let escaped = self
            .text
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('\n', "<br>");
        format!("{escaped}{STREAM_CURSOR}")
    }

    fn finish(&mut self, outcome: StreamOutcome) -> String {
        let html = outcome.html();
        self.outcome = Some(outcome);
        html
    }

    fn into_outcome(self) -> StreamOutcome {
        self.outcome.unwrap_or(StreamOutcome::ConnectionLost)
    }
}

// ── Transport ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct StreamRequest<'a> {
    pub message: &'a str,
    pub language: &'a str,
    pub mode: &'a str,
    pub user_id: Option<i64>,
}

/// Stream one assistant answer, publishing every bubble update, and return
/// how it ended. Transport failures end the stream; they are not errors.
pub async fn stream_personal_chat(http: &HttpClient, request: &StreamRequest<'_>, events: &EventSender) -> StreamOutcome {
    let mut acc = StreamAccumulator::new();
    let publish = |html: Option<String>| {
        if let Some(html) = html {
            emit(events, AppEvent::StreamUpdate { html });
        }
    };

    let mut query = vec![
        ("message", request.message.to_string()),
        ("language", request.language.to_string()),
        ("mode", request.mode.to_string()),
    ];
    if let Some(user_id) = request.user_id {
        query.push(("user_id", user_id.to_string()));
    }

    let response = http
        .authorized(Method::GET, "/api/personal-chat/stream")
        .query(&query)
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .send()
        .await;
    let response = match response {
        Ok(r) if r.status().is_success() => r,
        Ok(r) => {
            tracing::warn!("stream refused: {}", r.status());
            publish(acc.connection_dropped());
            return acc.into_outcome();
        }
        Err(e) => {
            tracing::warn!("stream connect failed: {e}");
            publish(acc.connection_dropped());
            return acc.into_outcome();
        }
    };

    let mut sse = response.bytes_stream().eventsource();
    while let Some(event) = sse.next().await {
        match event {
            Ok(event) => {
                let Some(frame) = StreamFrame::parse(&event.data) else {
                    tracing::trace!("skipping stream frame {:?}", event.data);
                    continue;
                };
                publish(acc.apply(frame));
                if acc.is_finished() {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!("stream interrupted: {e}");
                break;
            }
        }
    }

    if !acc.is_finished() {
        publish(acc.connection_dropped());
    }
    tracing::debug!("stream finished with {} chars", acc.text().len());
    acc.into_outcome()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events;
    use crate::store::LocalStore;
    use std::sync::Arc;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn frames() {
        assert_eq!(StreamFrame::parse(r#"{"token":"Hel"}"#), Some(StreamFrame::Token("Hel".into())));
        assert_eq!(StreamFrame::parse(r#"{"done":true}"#), Some(StreamFrame::Done));
        assert_eq!(StreamFrame::parse(r#"{"error":"quota"}"#), Some(StreamFrame::Error("quota".into())));
        assert_eq!(StreamFrame::parse("not json"), None);
        assert_eq!(StreamFrame::parse(r#"{"token":""}"#), None);
    }

    #[test]
    fn tokens_then_done() {
        let mut acc = StreamAccumulator::new();
        assert_eq!(acc.apply(StreamFrame::Token("Hel".into())).unwrap(), format!("Hel{STREAM_CURSOR}"));
        assert_eq!(acc.apply(StreamFrame::Token("lo".into())).unwrap(), format!("Hello{STREAM_CURSOR}"));
        let html = acc.apply(StreamFrame::Done).unwrap();
        assert_eq!(html, "<p>Hello</p>\n");
        assert!(!html.contains("stream-cursor"));
        assert_eq!(acc.outcome(), Some(&StreamOutcome::Complete { text: "Hello".into() }));
        assert_eq!(acc.apply(StreamFrame::Token("late".into())), None);
    }

    #[test]
    fn partial_escapes_markup() {
        let mut acc = StreamAccumulator::new();
        let html = acc.apply(StreamFrame::Token("<b>\nx".into())).unwrap();
        assert_eq!(html, format!("&lt;b&gt;<br>x{STREAM_CURSOR}"));
    }

    #[test]
    fn error_abandons_tokens() {
        let mut acc = StreamAccumulator::new();
        acc.apply(StreamFrame::Token("half".into()));
        let html = acc.apply(StreamFrame::Error("model overloaded".into())).unwrap();
        assert!(html.contains("model overloaded"));
        assert!(!html.contains("half"));
    }

    #[test]
    fn drop_keeps_partial_or_reports() {
        let mut acc = StreamAccumulator::new();
        assert_eq!(acc.connection_dropped().unwrap(), "<em class=\"stream-error\">Connection error</em>");

        let mut acc = StreamAccumulator::new();
        acc.apply(StreamFrame::Token("**bold**".into()));
        assert_eq!(acc.connection_dropped().unwrap(), "<p><strong>bold</strong></p>\n");
        assert_eq!(acc.outcome(), Some(&StreamOutcome::Partial { text: "**bold**".into() }));
    }

    #[tokio::test]
    async fn streams_over_sse() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/personal-chat/stream"))
            .and(query_param("message", "hi"))
            .and(query_param("mode", "mentor"))
            .and(query_param("user_id", "3"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(
                        "data: {\"token\":\"Hel\"}\n\ndata: {\"token\":\"lo\"}\n\ndata: {\"done\":true}\n\n",
                    ),
            )
            .mount(&server)
            .await;

        let http = HttpClient::new(&server.uri(), Arc::new(LocalStore::in_memory()));
        let (tx, mut rx) = events::channel();
        let request = StreamRequest {
            message: "hi",
            language: "en",
            mode: "mentor",
            user_id: Some(3),
        };
        let outcome = stream_personal_chat(&http, &request, &tx).await;
        assert_eq!(outcome, StreamOutcome::Complete { text: "Hello".into() });

        let mut updates = Vec::new();
        while let Ok(AppEvent::StreamUpdate { html }) = rx.try_recv() {
            updates.push(html);
        }
        assert_eq!(updates.len(), 3);
        assert_eq!(updates.last().map(String::as_str), Some("<p>Hello</p>\n"));
    }

    #[tokio::test]
    async fn body_ending_early_is_partial() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/personal-chat/stream"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string("data: {\"token\":\"Hi\"}\n\n"),
            )
            .mount(&server)
            .await;

        let http = HttpClient::new(&server.uri(), Arc::new(LocalStore::in_memory()));
        let (tx, _rx) = events::channel();
        let request = StreamRequest {
            message: "hi",
            language: "ru",
            mode: "assistant",
            user_id: None,
        };
        let outcome = stream_personal_chat(&http, &request, &tx).await;
        assert_eq!(outcome, StreamOutcome::Partial { text: "Hi".into() });
    }
}
