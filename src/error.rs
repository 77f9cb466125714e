use serde::Serialize;

/// All errors that can surface from a client operation.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-2xx response; `detail` is the backend's message, shown verbatim.
    #[error("{detail}")]
    Api { status: u16, detail: String },

    #[error("Session expired, please log in again")]
    Unauthorized,

    /// Rejected before any request was issued.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Custom(String),
}

impl ClientError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Transport-level failures (category (a)): the request never got a
    /// backend answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network(_) | Self::WebSocket(_) | Self::Io(_))
    }
}

// Views carry errors as plain strings.
impl Serialize for ClientError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
