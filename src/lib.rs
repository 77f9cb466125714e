//! Headless client for the AkylTeam hackathon backend: the HTTP API, the
//! realtime transports (chat and kanban sockets, presence heartbeat, SSE
//! answers) and the local state the pages are rendered from.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod features;
pub mod logs;
pub mod markdown;
pub mod router;
pub mod session;
pub mod store;
pub mod sync;
pub mod util;
pub mod view;

pub use app::App;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use events::AppEvent;
