//! Realtime transports. Each one owns a background task and reports back
//! through the app's event channel.

pub mod chat;
pub mod kanban;
pub mod presence;
pub mod stream;

pub use chat::{ChatLog, ChatState, ChatTransport};
pub use kanban::{KanbanBoard, KanbanState, KanbanSync};
pub use presence::Presence;
pub use stream::{StreamAccumulator, StreamFrame, StreamOutcome};
