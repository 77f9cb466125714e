pub mod burnout;
pub mod notes;
pub mod notifications;
pub mod role_test;
pub mod theme;
pub mod timers;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::{keys, LocalStore};

pub const LEARN_HISTORY_CAP: usize = 20;

/// A generated course remembered on the learn page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LearnEntry {
    pub title: String,
    #[serde(default)]
    pub emoji: Option<String>,
    pub level: String,
    pub topic: String,
    #[serde(default)]
    pub lessons: serde_json::Value,
    /// Unix millis
    pub date: i64,
}

/// Oldest first, as stored.
pub fn learn_history(store: &LocalStore) -> Vec<LearnEntry> {
    store.get_json(keys::LEARN_HISTORY).unwrap_or_default()
}

pub fn record_learn(store: &LocalStore, entry: LearnEntry) -> Result<()> {
    let mut history = learn_history(store);
    history.push(entry);
    if history.len() > LEARN_HISTORY_CAP {
        let excess = history.len() - LEARN_HISTORY_CAP;
        history.drain(..excess);
    }
    store.set_json(keys::LEARN_HISTORY, &history)
}
