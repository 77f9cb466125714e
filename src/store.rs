//! File-backed key/value store mirroring browser local storage.
//!
//! Every mutation is written through to disk before returning, so two
//! handles on the same file see last-write-wins semantics and nothing more.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::Result;

/// Well-known keys shared with the web client.
pub mod keys {
    pub const TOKEN: &str = "akyl_token";
    pub const USER: &str = "akyl_user";
    pub const THEME: &str = "akyl_theme";
    pub const LANG: &str = "akyl_lang";
    pub const COUNTDOWN: &str = "akyl_countdown";
    pub const KANBAN_TEAM: &str = "akyl_kanban_team";
    pub const MY_ROLE: &str = "akyl_my_role";
    pub const LEARN_HISTORY: &str = "akyl_learn_history";
    pub const QUICK_NOTES: &str = "akyl_quick_notes";
    pub const PROJECT_SPACE_NOTES: &str = "pspace_notes";
    pub const GITHUB_TOKEN: &str = "gh_token";
    pub const NOTIFICATIONS: &str = "akyl_notifs";
    pub const CHALLENGE_NOTIF_DAY: &str = "akyl_chall_notif_day";

    /// `akyl_notes_<teamId>` or `akyl_notes_personal`.
    pub fn team_notes(team_id: Option<i64>) -> String {
        match team_id {
            Some(id) => format!("akyl_notes_{id}"),
            None => "akyl_notes_personal".to_string(),
        }
    }
}

pub struct LocalStore {
    path: Option<PathBuf>,
    entries: Mutex<BTreeMap<String, String>>,
}

impl LocalStore {
    /// Open (or lazily create) the store file. A corrupt file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!("discarding unreadable store {}: {e}", path.display());
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path: Some(path),
            entries: Mutex::new(entries),
        })
    }

    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn set(&self, key: &str, value: impl Into<String>) -> Result<()> {
        let mut entries = self.lock();
        entries.insert(key.to_string(), value.into());
        self.persist(&entries)
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.lock();
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }

    /// Parse a JSON value; anything unparseable reads as absent.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key)?;
        serde_json::from_str(&raw).ok()
    }

    pub fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set(key, raw)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        write_atomic(path, &serde_json::to_vec_pretty(entries)?)
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, bytes)?;
    match std::fs::rename(&tmp_path, path) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            if path.exists() {
                std::fs::remove_file(path)?;
                std::fs::rename(&tmp_path, path)?;
                Ok(())
            } else {
                Err(rename_err.into())
            }
        }
    }
}
