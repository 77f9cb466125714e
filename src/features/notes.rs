//! Local-only notes: per-team notes, the quick-note scratchpad and the
//! project-space sticky board. Every change is written through to the
//! store before returning.

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};
use crate::store::{keys, LocalStore};
use crate::util::now_millis;

pub const QUICK_NOTES_CAP: usize = 50;
pub const DEFAULT_NOTE_COLOR: &str = "#7c3aed";
const DEFAULT_QUICK_TITLE: &str = "Quick note";

// ── Team notes ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamNote {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_color")]
    pub color: String,
    pub created_at: i64,
}

fn default_color() -> String {
    DEFAULT_NOTE_COLOR.to_string()
}

/// Notes for a team, or the personal set when `team_id` is `None`.
/// Newest first.
pub fn team_notes(store: &LocalStore, team_id: Option<i64>) -> Vec<TeamNote> {
    store.get_json(&keys::team_notes(team_id)).unwrap_or_default()
}

pub fn add_team_note(
    store: &LocalStore,
    team_id: Option<i64>,
    title: &str,
    content: &str,
    color: Option<&str>,
) -> Result<TeamNote> {
    let (title, content) = (title.trim(), content.trim());
    if title.is_empty() && content.is_empty() {
        return Err(ClientError::validation("Enter a title or some text"));
    }
    let note = TeamNote {
        title: title.to_string(),
        content: content.to_string(),
        color: color.unwrap_or(DEFAULT_NOTE_COLOR).to_string(),
        created_at: now_millis(),
    };
    let mut notes = team_notes(store, team_id);
    notes.insert(0, note.clone());
    store.set_json(&keys::team_notes(team_id), &notes)?;
    Ok(note)
}

/// Remove by position in the newest-first list.
pub fn delete_team_note(store: &LocalStore, team_id: Option<i64>, index: usize) -> Result<Option<TeamNote>> {
    let mut notes = team_notes(store, team_id);
    if index >= notes.len() {
        return Ok(None);
    }
    let removed = notes.remove(index);
    store.set_json(&keys::team_notes(team_id), &notes)?;
    Ok(Some(removed))
}

pub fn export_markdown(notes: &[TeamNote]) -> String {
    notes
        .iter()
        .map(|n| {
            let title = if n.title.is_empty() { "Untitled" } else { &n.title };
            let when = chrono::DateTime::from_timestamp_millis(n.created_at)
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();
            format!("# {title}\n*{when}*\n\n{}", n.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

// ── Quick notes ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuickNote {
    pub id: i64,
    pub title: String,
    pub content: String,
    /// RFC 3339
    pub date: String,
}

pub fn quick_notes(store: &LocalStore) -> Vec<QuickNote> {
    store.get_json(keys::QUICK_NOTES).unwrap_or_default()
}

pub fn add_quick_note(store: &LocalStore, title: &str, content: &str) -> Result<QuickNote> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ClientError::validation("Write something first"));
    }
    let title = match title.trim() {
        "" => DEFAULT_QUICK_TITLE,
        t => t,
    };
    let note = QuickNote {
        id: now_millis(),
        title: title.to_string(),
        content: content.to_string(),
        date: chrono::Utc::now().to_rfc3339(),
    };
    let mut notes = quick_notes(store);
    notes.insert(0, note.clone());
    notes.truncate(QUICK_NOTES_CAP);
    store.set_json(keys::QUICK_NOTES, &notes)?;
    Ok(note)
}

// ── Project space ───────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StickyKind {
    Note,
    Idea,
    Task,
    Warning,
}

impl StickyKind {
    pub fn icon(self) -> &'static str {
        match self {
            StickyKind::Note => "📝",
            StickyKind::Idea => "💡",
            StickyKind::Task => "✅",
            StickyKind::Warning => "⚠️",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StickyKind::Note => "Note",
            StickyKind::Idea => "Idea",
            StickyKind::Task => "Task",
            StickyKind::Warning => "Risk",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StickyNote {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: StickyKind,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub w: f64,
}

pub const STICKY_WIDTH: f64 = 190.0;

/// The free-form sticky board, kept in insertion order.
pub struct ProjectSpace<'a> {
    store: &'a LocalStore,
    notes: Vec<StickyNote>,
}

impl<'a> ProjectSpace<'a> {
    pub fn load(store: &'a LocalStore) -> Self {
        let notes = store.get_json(keys::PROJECT_SPACE_NOTES).unwrap_or_default();
        Self { store, notes }
    }

    pub fn notes(&self) -> &[StickyNote] {
        &self.notes
    }

    pub fn add(&mut self, kind: StickyKind, x: f64, y: f64) -> Result<&StickyNote> {
        // Two adds within the same millisecond still get distinct ids.
        let last = self.notes.iter().map(|n| n.id).max().unwrap_or(0);
        let note = StickyNote {
            id: now_millis().max(last + 1),
            kind,
            text: kind.label().to_string(),
            x: x.max(0.0),
            y: y.max(0.0),
            w: STICKY_WIDTH,
        };
        self.notes.push(note);
        self.save()?;
        let idx = self.notes.len() - 1;
        Ok(&self.notes[idx])
    }

    /// Drop a dragged note at a new position; coordinates clamp at zero.
    pub fn move_to(&mut self, id: i64, x: f64, y: f64) -> Result<bool> {
        let Some(note) = self.notes.iter_mut().find(|n| n.id == id) else {
            return Ok(false);
        };
        note.x = x.max(0.0);
        note.y = y.max(0.0);
        self.save()?;
        Ok(true)
    }

    pub fn edit(&mut self, id: i64, text: &str) -> Result<bool> {
        let Some(note) = self.notes.iter_mut().find(|n| n.id == id) else {
            return Ok(false);
        };
        note.text = text.to_string();
        self.save()?;
        Ok(true)
    }

    pub fn delete(&mut self, id: i64) -> Result<bool> {
        let before = self.notes.len();
        self.notes.retain(|n| n.id != id);
        if self.notes.len() == before {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    fn save(&self) -> Result<()> {
        self.store.set_json(keys::PROJECT_SPACE_NOTES, &self.notes)
    }
}
