use std::fmt;
use std::str::FromStr;

use crate::error::{ClientError, Result};
use crate::store::{keys, LocalStore};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Dark,
    Light,
    Ocean,
    Forest,
    Sunset,
    Neon,
    Aurora,
    Space,
    Retro,
    Midnight,
}

impl Theme {
    pub const ALL: [Theme; 10] = [
        Theme::Dark,
        Theme::Light,
        Theme::Ocean,
        Theme::Forest,
        Theme::Sunset,
        Theme::Neon,
        Theme::Aurora,
        Theme::Space,
        Theme::Retro,
        Theme::Midnight,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
            Theme::Ocean => "ocean",
            Theme::Forest => "forest",
            Theme::Sunset => "sunset",
            Theme::Neon => "neon",
            Theme::Aurora => "aurora",
            Theme::Space => "space",
            Theme::Retro => "retro",
            Theme::Midnight => "midnight",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Theme::Dark => "🌙",
            Theme::Light => "☀️",
            Theme::Ocean => "🌊",
            Theme::Forest => "🌿",
            Theme::Sunset => "🌅",
            Theme::Neon => "⚡",
            Theme::Aurora => "🌌",
            Theme::Space => "🚀",
            Theme::Retro => "✨",
            Theme::Midnight => "🖤",
        }
    }

    /// Background, primary and accent colours for the picker preview.
    pub fn swatches(self) -> [&'static str; 3] {
        match self {
            Theme::Dark => ["#080810", "#7c6ff7", "#3ecfcf"],
            Theme::Light => ["#f0f2f5", "#7c3aed", "#0ea5e9"],
            Theme::Ocean => ["#010a14", "#06b6d4", "#38bdf8"],
            Theme::Forest => ["#020d06", "#22c55e", "#10b981"],
            Theme::Sunset => ["#0f0500", "#f97316", "#ec4899"],
            Theme::Neon => ["#000005", "#00ffe0", "#bf00ff"],
            Theme::Aurora => ["#03021a", "#00ffb4", "#7800ff"],
            Theme::Space => ["#000010", "#c084fc", "#818cf8"],
            Theme::Retro => ["#fce4ff", "#9333ea", "#ec4899"],
            Theme::Midnight => ["#000000", "#e5e5e5", "#888888"],
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Theme {
    type Err = ClientError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Theme::ALL
            .into_iter()
            .find(|t| t.id() == s)
            .ok_or_else(|| ClientError::validation(format!("Unknown theme: {s}")))
    }
}

/// Saved theme; unknown values fall back to the default.
pub fn theme(store: &LocalStore) -> Theme {
    store
        .get(keys::THEME)
        .and_then(|id| id.parse().ok())
        .unwrap_or_default()
}

pub fn set_theme(store: &LocalStore, theme: Theme) -> Result<()> {
    store.set(keys::THEME, theme.id())
}

// ── Language ────────────────────────────────────────────────────────────────

pub const LANGUAGES: [&str; 3] = ["ru", "en", "kz"];
pub const DEFAULT_LANGUAGE: &str = "ru";

pub fn language(store: &LocalStore) -> String {
    store
        .get(keys::LANG)
        .filter(|l| LANGUAGES.contains(&l.as_str()))
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
}

pub fn set_language(store: &LocalStore, lang: &str) -> Result<()> {
    if !LANGUAGES.contains(&lang) {
        return Err(ClientError::validation(format!("Unsupported language: {lang}")));
    }
    store.set(keys::LANG, lang)
}
