use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ClientError, Result};
use crate::util::expand_tilde;

const CONFIG_VERSION: u32 = 1;

/// How the kanban socket retries after the server closes it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconnectPolicy {
    pub delay_ms: u64,
    /// `None` retries forever.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay_ms: 5_000,
            max_attempts: Some(10),
        }
    }
}

impl ReconnectPolicy {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Whether attempt number `attempt` (1-based) may still run.
    pub fn allows(&self, attempt: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempt <= max)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub version: u32,
    pub base_url: String,
    pub data_dir: String,
    pub language: String,
    #[serde(default = "default_interval")]
    pub heartbeat_interval_secs: u64,
    #[serde(default = "default_interval")]
    pub dashboard_poll_secs: u64,
    #[serde(default = "default_ping")]
    pub kanban_ping_secs: u64,
    #[serde(default)]
    pub reconnect: ReconnectPolicy,
}

fn default_interval() -> u64 {
    30
}

fn default_ping() -> u64 {
    25
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            base_url: "http://127.0.0.1:8000".into(),
            data_dir: "~/.akyl".into(),
            language: "ru".into(),
            heartbeat_interval_secs: default_interval(),
            dashboard_poll_secs: default_interval(),
            kanban_ping_secs: default_ping(),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(expand_tilde(&self.data_dir))
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn dashboard_poll(&self) -> Duration {
        Duration::from_secs(self.dashboard_poll_secs)
    }

    pub fn kanban_ping(&self) -> Duration {
        Duration::from_secs(self.kanban_ping_secs)
    }

    /// Apply `AKYL_BASE_URL` / `AKYL_DATA_DIR` on top of the file values.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("AKYL_BASE_URL") {
            if !url.trim().is_empty() {
                self.base_url = url.trim().trim_end_matches('/').to_string();
            }
        }
        if let Ok(dir) = std::env::var("AKYL_DATA_DIR") {
            if !dir.trim().is_empty() {
                self.data_dir = dir;
            }
        }
        self
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".akyl").join("config.json"))
}

/// Read a config file, falling back to defaults when it is missing or
/// unreadable.
pub fn load_config_from(path: &Path) -> ClientConfig {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|content| serde_json::from_str(&content).ok())
        .unwrap_or_default()
}

pub fn load_config() -> ClientConfig {
    let config = match config_path() {
        Some(path) => load_config_from(&path),
        None => ClientConfig::default(),
    };
    config.with_env_overrides()
}

pub fn save_config_to(path: &Path, config: &ClientConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| ClientError::Custom(e.to_string()))?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn save_config(config: &ClientConfig) -> Result<()> {
    let path = config_path()
        .ok_or_else(|| ClientError::Custom("Cannot find home directory".into()))?;
    save_config_to(&path, config)
}
