use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::{ClientError, Result};

const MAX_SESSION_LOGS: usize = 10;
const DEFAULT_FILTER: &str = "akyl_client=info";

/// Install the global tracing subscriber writing to `<data_dir>/logs/latest.log`.
///
/// - Creates `logs/` if it doesn't exist
/// - Rotates `latest.log` → `session-{timestamp}.log`
/// - Cleans up old sessions (keeps max 10)
///
/// The filter comes from `AKYL_LOG`, defaulting to `akyl_client=info`.
pub fn init_logging(data_dir: &Path) -> Result<PathBuf> {
    let latest = prepare_log_file(data_dir)?;

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&latest)?;

    let filter = EnvFilter::try_from_env("AKYL_LOG")
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| ClientError::Custom(format!("Logger already installed: {e}")))?;

    tracing::info!("=== AkylTeam client session — {} ===", format_timestamp(unix_timestamp()));
    Ok(latest)
}

/// Rotate the previous `latest.log` and prune old sessions. Returns the path
/// of the fresh `latest.log`.
pub fn prepare_log_file(data_dir: &Path) -> Result<PathBuf> {
    let logs_dir = data_dir.join("logs");
    std::fs::create_dir_all(&logs_dir)?;

    let latest = logs_dir.join("latest.log");
    if latest.exists() {
        let rotated = logs_dir.join(format!("session-{}.log", unix_timestamp()));
        let _ = std::fs::rename(&latest, &rotated);
    }

    cleanup_old_sessions(&logs_dir, MAX_SESSION_LOGS);
    Ok(latest)
}

/// Keep only the `keep` most recent `session-*.log` files.
fn cleanup_old_sessions(logs_dir: &Path, keep: usize) {
    let Ok(entries) = std::fs::read_dir(logs_dir) else {
        return;
    };

    let mut session_files: Vec<PathBuf> = entries
        .flatten()
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.starts_with("session-") && name.ends_with(".log")
        })
        .map(|entry| entry.path())
        .collect();

    // Timestamp is embedded, so lexicographic = chronological
    session_files.sort();

    while session_files.len() > keep {
        let oldest = session_files.remove(0);
        let _ = std::fs::remove_file(oldest);
    }
}

fn unix_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Format a Unix timestamp as ISO 8601 UTC (e.g. "2025-06-15T10:30:00Z").
fn format_timestamp(secs: i64) -> String {
    chrono::DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_epoch_seconds() {
        assert_eq!(format_timestamp(1_735_689_600), "2025-01-01T00:00:00Z");
    }

    #[test]
    fn rotates_previous_latest() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        std::fs::create_dir_all(&logs).unwrap();
        std::fs::write(logs.join("latest.log"), "old run").unwrap();

        let latest = prepare_log_file(dir.path()).unwrap();
        assert!(!latest.exists());

        let rotated: Vec<_> = std::fs::read_dir(&logs)
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().starts_with("session-"))
            .collect();
        assert_eq!(rotated.len(), 1);
    }

    #[test]
    fn keeps_ten_sessions() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..14 {
            std::fs::write(dir.path().join(format!("session-{:04}.log", i)), "").unwrap();
        }
        cleanup_old_sessions(dir.path(), MAX_SESSION_LOGS);

        let mut left: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        left.sort();
        assert_eq!(left.len(), 10);
        assert_eq!(left[0], "session-0004.log");
    }
}
