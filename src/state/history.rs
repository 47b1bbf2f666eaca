use std::fmt;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// History is capped; once full, the oldest entries are silently dropped.
pub const HISTORY_CAP: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryAction {
    Connected,
    Disconnected,
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryAction::Connected => write!(f, "connected"),
            HistoryAction::Disconnected => write!(f, "disconnected"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub action: HistoryAction,
    pub profile: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Connection event log, newest first, persisted on every append.
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Entries newest-first. Missing or corrupt file reads as empty.
    #[must_use]
    pub fn list(&self) -> Vec<HistoryEntry> {
        match fs::read_to_string(&self.path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                debug!(path = %self.path.display(), error = %e, "history_corrupt");
                Vec::new()
            }),
            Err(_) => Vec::new(),
        }
    }

    pub fn append(&self, action: HistoryAction, profile: &str, detail: Option<String>) {
        let mut entries = self.list();
        entries.insert(
            0,
            HistoryEntry {
                timestamp: Utc::now(),
                action,
                profile: profile.to_string(),
                detail,
            },
        );
        entries.truncate(HISTORY_CAP);
        self.save(&entries);
    }

    pub fn clear(&self) {
        self.save(&[]);
    }

    fn save(&self, entries: &[HistoryEntry]) {
        let result = serde_json::to_string_pretty(entries)
            .map_err(std::io::Error::other)
            .and_then(|json| fs::write(&self.path, json));
        if let Err(e) = result {
            warn!(path = %self.path.display(), error = %e, "history_write_failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_at(dir: &tempfile::TempDir) -> HistoryLog {
        HistoryLog::new(dir.path().join("connection_history.json"))
    }

    #[test]
    fn entries_are_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let log = log_at(&dir);

        log.append(HistoryAction::Connected, "eu1", Some("Germany".to_string()));
        log.append(HistoryAction::Disconnected, "eu1", None);

        let entries = log.list();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, HistoryAction::Disconnected);
        assert_eq!(entries[1].action, HistoryAction::Connected);
        assert_eq!(entries[1].detail.as_deref(), Some("Germany"));
    }

    #[test]
    fn cap_drops_oldest_entries() {
        let dir = tempfile::tempdir().unwrap();
        let log = log_at(&dir);

        for i in 0..(HISTORY_CAP + 1) {
            log.append(HistoryAction::Connected, &format!("p{}", i), None);
        }

        let entries = log.list();
        assert_eq!(entries.len(), HISTORY_CAP);
        // Newest entry kept, oldest dropped.
        assert_eq!(entries[0].profile, format!("p{}", HISTORY_CAP));
        assert!(entries.iter().all(|e| e.profile != "p0"));
    }

    #[test]
    fn clear_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let log = log_at(&dir);
        log.append(HistoryAction::Connected, "eu1", None);

        log.clear();
        assert!(log.list().is_empty());
    }

    #[test]
    fn corrupt_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("connection_history.json"), "not json").unwrap();
        assert!(log_at(&dir).list().is_empty());
    }
}
