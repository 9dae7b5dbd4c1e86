//! Append-only per-project history log.
//!
//! One JSON record per line under `<project>/history.log`. The log is only
//! ever appended to; it is never rewritten or reordered.

use crate::error::Result;
use crate::manifest::ApplyOutcome;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const HISTORY_FILE: &str = "history.log";

/// The operation set recorded for one applied command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum HistoryAction {
    Created,
    Push {
        added: Vec<String>,
        updated: Vec<String>,
        deleted: Vec<String>,
    },
    Commit {
        added: Vec<String>,
        updated: Vec<String>,
        deleted: Vec<String>,
    },
    Rollback {
        /// Version whose state was restored.
        restored_from: u64,
    },
}

impl HistoryAction {
    pub fn push(outcome: ApplyOutcome) -> Self {
        Self::Push {
            added: outcome.added,
            updated: outcome.updated,
            deleted: outcome.deleted,
        }
    }

    pub fn commit(outcome: ApplyOutcome) -> Self {
        Self::Commit {
            added: outcome.added,
            updated: outcome.updated,
            deleted: outcome.deleted,
        }
    }
}

/// One line of the history log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Manifest version produced by the operation.
    pub version: u64,
    /// Unix seconds.
    pub timestamp: i64,
    #[serde(flatten)]
    pub action: HistoryAction,
}

impl HistoryEntry {
    /// An entry stamped with the current time.
    pub fn now(version: u64, action: HistoryAction) -> Self {
        Self {
            version,
            timestamp: chrono::Utc::now().timestamp(),
            action,
        }
    }

    /// Short human-readable form for logging.
    pub fn describe(&self) -> String {
        match &self.action {
            HistoryAction::Created => format!("r{} created", self.version),
            HistoryAction::Push {
                added,
                updated,
                deleted,
            } => format!(
                "r{} push (+{} ~{} -{})",
                self.version,
                added.len(),
                updated.len(),
                deleted.len()
            ),
            HistoryAction::Commit {
                added,
                updated,
                deleted,
            } => format!(
                "r{} commit (+{} ~{} -{})",
                self.version,
                added.len(),
                updated.len(),
                deleted.len()
            ),
            HistoryAction::Rollback { restored_from } => {
                format!("r{} rollback (restored from r{restored_from})", self.version)
            }
        }
    }
}

/// Manages one project's history log.
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new(project_dir: &Path) -> Self {
        Self {
            path: project_dir.join(HISTORY_FILE),
        }
    }

    /// Append one record.
    pub fn append(&self, entry: &HistoryEntry) -> Result<()> {
        let mut line = serde_json::to_string(entry).map_err(std::io::Error::other)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// All recorded entries, oldest first.
    pub fn all(&self) -> Result<Vec<HistoryEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&self.path)?;
        let mut entries = Vec::new();
        for line in text.lines() {
            if line.is_empty() {
                continue;
            }
            entries.push(serde_json::from_str(line).map_err(std::io::Error::other)?);
        }
        Ok(entries)
    }

    /// The most recent entry.
    pub fn latest(&self) -> Result<Option<HistoryEntry>> {
        Ok(self.all()?.into_iter().last())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let log = HistoryLog::new(dir.path());
        assert!(log.all().unwrap().is_empty());

        let first = HistoryEntry::now(1, HistoryAction::Created);
        let second = HistoryEntry::now(
            2,
            HistoryAction::Push {
                added: vec!["a.txt".into()],
                updated: vec![],
                deleted: vec![],
            },
        );
        log.append(&first).unwrap();
        log.append(&second).unwrap();

        let entries = log.all().unwrap();
        assert_eq!(entries, vec![first, second.clone()]);
        assert_eq!(log.latest().unwrap(), Some(second));
    }

    #[test]
    fn test_append_preserves_existing_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = HistoryLog::new(dir.path());
        for version in 1..=5 {
            log.append(&HistoryEntry::now(version, HistoryAction::Created))
                .unwrap();
        }
        let versions: Vec<u64> = log.all().unwrap().iter().map(|e| e.version).collect();
        assert_eq!(versions, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_rollback_record() {
        let dir = tempfile::tempdir().unwrap();
        let log = HistoryLog::new(dir.path());
        let entry = HistoryEntry::now(4, HistoryAction::Rollback { restored_from: 2 });
        log.append(&entry).unwrap();
        let read = log.latest().unwrap().unwrap();
        assert_eq!(read.action, HistoryAction::Rollback { restored_from: 2 });
        assert_eq!(read.describe(), "r4 rollback (restored from r2)");
    }
}
