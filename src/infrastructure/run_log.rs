//! Per-run log stream.
//!
//! One log file per batch run, appended with one timestamped line per
//! significant event (fetch start, rate-limit wait, target success/failure,
//! batch completion). The handle is constructed by the caller and threaded
//! into the orchestrator explicitly so tests can inject isolated instances.
//! Old run logs are pruned on a retention count.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::domain::{AppError, Result};

/// How many run log files to keep when pruning.
const DEFAULT_RETENTION: usize = 20;

/// Append-only log for one batch run.
pub struct RunLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl RunLog {
    /// Create the log file for a run starting at `run_time`.
    ///
    /// # Errors
    /// Returns an IO error if the logs directory or file cannot be created.
    pub fn create(logs_dir: &Path, run_time: DateTime<Utc>) -> Result<Self> {
        std::fs::create_dir_all(logs_dir)
            .map_err(|e| AppError::io("Failed to create logs directory", e))?;

        let path = logs_dir.join(format!("export-{}.log", run_time.format("%Y%m%d_%H%M%S")));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| AppError::io(format!("Failed to open {}", path.display()), e))?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Path of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one timestamped line.
    ///
    /// Logging must never take a run down: write failures are reported via
    /// `tracing` and otherwise swallowed.
    pub fn append(&self, line: &str) {
        let stamped = format!("{} {line}\n", Utc::now().format("%Y-%m-%dT%H:%M:%SZ"));
        match self.file.lock() {
            Ok(mut file) => {
                if let Err(e) = file.write_all(stamped.as_bytes()) {
                    tracing::warn!("Run log write failed: {e}");
                }
            }
            Err(_) => tracing::warn!("Run log mutex poisoned; line dropped"),
        }
    }

    /// Delete the oldest run logs beyond the retention count.
    ///
    /// # Errors
    /// Returns an IO error if the logs directory cannot be listed.
    pub fn prune(logs_dir: &Path) -> Result<usize> {
        Self::prune_keeping(logs_dir, DEFAULT_RETENTION)
    }

    fn prune_keeping(logs_dir: &Path, keep: usize) -> Result<usize> {
        let mut logs: Vec<PathBuf> = std::fs::read_dir(logs_dir)
            .map_err(|e| AppError::io("Failed to list logs directory", e))?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|p| {
                p.extension().is_some_and(|ext| ext == "log")
                    && p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with("export-"))
            })
            .collect();

        // Names embed the run timestamp, so lexical order is age order.
        logs.sort();

        let mut removed = 0;
        if logs.len() > keep {
            for old in &logs[..logs.len() - keep] {
                if std::fs::remove_file(old).is_ok() {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[test]
    fn test_append_writes_timestamped_lines() {
        let dir = tempdir().unwrap();
        let run_time = Utc.with_ymd_and_hms(2024, 7, 1, 9, 30, 0).unwrap();
        let log = RunLog::create(dir.path(), run_time).unwrap();

        log.append("Fetch started for c1");
        log.append("Target c1 succeeded");

        let content = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("Fetch started for c1"));
        assert!(lines[1].contains("Target c1 succeeded"));
    }

    #[test]
    fn test_prune_keeps_newest() {
        let dir = tempdir().unwrap();
        for day in 1..=5 {
            let stamp = Utc.with_ymd_and_hms(2024, 7, day, 0, 0, 0).unwrap();
            RunLog::create(dir.path(), stamp).unwrap();
        }

        let removed = RunLog::prune_keeping(dir.path(), 2).unwrap();
        assert_eq!(removed, 3);

        let mut remaining: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        remaining.sort();
        assert_eq!(
            remaining,
            vec!["export-20240704_000000.log", "export-20240705_000000.log"]
        );
    }
}
