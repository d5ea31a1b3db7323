//! Export writer: persists formatted artifacts to the output tree.
//!
//! Layout: `<root>/DMs/<name>/` for direct messages and
//! `<root>/Servers/<server>/<channel>/` for channels. Filenames embed the
//! applied filter range and the run timestamp so repeated runs against the
//! same target never collide; unset filter bounds render as the literal
//! `open` marker so filenames stay structurally comparable.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::domain::{AppError, ExportOptions, ExportTarget, Result, TargetKind, WrittenPaths};

use super::paths::{ensure_writable_directory, sanitize_path_segment};

/// Marker rendered for an unset filter bound in filenames.
const OPEN_BOUND: &str = "open";

/// Writer for one batch run.
///
/// Carries the run timestamp captured at batch start so every target of the
/// run shares the same `[Exported ...]` filename suffix.
pub struct ExportWriter {
    run_stamp: String,
}

impl ExportWriter {
    /// Create a writer stamped with the batch start time.
    #[must_use]
    pub fn new(run_time: DateTime<Utc>) -> Self {
        Self {
            run_stamp: run_time.format("%Y%m%d_%H%M%S").to_string(),
        }
    }

    /// Pre-flight writability check, performed once per batch.
    ///
    /// Must run before any target is processed; a failure aborts the whole
    /// run before anything is written.
    ///
    /// # Errors
    /// Returns [`AppError::NotWritable`] if the output root or logs
    /// directory cannot be created or written to.
    pub fn preflight(options: &ExportOptions, logs_dir: &Path) -> Result<()> {
        ensure_writable_directory(&options.output_root)?;
        ensure_writable_directory(logs_dir)?;
        Ok(())
    }

    /// Directory artifacts for this target are written into.
    #[must_use]
    pub fn target_dir(options: &ExportOptions, target: &ExportTarget) -> PathBuf {
        match target.kind {
            TargetKind::Dm => options
                .output_root
                .join("DMs")
                .join(sanitize_path_segment(&target.display_name)),
            TargetKind::Channel => {
                let mut dir = options.output_root.join("Servers");
                for segment in &target.parent_path {
                    dir = dir.join(sanitize_path_segment(segment));
                }
                dir.join(sanitize_path_segment(&target.display_name))
            }
        }
    }

    /// Base filename (no extension) for this target's artifacts.
    ///
    /// `<label> [<after>-<before>] [<afterTime>-<beforeTime>] [Exported <stamp>]`
    #[must_use]
    pub fn base_filename(&self, target: &ExportTarget, options: &ExportOptions) -> String {
        let date = |bound: Option<DateTime<Utc>>| {
            bound.map_or_else(|| OPEN_BOUND.to_string(), |b| b.format("%Y-%m-%d").to_string())
        };
        let time = |bound: Option<DateTime<Utc>>| {
            bound.map_or_else(|| OPEN_BOUND.to_string(), |b| b.format("%H%M").to_string())
        };

        format!(
            "{} [{}-{}] [{}-{}] [Exported {}]",
            sanitize_path_segment(&target.label()),
            date(options.after_filter),
            date(options.before_filter),
            time(options.after_filter),
            time(options.before_filter),
            self.run_stamp
        )
    }

    /// Write the transcript and/or JSON artifacts for one target.
    ///
    /// # Errors
    /// Returns an IO error if the target directory or a file cannot be
    /// written.
    pub async fn write(
        &self,
        target: &ExportTarget,
        transcript: Option<&str>,
        json_payload: Option<&str>,
        options: &ExportOptions,
    ) -> Result<WrittenPaths> {
        let dir = Self::target_dir(options, target);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::io(format!("Failed to create {}", dir.display()), e))?;

        let base = self.base_filename(target, options);
        let mut written = WrittenPaths::default();

        if let Some(text) = transcript {
            let path = dir.join(format!("{base}.txt"));
            tokio::fs::write(&path, text)
                .await
                .map_err(|e| AppError::io(format!("Failed to write {}", path.display()), e))?;
            written.txt_path = Some(path);
        }

        if let Some(json) = json_payload {
            let path = dir.join(format!("{base}.json"));
            tokio::fs::write(&path, json)
                .await
                .map_err(|e| AppError::io(format!("Failed to write {}", path.display()), e))?;
            written.json_path = Some(path);
        }

        tracing::debug!(
            target_id = %target.target_id,
            dir = %dir.display(),
            "Artifacts written"
        );

        Ok(written)
    }

    /// Directory for this target's attachment downloads.
    #[must_use]
    pub fn attachments_dir(&self, target: &ExportTarget, options: &ExportOptions) -> PathBuf {
        Self::target_dir(options, target).join(format!("attachments [Exported {}]", self.run_stamp))
    }

    /// Write one downloaded attachment under the target's attachment folder.
    ///
    /// # Errors
    /// Returns an IO error if the file cannot be written; the caller records
    /// it as a partial failure without failing the target.
    pub async fn write_attachment(
        &self,
        dir: &Path,
        suggested_filename: &str,
        bytes: &[u8],
    ) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| AppError::io(format!("Failed to create {}", dir.display()), e))?;

        let path = dir.join(sanitize_path_segment(suggested_filename));
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::io(format!("Failed to write {}", path.display()), e))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn run_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 9, 30, 0).unwrap()
    }

    fn dm_target() -> ExportTarget {
        ExportTarget {
            target_id: "d1".into(),
            display_name: "Alice".into(),
            parent_path: vec![],
            kind: TargetKind::Dm,
        }
    }

    fn channel_target() -> ExportTarget {
        ExportTarget {
            target_id: "c1".into(),
            display_name: "general".into(),
            parent_path: vec!["Guild".into()],
            kind: TargetKind::Channel,
        }
    }

    #[test]
    fn test_layout_for_dm_and_channel() {
        let options = ExportOptions {
            output_root: PathBuf::from("/tmp/out"),
            ..Default::default()
        };
        assert_eq!(
            ExportWriter::target_dir(&options, &dm_target()),
            PathBuf::from("/tmp/out/DMs/Alice")
        );
        assert_eq!(
            ExportWriter::target_dir(&options, &channel_target()),
            PathBuf::from("/tmp/out/Servers/Guild/general")
        );
    }

    #[test]
    fn test_filename_renders_open_markers() {
        let writer = ExportWriter::new(run_time());
        let name = writer.base_filename(&dm_target(), &ExportOptions::default());
        assert_eq!(name, "Alice [open-open] [open-open] [Exported 20240701_093000]");
    }

    #[test]
    fn test_filename_renders_bounds() {
        let writer = ExportWriter::new(run_time());
        let options = ExportOptions {
            after_filter: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            before_filter: Some(Utc.with_ymd_and_hms(2024, 6, 30, 23, 59, 0).unwrap()),
            ..Default::default()
        };
        let name = writer.base_filename(&channel_target(), &options);
        assert_eq!(
            name,
            "Guild #general [2024-01-01-2024-06-30] [0000-2359] [Exported 20240701_093000]"
        );
    }

    #[tokio::test]
    async fn test_write_creates_requested_artifacts() {
        let dir = tempdir().unwrap();
        let options = ExportOptions {
            output_root: dir.path().to_path_buf(),
            ..Default::default()
        };
        let writer = ExportWriter::new(run_time());

        let written = writer
            .write(&dm_target(), Some("transcript"), Some("[]"), &options)
            .await
            .unwrap();

        let txt = written.txt_path.unwrap();
        assert!(txt.starts_with(dir.path().join("DMs/Alice")));
        assert_eq!(std::fs::read_to_string(&txt).unwrap(), "transcript");
        assert!(written.json_path.unwrap().exists());
    }

    #[tokio::test]
    async fn test_write_skips_disabled_artifacts() {
        let dir = tempdir().unwrap();
        let options = ExportOptions {
            output_root: dir.path().to_path_buf(),
            ..Default::default()
        };
        let writer = ExportWriter::new(run_time());

        let written = writer
            .write(&dm_target(), Some("transcript"), None, &options)
            .await
            .unwrap();
        assert!(written.json_path.is_none());
        assert!(written.txt_path.is_some());
    }

    #[tokio::test]
    async fn test_attachment_written_under_target_folder() {
        let dir = tempdir().unwrap();
        let options = ExportOptions {
            output_root: dir.path().to_path_buf(),
            ..Default::default()
        };
        let writer = ExportWriter::new(run_time());
        let attachments = writer.attachments_dir(&dm_target(), &options);

        let path = writer
            .write_attachment(&attachments, "a1_pic.png", b"bytes")
            .await
            .unwrap();
        assert!(path.starts_with(dir.path().join("DMs/Alice")));
        assert_eq!(std::fs::read(&path).unwrap(), b"bytes");
    }

    #[test]
    fn test_preflight_accepts_writable_dirs() {
        let dir = tempdir().unwrap();
        let options = ExportOptions {
            output_root: dir.path().join("out"),
            ..Default::default()
        };
        ExportWriter::preflight(&options, &dir.path().join("logs")).unwrap();
        assert!(dir.path().join("out").is_dir());
    }
}
