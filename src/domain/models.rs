//! Domain models for chat export.
//!
//! These models represent the units flowing through the export pipeline:
//! retrieved messages, resolved export targets, the options snapshot shared
//! by a batch run, and per-target results.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a resolved export target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// A direct-message conversation.
    Dm,
    /// A text channel inside a server.
    Channel,
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dm => write!(f, "DM"),
            Self::Channel => write!(f, "Channel"),
        }
    }
}

/// Reference to an attachment on a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentRef {
    /// Unique identifier of the attachment.
    pub id: String,
    /// Original filename as reported by the API.
    pub filename: String,
    /// Download URL (or snapshot-relative locator).
    pub url: String,
    /// Size in bytes, if known.
    #[serde(default)]
    pub size_bytes: Option<u64>,
}

impl AttachmentRef {
    /// Filename to write the attachment under, unique across a target.
    #[must_use]
    pub fn suggested_filename(&self) -> String {
        format!("{}_{}", self.id, self.filename)
    }
}

/// A single retrieved message.
///
/// Owned by the in-flight fetch for one target and dropped after that
/// target's write completes, bounding memory for large exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier.
    pub id: String,
    /// Author tag (username#discriminator or unique handle).
    pub author_tag: String,
    /// Server nickname of the author, if set.
    #[serde(default)]
    pub author_nickname: Option<String>,
    /// When the message was sent.
    pub timestamp: DateTime<Utc>,
    /// When the message was last edited, if ever.
    #[serde(default)]
    pub edited_timestamp: Option<DateTime<Utc>>,
    /// Whether the message is pinned in its channel.
    #[serde(default)]
    pub pinned: bool,
    /// Message body.
    pub content: String,
    /// Id of the message this one replies to, if any.
    #[serde(default)]
    pub reply_to_id: Option<String>,
    /// Attachments in upload order.
    #[serde(default)]
    pub attachments: Vec<AttachmentRef>,
}

/// Immutable snapshot of one checked leaf, created at batch start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTarget {
    /// Stable identifier (the remote channel id).
    pub target_id: String,
    /// Display name (DM name or channel name).
    pub display_name: String,
    /// Parent path segments: empty for DMs, `[server]` for channels.
    pub parent_path: Vec<String>,
    /// DM or channel.
    pub kind: TargetKind,
}

impl ExportTarget {
    /// Human-readable label, e.g. `Alice` or `Guild #general`.
    #[must_use]
    pub fn label(&self) -> String {
        match self.kind {
            TargetKind::Dm => self.display_name.clone(),
            TargetKind::Channel => {
                let server = self
                    .parent_path
                    .first()
                    .map_or("Server", String::as_str);
                format!("{} #{}", server, self.display_name)
            }
        }
    }
}

/// Configuration snapshot shared read-only by all per-target operations.
///
/// Captured once when the batch starts; the pipeline never reads settings
/// storage directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Write the raw JSON artifact.
    pub include_json: bool,
    /// Write the formatted transcript artifact.
    pub include_formatted_text: bool,
    /// Download and write attachments.
    pub include_attachments: bool,
    /// Append `(edited at ...)` to edited messages in the transcript.
    pub include_edited_timestamp: bool,
    /// Prefix pinned messages with `[PINNED] ` in the transcript.
    pub include_pinned_marker: bool,
    /// Render reply reference blocks in the transcript.
    pub include_reply_reference: bool,
    /// Retain only messages at or before this instant.
    pub before_filter: Option<DateTime<Utc>>,
    /// Retain only messages at or after this instant.
    pub after_filter: Option<DateTime<Utc>>,
    /// Root directory for all written artifacts.
    pub output_root: PathBuf,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_json: false,
            include_formatted_text: true,
            include_attachments: false,
            include_edited_timestamp: true,
            include_pinned_marker: true,
            include_reply_reference: true,
            before_filter: None,
            after_filter: None,
            output_root: PathBuf::from("exports"),
        }
    }
}

impl ExportOptions {
    /// Whether at least one artifact kind is enabled.
    #[must_use]
    pub const fn any_artifact(&self) -> bool {
        self.include_json || self.include_formatted_text || self.include_attachments
    }
}

/// Lifecycle of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    /// No run in progress.
    Idle,
    /// Targets are being processed.
    Running,
    /// Cancel requested; the in-flight target is draining.
    Cancelling,
    /// All targets processed.
    Completed,
    /// The run aborted before or during processing.
    Failed,
    /// The run was cancelled; remaining targets were not started.
    Cancelled,
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Cancelling => "cancelling",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// Paths written for one target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrittenPaths {
    /// The JSON artifact, if written.
    pub json_path: Option<PathBuf>,
    /// The transcript artifact, if written.
    pub txt_path: Option<PathBuf>,
    /// The per-target attachments directory, if any attachment was written.
    pub attachments_dir: Option<PathBuf>,
    /// Number of attachments written.
    pub attachments_saved: usize,
}

/// Terminal result for one target within a batch.
#[derive(Debug, Clone)]
pub enum TargetOutcome {
    /// All requested artifacts were produced.
    Succeeded(WrittenPaths),
    /// Text/JSON artifacts were produced but some attachments failed.
    Partial {
        written: WrittenPaths,
        failed_attachments: usize,
    },
    /// The target failed and was skipped over.
    Failed { reason: String },
    /// The target was never started (run cancelled first).
    Skipped,
}

impl TargetOutcome {
    /// Whether any artifact was produced for the target.
    #[must_use]
    pub const fn produced_output(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Partial { .. })
    }
}

/// Per-target report carried in the run summary.
#[derive(Debug, Clone)]
pub struct TargetReport {
    /// The target this report describes.
    pub target: ExportTarget,
    /// How the target ended.
    pub outcome: TargetOutcome,
}

/// Final summary of a batch run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Terminal status of the run.
    pub status: BatchStatus,
    /// One report per target, in processing order.
    pub reports: Vec<TargetReport>,
}

impl RunSummary {
    /// Count of targets that produced output (full or partial).
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| r.outcome.produced_output())
            .count()
    }

    /// Count of targets that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, TargetOutcome::Failed { .. }))
            .count()
    }

    /// Count of targets never started.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, TargetOutcome::Skipped))
            .count()
    }

    /// Paths of the last target that produced output, for "open folder" flows.
    #[must_use]
    pub fn last_written(&self) -> Option<&WrittenPaths> {
        self.reports.iter().rev().find_map(|r| match &r.outcome {
            TargetOutcome::Succeeded(paths) | TargetOutcome::Partial { written: paths, .. } => {
                Some(paths)
            }
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_label() {
        let dm = ExportTarget {
            target_id: "1".into(),
            display_name: "Alice".into(),
            parent_path: vec![],
            kind: TargetKind::Dm,
        };
        assert_eq!(dm.label(), "Alice");

        let channel = ExportTarget {
            target_id: "2".into(),
            display_name: "general".into(),
            parent_path: vec!["Guild".into()],
            kind: TargetKind::Channel,
        };
        assert_eq!(channel.label(), "Guild #general");
    }

    #[test]
    fn test_default_options() {
        let options = ExportOptions::default();
        assert!(options.include_formatted_text);
        assert!(!options.include_json);
        assert!(options.any_artifact());
    }

    #[test]
    fn test_summary_counts() {
        let target = ExportTarget {
            target_id: "1".into(),
            display_name: "Alice".into(),
            parent_path: vec![],
            kind: TargetKind::Dm,
        };
        let summary = RunSummary {
            status: BatchStatus::Completed,
            reports: vec![
                TargetReport {
                    target: target.clone(),
                    outcome: TargetOutcome::Succeeded(WrittenPaths::default()),
                },
                TargetReport {
                    target: target.clone(),
                    outcome: TargetOutcome::Failed {
                        reason: "boom".into(),
                    },
                },
                TargetReport {
                    target,
                    outcome: TargetOutcome::Skipped,
                },
            ],
        };
        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.skipped(), 1);
    }
}
