//! Domain-level error types for archivecord.
//!
//! All errors are typed with `thiserror` and provide meaningful context
//! without exposing internal details to end users. Rate limiting is never
//! an error — the message source signals it explicitly so the orchestrator
//! can back off and retry.

use std::path::PathBuf;
use thiserror::Error;

/// Application-level errors covering run-scoped and target-scoped failures.
#[derive(Error, Debug)]
pub enum AppError {
    /// No checked DM or channel leaf in the selection tree.
    #[error("Nothing selected: check at least one DM or channel")]
    EmptySelection,

    /// Pre-flight writability check failed for a required directory.
    #[error("Directory is not writable: {path}")]
    NotWritable {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    /// An export batch is already running.
    #[error("An export is already running")]
    AlreadyRunning,

    /// Fetching messages for a target failed (target-scoped, not fatal to the run).
    #[error("Fetch failed for {target_id}: {message}")]
    Fetch {
        target_id: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An attachment download failed (recorded as a partial failure).
    #[error("Attachment download failed: {attachment_id}: {message}")]
    AttachmentDownload {
        attachment_id: String,
        message: String,
    },

    /// JSON parsing or serialization failed.
    #[error("JSON error: {message}")]
    JsonParse {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Configuration or environment error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO operation failed.
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl AppError {
    /// Create a target-scoped fetch error.
    pub fn fetch(target_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            target_id: target_id.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a JSON error.
    pub fn json_parse(err: serde_json::Error) -> Self {
        Self::JsonParse {
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create an IO error with context.
    pub fn io(message: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(err),
        }
    }

    /// Create a not-writable error for a directory.
    pub fn not_writable(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::NotWritable {
            path: path.into(),
            source: Some(err),
        }
    }

    /// Whether this error aborts the whole run (as opposed to one target).
    #[must_use]
    pub const fn is_run_scoped(&self) -> bool {
        matches!(
            self,
            Self::EmptySelection | Self::NotWritable { .. } | Self::AlreadyRunning
        )
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
