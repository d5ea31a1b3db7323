//! Domain layer - core types and business rules.
//!
//! This layer contains pure models (messages, targets, selection tree,
//! batch state) and error types without any I/O dependencies.

pub mod error;
pub mod manifest;
pub mod models;
pub mod selection;

pub use error::{AppError, Result};
pub use manifest::SelectionManifest;
pub use models::{
    AttachmentRef, BatchStatus, ExportOptions, ExportTarget, Message, RunSummary, TargetKind,
    TargetOutcome, TargetReport, WrittenPaths,
};
pub use selection::{CheckState, NodeId, NodeKind, SelectionNode, SelectionTree};
