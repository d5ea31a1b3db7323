//! Application layer: the export pipeline.
//!
//! Filtering, transcript rendering, and the batch orchestrator that drives
//! targets through fetch, filter, format, and write.

pub mod events;
pub mod filter;
pub mod formatter;
pub mod orchestrator;

pub use events::ExportEvent;
pub use filter::{FilteredBatch, ManifestEntry};
pub use formatter::{preview_excerpt, render_json, render_transcript, UNKNOWN_REPLY};
pub use orchestrator::BatchOrchestrator;
