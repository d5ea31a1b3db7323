//! Infrastructure layer - external adapters (message source, filesystem).
//!
//! This layer handles all I/O: the message source port and its snapshot
//! implementation, the export writer, run logs, configuration and paths.

pub mod config;
pub mod paths;
pub mod run_log;
pub mod snapshot;
pub mod source;
pub mod writer;

pub use config::{ensure_config_exists, load_config, save_config, AppConfig};
pub use paths::{ensure_writable_directory, sanitize_path_segment};
pub use run_log::RunLog;
pub use snapshot::SnapshotSource;
pub use source::{FetchPage, MessageSource};
pub use writer::ExportWriter;
