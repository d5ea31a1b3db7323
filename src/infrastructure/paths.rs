//! Path resolution and filesystem hygiene.
//!
//! Default data/output/log directories, path-segment sanitization for
//! names coming from the remote API, and the writability probe used by the
//! pre-flight check.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{AppError, Result};

/// Characters never allowed in a path segment on any supported platform.
const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Get the default data directory path.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".archivecord")
}

/// Default root for exported artifacts.
#[must_use]
pub fn default_export_root() -> PathBuf {
    default_data_dir().join("exports")
}

/// Default directory for run logs.
#[must_use]
pub fn default_logs_dir() -> PathBuf {
    default_data_dir().join("logs")
}

/// Sanitize a display name for use as a single path segment.
///
/// Server, channel and DM names come from the remote API and may contain
/// separators or reserved characters; those become underscores. Leading and
/// trailing dots/spaces are trimmed so Windows does not reject the segment.
#[must_use]
pub fn sanitize_path_segment(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if FORBIDDEN.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    let trimmed = cleaned.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Ensure a directory exists and is writable by creating it and writing a
/// probe file.
///
/// # Errors
/// Returns [`AppError::NotWritable`] if the directory cannot be created or
/// written to.
pub fn ensure_writable_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| AppError::not_writable(path, e))?;

    let probe = path.join(".archivecord-write-probe");
    fs::write(&probe, b"probe").map_err(|e| AppError::not_writable(path, e))?;
    fs::remove_file(&probe).map_err(|e| AppError::not_writable(path, e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_sanitize_replaces_separators() {
        assert_eq!(sanitize_path_segment("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_path_segment("name: weird?"), "name_ weird_");
    }

    #[test]
    fn test_sanitize_trims_dots_and_spaces() {
        assert_eq!(sanitize_path_segment("  .hidden. "), "hidden");
        assert_eq!(sanitize_path_segment("..."), "untitled");
        assert_eq!(sanitize_path_segment(""), "untitled");
    }

    #[test]
    fn test_sanitize_keeps_unicode() {
        assert_eq!(sanitize_path_segment("café ☕"), "café ☕");
    }

    #[test]
    fn test_writable_probe_creates_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_writable_directory(&nested).unwrap();
        assert!(nested.is_dir());
        assert!(!nested.join(".archivecord-write-probe").exists());
    }
}
