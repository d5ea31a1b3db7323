//! CLI interface using clap.
//!
//! Provides command-line arguments and subcommands for the exporter.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use clap::{Parser, Subcommand};

/// ArchiveCord - batch exporter for DM and channel message history.
#[derive(Parser, Debug)]
#[command(name = "archivecord")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a selection file and list the targets it expands to.
    Targets {
        /// Selection manifest (JSON) describing checked DMs and channels.
        selection: PathBuf,
    },

    /// Run a batch export over every target in the selection.
    Export {
        /// Selection manifest (JSON) describing checked DMs and channels.
        selection: PathBuf,

        /// Snapshot directory to read message pages from.
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Output root directory (defaults to the configured export root).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only include messages at or after this bound
        /// (YYYY-MM-DD or "YYYY-MM-DD HH:MM").
        #[arg(long)]
        after: Option<String>,

        /// Only include messages at or before this bound
        /// (YYYY-MM-DD or "YYYY-MM-DD HH:MM").
        #[arg(long)]
        before: Option<String>,

        /// Also write the raw message JSON next to the transcript.
        #[arg(long)]
        json: bool,

        /// Skip the formatted text transcript.
        #[arg(long)]
        no_txt: bool,

        /// Download attachments into a per-target folder.
        #[arg(long)]
        attachments: bool,

        /// Omit "(edited at ...)" annotations from transcripts.
        #[arg(long)]
        no_edited: bool,

        /// Omit the [PINNED] prefix from transcripts.
        #[arg(long)]
        no_pinned: bool,

        /// Omit "(Replying to ...)" lines from transcripts.
        #[arg(long)]
        no_replies: bool,
    },

    /// Show the configuration file, creating it with defaults if missing.
    Config {
        /// Overwrite the file with default settings.
        #[arg(long)]
        reset: bool,
    },

    /// Show the data, export, and log directories being used.
    Paths,
}

/// Parse a filter bound from the command line.
///
/// Accepts `YYYY-MM-DD HH:MM` or a bare date. A bare date expands to the
/// start of the day for `--after` and the end of the day for `--before`,
/// keeping both bounds inclusive.
pub fn parse_bound(input: &str, end_of_day: bool) -> Result<DateTime<Utc>, String> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{input}': expected YYYY-MM-DD or YYYY-MM-DD HH:MM"))?;
    let (hour, minute, second) = if end_of_day { (23, 59, 59) } else { (0, 0, 0) };
    let naive = date
        .and_hms_opt(hour, minute, second)
        .ok_or_else(|| format!("Invalid date '{input}'"))?;
    Ok(Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_bound_with_time() {
        let bound = parse_bound("2024-03-10 14:30", false).unwrap();
        assert_eq!(bound.hour(), 14);
        assert_eq!(bound.minute(), 30);
    }

    #[test]
    fn test_parse_bound_bare_date_expands_by_direction() {
        let after = parse_bound("2024-03-10", false).unwrap();
        let before = parse_bound("2024-03-10", true).unwrap();
        assert_eq!(after.hour(), 0);
        assert_eq!(before.hour(), 23);
        assert_eq!(before.second(), 59);
    }

    #[test]
    fn test_parse_bound_rejects_garbage() {
        assert!(parse_bound("yesterday", false).is_err());
    }
}
