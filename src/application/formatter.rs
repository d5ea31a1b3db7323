//! Output formatting for filtered message batches.
//!
//! Produces the formatted transcript, the raw JSON artifact, and the short
//! preview excerpt streamed to observers. All functions are pure over the
//! filtered batch.

use std::collections::HashMap;

use crate::domain::{ExportOptions, Message, Result};

use super::filter::FilteredBatch;

/// Exact fallback rendered when a reply target is not in the retained set.
pub const UNKNOWN_REPLY: &str = "(Replying to Unknown User: Original message not found)";

/// Timestamp format used in transcript headers.
const STAMP: &str = "%Y-%m-%d %H:%M:%S";

/// Maximum number of transcript lines included in a preview excerpt.
const PREVIEW_LINES: usize = 40;

/// Render the formatted transcript for one target.
///
/// Message blocks appear in fetch order, separated by exactly one blank
/// line with no blank line after the last. Reply references are resolved
/// against the whole retained set: a reply whose original fell outside the
/// filter window (or was deleted) renders the documented fallback.
#[must_use]
pub fn render_transcript(batch: &FilteredBatch, options: &ExportOptions) -> String {
    let by_id: HashMap<&str, &Message> = batch
        .messages
        .iter()
        .map(|m| (m.id.as_str(), m))
        .collect();

    let blocks: Vec<String> = batch
        .messages
        .iter()
        .map(|m| render_block(m, &by_id, options))
        .collect();

    blocks.join("\n\n")
}

fn render_block(
    message: &Message,
    by_id: &HashMap<&str, &Message>,
    options: &ExportOptions,
) -> String {
    let mut block = String::new();

    if message.pinned && options.include_pinned_marker {
        block.push_str("[PINNED] ");
    }

    block.push_str(&message.author_tag);
    if let Some(nickname) = &message.author_nickname {
        block.push_str(&format!(" ({nickname})"));
    }
    block.push_str(&format!(" [{}]", message.timestamp.format(STAMP)));

    if options.include_edited_timestamp {
        if let Some(edited) = message.edited_timestamp {
            block.push_str(&format!(" (edited at {})", edited.format(STAMP)));
        }
    }
    block.push('\n');

    if options.include_reply_reference {
        if let Some(reply_to) = &message.reply_to_id {
            match by_id.get(reply_to.as_str()) {
                Some(original) => {
                    block.push_str(&format!(
                        "(Replying to {}: {})",
                        original.author_tag, original.content
                    ));
                }
                None => block.push_str(UNKNOWN_REPLY),
            }
            block.push('\n');
        }
    }

    block.push_str(&message.content);
    block
}

/// Serialize the retained messages verbatim as pretty JSON.
///
/// # Errors
/// Returns a JSON error if serialization fails.
pub fn render_json(batch: &FilteredBatch) -> Result<String> {
    serde_json::to_string_pretty(&batch.messages).map_err(crate::domain::AppError::json_parse)
}

/// Short excerpt of a transcript for live preview events.
#[must_use]
pub fn preview_excerpt(transcript: &str) -> String {
    let mut lines: Vec<&str> = transcript.lines().take(PREVIEW_LINES + 1).collect();
    let truncated = lines.len() > PREVIEW_LINES;
    if truncated {
        lines.truncate(PREVIEW_LINES);
    }
    let mut excerpt = lines.join("\n");
    if truncated {
        excerpt.push_str("\n…");
    }
    excerpt
}
