//! Time-range filtering of retrieved messages.
//!
//! Pure reduction from a fetched message list to the retained set plus the
//! attachment manifest. No I/O happens here; the writer and orchestrator
//! consume the result.

use crate::domain::{AttachmentRef, ExportOptions, Message};

/// One attachment scheduled for download.
#[derive(Debug, Clone)]
pub struct ManifestEntry {
    /// Id of the message carrying the attachment.
    pub message_id: String,
    /// The attachment reference.
    pub attachment: AttachmentRef,
    /// Collision-safe filename to store the bytes under.
    pub suggested_filename: String,
}

/// The retained messages of one target, ready for formatting and writing.
#[derive(Debug, Clone, Default)]
pub struct FilteredBatch {
    /// Retained messages in fetch (oldest-first) order.
    pub messages: Vec<Message>,
    /// Attachments of retained messages; empty unless attachments are enabled.
    pub attachment_manifest: Vec<ManifestEntry>,
}

impl FilteredBatch {
    /// Number of retained messages.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

/// Apply the time-range filter and build the attachment manifest.
///
/// A message is retained iff it falls inside `[after, before]`, both bounds
/// inclusive and each treated as unbounded when unset. Message order is
/// preserved.
#[must_use]
pub fn apply(messages: Vec<Message>, options: &ExportOptions) -> FilteredBatch {
    let messages: Vec<Message> = messages
        .into_iter()
        .filter(|m| {
            options.after_filter.is_none_or(|after| m.timestamp >= after)
                && options.before_filter.is_none_or(|before| m.timestamp <= before)
        })
        .collect();

    let attachment_manifest = if options.include_attachments {
        messages
            .iter()
            .flat_map(|m| {
                m.attachments.iter().map(|a| ManifestEntry {
                    message_id: m.id.clone(),
                    attachment: a.clone(),
                    suggested_filename: a.suggested_filename(),
                })
            })
            .collect()
    } else {
        Vec::new()
    };

    FilteredBatch {
        messages,
        attachment_manifest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()
    }

    fn message(id: &str, hour: u32) -> Message {
        Message {
            id: id.into(),
            author_tag: "alice#1".into(),
            author_nickname: None,
            timestamp: at(hour),
            edited_timestamp: None,
            pinned: false,
            content: "hi".into(),
            reply_to_id: None,
            attachments: vec![],
        }
    }

    #[test]
    fn test_both_bounds_inclusive() {
        let options = ExportOptions {
            after_filter: Some(at(10)),
            before_filter: Some(at(12)),
            ..Default::default()
        };
        let batch = apply(
            vec![
                message("early", 9),
                message("low", 10),
                message("mid", 11),
                message("high", 12),
                message("late", 13),
            ],
            &options,
        );
        let ids: Vec<&str> = batch.messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["low", "mid", "high"]);
    }

    #[test]
    fn test_open_bounds_retain_everything() {
        let batch = apply(
            vec![message("a", 0), message("b", 23)],
            &ExportOptions::default(),
        );
        assert_eq!(batch.message_count(), 2);
    }

    #[test]
    fn test_only_after_bound() {
        let options = ExportOptions {
            after_filter: Some(at(11)),
            ..Default::default()
        };
        let batch = apply(vec![message("a", 10), message("b", 11)], &options);
        let ids: Vec<&str> = batch.messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[test]
    fn test_manifest_only_when_attachments_enabled() {
        let mut msg = message("a", 10);
        msg.attachments.push(AttachmentRef {
            id: "att1".into(),
            filename: "pic.png".into(),
            url: String::new(),
            size_bytes: Some(4),
        });

        let batch = apply(vec![msg.clone()], &ExportOptions::default());
        assert!(batch.attachment_manifest.is_empty());

        let options = ExportOptions {
            include_attachments: true,
            ..Default::default()
        };
        let batch = apply(vec![msg], &options);
        assert_eq!(batch.attachment_manifest.len(), 1);
        assert_eq!(batch.attachment_manifest[0].suggested_filename, "att1_pic.png");
        assert_eq!(batch.attachment_manifest[0].message_id, "a");
    }

    #[test]
    fn test_filtered_out_attachments_not_in_manifest() {
        let mut msg = message("a", 9);
        msg.attachments.push(AttachmentRef {
            id: "att1".into(),
            filename: "pic.png".into(),
            url: String::new(),
            size_bytes: None,
        });
        let options = ExportOptions {
            include_attachments: true,
            after_filter: Some(at(10)),
            ..Default::default()
        };
        let batch = apply(vec![msg], &options);
        assert!(batch.attachment_manifest.is_empty());
    }
}
