//! Snapshot-backed message source.
//!
//! Reads pages from a local snapshot directory instead of the network:
//! `<root>/<target_id>/page-0001.json`, `page-0002.json`, ... each holding
//! an oldest-first message array, and attachment blobs under
//! `<root>/attachments/<attachment id>`. This is the runnable adapter for
//! the CLI (the real transport client lives outside this crate) and the
//! fixture loader for pipeline tests.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::{AppError, AttachmentRef, Message, Result};

use super::source::{FetchPage, MessageSource};

/// Message source reading from a snapshot directory.
pub struct SnapshotSource {
    root: PathBuf,
}

impl SnapshotSource {
    /// Create a source over a snapshot root.
    ///
    /// # Errors
    /// Returns a config error if the root does not exist.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(AppError::Config {
                message: format!("Snapshot directory not found: {}", root.display()),
            });
        }
        Ok(Self { root })
    }

    fn page_path(&self, target_id: &str, page: u32) -> PathBuf {
        self.root
            .join(target_id)
            .join(format!("page-{page:04}.json"))
    }

    fn parse_cursor(cursor: Option<&str>) -> Result<u32> {
        match cursor {
            None => Ok(1),
            Some(raw) => raw.parse().map_err(|_| AppError::Config {
                message: format!("Malformed snapshot cursor: {raw}"),
            }),
        }
    }
}

#[async_trait]
impl MessageSource for SnapshotSource {
    async fn fetch_page(&self, target_id: &str, cursor: Option<&str>) -> Result<FetchPage> {
        let page = Self::parse_cursor(cursor)?;
        let path = self.page_path(target_id, page);

        let raw = tokio::fs::read(&path).await.map_err(|e| AppError::Fetch {
            target_id: target_id.to_string(),
            message: format!("Cannot read snapshot page {}", path.display()),
            source: Some(Box::new(e)),
        })?;

        let messages: Vec<Message> = serde_json::from_slice(&raw).map_err(|e| AppError::Fetch {
            target_id: target_id.to_string(),
            message: format!("Malformed snapshot page {}", path.display()),
            source: Some(Box::new(e)),
        })?;

        let next = page + 1;
        let next_cursor = if self.page_path(target_id, next).is_file() {
            Some(next.to_string())
        } else {
            None
        };

        tracing::debug!(target_id, page, count = messages.len(), "Snapshot page read");

        Ok(FetchPage::Messages {
            messages,
            next_cursor,
        })
    }

    async fn download_attachment(&self, attachment: &AttachmentRef) -> Result<Vec<u8>> {
        let path = self.root.join("attachments").join(&attachment.id);
        tokio::fs::read(&path)
            .await
            .map_err(|e| AppError::AttachmentDownload {
                attachment_id: attachment.id.clone(),
                message: format!("Cannot read {}: {e}", path.display()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    fn message(id: &str) -> Message {
        Message {
            id: id.into(),
            author_tag: "alice#1".into(),
            author_nickname: None,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
            edited_timestamp: None,
            pinned: false,
            content: "hi".into(),
            reply_to_id: None,
            attachments: vec![],
        }
    }

    fn write_page(root: &Path, target: &str, page: u32, messages: &[Message]) {
        let dir = root.join(target);
        std::fs::create_dir_all(&dir).unwrap();
        let raw = serde_json::to_vec(messages).unwrap();
        std::fs::write(dir.join(format!("page-{page:04}.json")), raw).unwrap();
    }

    #[tokio::test]
    async fn test_pages_chain_until_exhausted() {
        let dir = tempdir().unwrap();
        write_page(dir.path(), "c1", 1, &[message("m1")]);
        write_page(dir.path(), "c1", 2, &[message("m2")]);

        let source = SnapshotSource::open(dir.path()).unwrap();

        let first = source.fetch_page("c1", None).await.unwrap();
        let FetchPage::Messages {
            messages,
            next_cursor,
        } = first
        else {
            panic!("expected a message page");
        };
        assert_eq!(messages[0].id, "m1");
        let cursor = next_cursor.unwrap();

        let second = source.fetch_page("c1", Some(&cursor)).await.unwrap();
        let FetchPage::Messages {
            messages,
            next_cursor,
        } = second
        else {
            panic!("expected a message page");
        };
        assert_eq!(messages[0].id, "m2");
        assert!(next_cursor.is_none());
    }

    #[tokio::test]
    async fn test_missing_target_is_a_fetch_error() {
        let dir = tempdir().unwrap();
        let source = SnapshotSource::open(dir.path()).unwrap();
        let err = source.fetch_page("nope", None).await.unwrap_err();
        assert!(matches!(err, AppError::Fetch { .. }));
    }

    #[tokio::test]
    async fn test_attachment_bytes_round_trip() {
        let dir = tempdir().unwrap();
        let blobs = dir.path().join("attachments");
        std::fs::create_dir_all(&blobs).unwrap();
        std::fs::write(blobs.join("a1"), b"bytes").unwrap();

        let source = SnapshotSource::open(dir.path()).unwrap();
        let attachment = AttachmentRef {
            id: "a1".into(),
            filename: "pic.png".into(),
            url: String::new(),
            size_bytes: None,
        };
        assert_eq!(
            source.download_attachment(&attachment).await.unwrap(),
            b"bytes"
        );
    }
}
