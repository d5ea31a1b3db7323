//! Message source port.
//!
//! The abstract capability wrapping the remote messaging API. The pipeline
//! never talks to the network itself; it consumes pages and attachment
//! bytes through this trait, which a transport client (or a test double)
//! implements.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{AttachmentRef, Message, Result};

/// One `fetch_page` response.
#[derive(Debug)]
pub enum FetchPage {
    /// A page of messages and an optional continuation cursor.
    Messages {
        /// Messages in oldest-first order.
        messages: Vec<Message>,
        /// Cursor for the next page; `None` means the target is exhausted.
        next_cursor: Option<String>,
    },
    /// The remote API asked the caller to wait before retrying this page.
    ///
    /// Signalled explicitly rather than raised as an error so the
    /// orchestrator can apply backoff uniformly and retry without limit.
    RateLimited {
        /// Required wait before repeating the same page request.
        retry_after: Duration,
    },
}

/// Paginated access to a remote conversation plus attachment retrieval.
///
/// Ordering contract: within one target, pages arrive oldest-first and each
/// page's messages are oldest-first, so concatenating pages in fetch order
/// yields a monotonic transcript. Callers must not reorder messages.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Fetch one page of messages for a target.
    ///
    /// `cursor` is `None` for the first page, otherwise the `next_cursor`
    /// of the previous page.
    ///
    /// # Errors
    /// Returns a fetch error for anything other than rate limiting; rate
    /// limiting is reported in-band via [`FetchPage::RateLimited`].
    async fn fetch_page(&self, target_id: &str, cursor: Option<&str>) -> Result<FetchPage>;

    /// Download the bytes of one attachment.
    ///
    /// # Errors
    /// Returns an attachment download error; the caller records it as a
    /// partial failure for the owning target.
    async fn download_attachment(&self, attachment: &AttachmentRef) -> Result<Vec<u8>>;
}
