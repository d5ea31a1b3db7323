//! Observer events emitted by the batch orchestrator.
//!
//! Events are pushed over an ordered channel so observers (a UI, the CLI
//! progress printer, tests) never poll or block the worker. Emission order
//! follows processing order; `ProgressUpdated` indices are strictly
//! increasing, one per processed target.

use std::time::Duration;

use crate::domain::{ExportTarget, RunSummary};

/// One pipeline event.
#[derive(Debug, Clone)]
pub enum ExportEvent {
    /// A batch run began.
    RunStarted {
        /// Number of targets in the run.
        total: usize,
    },
    /// Fetching began for a target.
    FetchStarted {
        /// The target being fetched, 1-based position and total.
        target: ExportTarget,
        index: usize,
        total: usize,
    },
    /// The source signalled a rate limit; the worker is waiting it out.
    RateLimitWait {
        /// Target whose page fetch is being retried.
        target_id: String,
        /// The wait the remote API demanded.
        delay: Duration,
    },
    /// A target's transcript was formatted; carries a rendering excerpt.
    PreviewUpdated {
        target: ExportTarget,
        excerpt: String,
    },
    /// A target finished processing (successfully or not).
    ProgressUpdated {
        /// 1-based count of processed targets.
        index: usize,
        total: usize,
    },
    /// A target failed and the run moved on.
    TargetFailed {
        target: ExportTarget,
        reason: String,
    },
    /// The run reached a terminal state.
    RunCompleted {
        summary: RunSummary,
    },
}
