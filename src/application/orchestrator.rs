//! Batch orchestrator: drives the export pipeline over a list of targets.
//!
//! Targets are processed strictly sequentially. Rate-limit signals from the
//! source pause the worker for exactly the requested delay and never count
//! against the run; any other per-target failure is recorded and the run
//! moves on to the next target. Cancellation is cooperative and only honored
//! at target boundaries, so an in-flight target always reaches a terminal
//! outcome.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::events::ExportEvent;
use crate::application::filter;
use crate::application::formatter;
use crate::domain::{
    AppError, BatchStatus, ExportOptions, ExportTarget, Message, Result, RunSummary,
    TargetOutcome, TargetReport,
};
use crate::infrastructure::{ExportWriter, FetchPage, MessageSource, RunLog};

/// Runs export batches against a message source.
///
/// One orchestrator drives at most one run at a time; a second `start` while
/// a run is active is rejected with [`AppError::AlreadyRunning`]. Share the
/// orchestrator behind an `Arc` to cancel a run from another task.
pub struct BatchOrchestrator<S> {
    source: S,
    writer: ExportWriter,
    run_log: RunLog,
    logs_dir: PathBuf,
    events: UnboundedSender<ExportEvent>,
    cancel: Mutex<CancellationToken>,
    running: AtomicBool,
    status: Mutex<BatchStatus>,
}

impl<S: MessageSource> BatchOrchestrator<S> {
    /// Creates an orchestrator for a single run context.
    ///
    /// `run_time` stamps every artifact of the run (filenames, attachment
    /// directory) so repeated exports never overwrite each other.
    pub fn new(
        source: S,
        run_log: RunLog,
        logs_dir: PathBuf,
        run_time: DateTime<Utc>,
        events: UnboundedSender<ExportEvent>,
    ) -> Self {
        Self {
            source,
            writer: ExportWriter::new(run_time),
            run_log,
            logs_dir,
            events,
            cancel: Mutex::new(CancellationToken::new()),
            running: AtomicBool::new(false),
            status: Mutex::new(BatchStatus::Idle),
        }
    }

    /// Current run status, observable from other tasks.
    pub fn status(&self) -> BatchStatus {
        *self.status.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Requests cancellation of the active run.
    ///
    /// The in-flight target finishes; targets not yet started are skipped.
    /// Has no effect when no run is active.
    pub fn cancel(&self) {
        if !self.running.load(Ordering::SeqCst) {
            return;
        }
        self.set_status(BatchStatus::Cancelling);
        info!("cancellation requested, finishing in-flight target");
        self.run_log.append("Cancellation requested");
        self.current_token().cancel();
    }

    /// A clone of the run's cancellation token, for wiring signal handlers.
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.current_token()
    }

    fn current_token(&self) -> CancellationToken {
        self.cancel
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn cancel_requested(&self) -> bool {
        self.current_token().is_cancelled()
    }

    /// A cancelled token is spent; replace it so the next run starts clean.
    fn reset_cancel_token(&self) {
        let mut token = self
            .cancel
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if token.is_cancelled() {
            *token = CancellationToken::new();
        }
    }

    /// Runs the batch to completion and returns the summary.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::AlreadyRunning`] if a run is already active, or
    /// [`AppError::NotWritable`] if the preflight check on the output and
    /// log directories fails. Per-target failures do not surface here; they
    /// are captured in the summary's reports.
    pub async fn start(
        &self,
        targets: Vec<ExportTarget>,
        options: ExportOptions,
    ) -> Result<RunSummary> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(AppError::AlreadyRunning);
        }
        let result = self.run(targets, &options).await;
        self.reset_cancel_token();
        self.running.store(false, Ordering::SeqCst);
        result
    }

    async fn run(&self, targets: Vec<ExportTarget>, options: &ExportOptions) -> Result<RunSummary> {
        self.set_status(BatchStatus::Running);

        // One preflight per batch, before any target is touched.
        if let Err(err) = ExportWriter::preflight(options, &self.logs_dir) {
            self.run_log.append(&format!("Batch aborted: {err}"));
            self.set_status(BatchStatus::Failed);
            return Err(err);
        }

        let total = targets.len();
        self.emit(ExportEvent::RunStarted { total });
        self.run_log.append(&format!("Batch started: {total} target(s)"));
        info!(total, "batch started");

        let mut reports = Vec::with_capacity(total);
        let mut cancelled = false;

        for (position, target) in targets.into_iter().enumerate() {
            let index = position + 1;

            if self.cancel_requested() {
                cancelled = true;
                self.run_log.append(&format!("Skipped (cancelled): {}", target.label()));
                reports.push(TargetReport { target, outcome: TargetOutcome::Skipped });
                continue;
            }

            self.emit(ExportEvent::FetchStarted { target: target.clone(), index, total });
            self.run_log.append(&format!("[{index}/{total}] Exporting {}", target.label()));

            let outcome = self.process_target(&target, options).await;
            match &outcome {
                TargetOutcome::Succeeded(paths) => {
                    info!(target = %target.label(), attachments = paths.attachments_saved, "target exported");
                    self.run_log.append(&format!("Done: {}", target.label()));
                }
                TargetOutcome::Partial { failed_attachments, .. } => {
                    warn!(target = %target.label(), failed_attachments, "target exported with missing attachments");
                    self.run_log.append(&format!(
                        "Done with {failed_attachments} failed attachment(s): {}",
                        target.label()
                    ));
                }
                TargetOutcome::Failed { reason } => {
                    warn!(target = %target.label(), reason, "target failed");
                    self.run_log.append(&format!("Failed: {} ({reason})", target.label()));
                    self.emit(ExportEvent::TargetFailed {
                        target: target.clone(),
                        reason: reason.clone(),
                    });
                }
                TargetOutcome::Skipped => unreachable!("processed targets are never skipped"),
            }

            reports.push(TargetReport { target, outcome });
            self.emit(ExportEvent::ProgressUpdated { index, total });
        }

        let status = if cancelled { BatchStatus::Cancelled } else { BatchStatus::Completed };
        self.run_log.append(&format!("Batch finished: {status}"));
        info!(%status, "batch finished");

        let summary = RunSummary { status, reports };
        self.emit(ExportEvent::RunCompleted { summary: summary.clone() });
        self.set_status(status);
        Ok(summary)
    }

    /// Processes one target end to end; never propagates run-level errors.
    async fn process_target(&self, target: &ExportTarget, options: &ExportOptions) -> TargetOutcome {
        let messages = match self.fetch_all(target).await {
            Ok(messages) => messages,
            Err(err) => return TargetOutcome::Failed { reason: err.to_string() },
        };
        debug!(target = %target.label(), count = messages.len(), "fetch complete");

        let batch = filter::apply(messages, options);
        let transcript = formatter::render_transcript(&batch, options);
        self.emit(ExportEvent::PreviewUpdated {
            target: target.clone(),
            excerpt: formatter::preview_excerpt(&transcript),
        });

        let json_payload = if options.include_json {
            match formatter::render_json(&batch) {
                Ok(payload) => Some(payload),
                Err(err) => return TargetOutcome::Failed { reason: err.to_string() },
            }
        } else {
            None
        };

        let transcript_out = options.include_formatted_text.then_some(transcript.as_str());
        let mut written = match self
            .writer
            .write(target, transcript_out, json_payload.as_deref(), options)
            .await
        {
            Ok(paths) => paths,
            Err(err) => return TargetOutcome::Failed { reason: err.to_string() },
        };

        let mut failed_attachments = 0;
        if options.include_attachments && !batch.attachment_manifest.is_empty() {
            let dir = self.writer.attachments_dir(target, options);
            for entry in &batch.attachment_manifest {
                match self.source.download_attachment(&entry.attachment).await {
                    Ok(bytes) => {
                        match self.writer.write_attachment(&dir, &entry.suggested_filename, &bytes).await {
                            Ok(_) => {
                                written.attachments_saved += 1;
                                written.attachments_dir = Some(dir.clone());
                            }
                            Err(err) => {
                                failed_attachments += 1;
                                self.run_log.append(&format!(
                                    "Attachment write failed ({}): {err}",
                                    entry.suggested_filename
                                ));
                            }
                        }
                    }
                    Err(err) => {
                        failed_attachments += 1;
                        self.run_log.append(&format!(
                            "Attachment download failed ({}): {err}",
                            entry.suggested_filename
                        ));
                    }
                }
            }
        }

        if failed_attachments > 0 {
            TargetOutcome::Partial { written, failed_attachments }
        } else {
            TargetOutcome::Succeeded(written)
        }
    }

    /// Fetches the target's full history, oldest first.
    ///
    /// Rate-limit pages are retried after exactly the requested delay, with
    /// no retry cap; the cursor is not advanced, so the same page is asked
    /// for again.
    async fn fetch_all(&self, target: &ExportTarget) -> Result<Vec<Message>> {
        let mut messages = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self.source.fetch_page(&target.target_id, cursor.as_deref()).await?;
            match page {
                FetchPage::RateLimited { retry_after } => {
                    info!(target_id = %target.target_id, ?retry_after, "rate limited, waiting");
                    self.run_log.append(&format!(
                        "Rate limited on {}: waiting {}ms",
                        target.label(),
                        retry_after.as_millis()
                    ));
                    self.emit(ExportEvent::RateLimitWait {
                        target_id: target.target_id.clone(),
                        delay: retry_after,
                    });
                    tokio::time::sleep(retry_after).await;
                }
                FetchPage::Messages { messages: page, next_cursor } => {
                    messages.extend(page);
                    match next_cursor {
                        Some(next) => cursor = Some(next),
                        None => break,
                    }
                }
            }
        }
        Ok(messages)
    }

    fn set_status(&self, status: BatchStatus) {
        *self.status.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = status;
    }

    fn emit(&self, event: ExportEvent) {
        // A dropped receiver only means nobody is listening anymore.
        let _ = self.events.send(event);
    }
}
