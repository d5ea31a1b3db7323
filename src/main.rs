//! ArchiveCord - batch exporter for DM and channel message history.
//!
//! Resolves a selection of DMs and server channels into a flat list of
//! export targets, then drives each one through fetch, filter, format, and
//! write. Runs are strictly sequential, survive per-target failures, honor
//! rate limits with uncapped retries, and can be cancelled between targets.

mod application;
mod cli;
mod domain;
mod infrastructure;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};
use tokio::sync::mpsc;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use application::{BatchOrchestrator, ExportEvent};
use cli::{parse_bound, Cli, Commands};
use domain::{ExportOptions, ExportTarget, RunSummary, SelectionManifest, TargetOutcome};
use infrastructure::{load_config, RunLog, SnapshotSource};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        // Distinguish aborted runs from usage/configuration errors.
        std::process::exit(if e.is_run_scoped() { 2 } else { 1 });
    }
}

/// Main application logic.
async fn run(cli: Cli) -> domain::Result<()> {
    match cli.command {
        Commands::Targets { selection } => {
            cmd_targets(&selection)?;
        }
        Commands::Export {
            selection,
            snapshot,
            output,
            after,
            before,
            json,
            no_txt,
            attachments,
            no_edited,
            no_pinned,
            no_replies,
        } => {
            let overrides = ExportOverrides {
                output,
                after,
                before,
                json,
                no_txt,
                attachments,
                no_edited,
                no_pinned,
                no_replies,
            };
            cmd_export(&selection, &snapshot, overrides).await?;
        }
        Commands::Config { reset } => {
            cmd_config(reset)?;
        }
        Commands::Paths => {
            cmd_paths()?;
        }
    }

    Ok(())
}

/// Resolve a selection file and print the target list.
fn cmd_targets(selection: &Path) -> domain::Result<()> {
    let targets = resolve_selection(selection)?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Kind", "Target", "Path", "ID"]);

    for target in &targets {
        table.add_row(vec![
            target.kind.to_string(),
            target.display_name.clone(),
            target.parent_path.join(" / "),
            target.target_id.clone(),
        ]);
    }

    println!("{table}");
    println!();
    println!("Total: {} target(s)", targets.len());

    Ok(())
}

/// Command-line overrides layered on top of the configured defaults.
struct ExportOverrides {
    output: Option<PathBuf>,
    after: Option<String>,
    before: Option<String>,
    json: bool,
    no_txt: bool,
    attachments: bool,
    no_edited: bool,
    no_pinned: bool,
    no_replies: bool,
}

/// Run a batch export over every resolved target.
async fn cmd_export(
    selection: &Path,
    snapshot: &Path,
    overrides: ExportOverrides,
) -> domain::Result<()> {
    let config = load_config()?;
    let targets = resolve_selection(selection)?;
    let options = build_options(&config, overrides)?;
    let logs_dir = config.logs_dir();

    let source = SnapshotSource::open(snapshot.to_path_buf())?;

    let run_time = Utc::now();
    let run_log = RunLog::create(&logs_dir, run_time)?;
    match RunLog::prune(&logs_dir) {
        Ok(removed) if removed > 0 => tracing::debug!(removed, "Pruned old run logs"),
        Ok(_) => {}
        Err(e) => warn!(error = %e, "Run log pruning failed"),
    }

    let (tx, rx) = mpsc::unbounded_channel();
    let orchestrator = Arc::new(BatchOrchestrator::new(
        source, run_log, logs_dir, run_time, tx,
    ));

    // Ctrl-C cancels between targets; the in-flight target finishes.
    let canceller = Arc::clone(&orchestrator);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n{}", "Cancelling after the current target...".yellow());
            canceller.cancel();
        }
    });

    let printer = tokio::spawn(print_events(rx));
    let summary = orchestrator.start(targets, options.clone()).await?;
    let _ = printer.await;

    print_summary(&summary, &options);
    Ok(())
}

/// Show the configuration file, creating it with defaults if missing.
fn cmd_config(reset: bool) -> domain::Result<()> {
    if reset {
        infrastructure::save_config(&infrastructure::AppConfig::default())?;
        println!("{} configuration reset to defaults", "✓".green());
    }
    infrastructure::ensure_config_exists()?;
    let path = infrastructure::config::config_file_path();

    println!("{} {}", "Config file:".bold(), path.display());
    println!();
    let contents = std::fs::read_to_string(&path)
        .map_err(|e| domain::AppError::io(format!("Failed to read {}", path.display()), e))?;
    println!("{contents}");

    Ok(())
}

/// Show the data, export, and log directories being used.
fn cmd_paths() -> domain::Result<()> {
    let config = load_config()?;

    println!("{}", "ArchiveCord Paths".bold());
    println!();
    println!(
        "  {} {}",
        "config:".cyan(),
        infrastructure::config::config_file_path().display()
    );
    println!(
        "  {} {}",
        "data:".cyan(),
        infrastructure::paths::default_data_dir().display()
    );
    println!("  {} {}", "exports:".cyan(), config.output_root().display());
    println!("  {} {}", "logs:".cyan(), config.logs_dir().display());

    Ok(())
}

/// Read and resolve a selection manifest into export targets.
fn resolve_selection(selection: &Path) -> domain::Result<Vec<ExportTarget>> {
    let raw = std::fs::read_to_string(selection)
        .map_err(|e| domain::AppError::io(format!("Failed to read {}", selection.display()), e))?;
    let manifest = SelectionManifest::from_json(&raw)?;
    manifest.to_tree().resolve()
}

/// Layer command-line overrides on top of the configured defaults.
fn build_options(
    config: &infrastructure::AppConfig,
    overrides: ExportOverrides,
) -> domain::Result<ExportOptions> {
    let mut options = config.export_options();

    if let Some(root) = overrides.output {
        options.output_root = root;
    }
    if let Some(raw) = overrides.after.as_deref() {
        options.after_filter =
            Some(parse_bound(raw, false).map_err(|message| domain::AppError::Config { message })?);
    }
    if let Some(raw) = overrides.before.as_deref() {
        options.before_filter =
            Some(parse_bound(raw, true).map_err(|message| domain::AppError::Config { message })?);
    }
    if overrides.json {
        options.include_json = true;
    }
    if overrides.no_txt {
        options.include_formatted_text = false;
    }
    if overrides.attachments {
        options.include_attachments = true;
    }
    if overrides.no_edited {
        options.include_edited_timestamp = false;
    }
    if overrides.no_pinned {
        options.include_pinned_marker = false;
    }
    if overrides.no_replies {
        options.include_reply_reference = false;
    }

    if !options.any_artifact() {
        return Err(domain::AppError::Config {
            message: "Nothing to export: enable at least one of txt, json, attachments"
                .to_string(),
        });
    }

    Ok(options)
}

/// Print pipeline events as they arrive; returns after the run completes.
async fn print_events(mut rx: mpsc::UnboundedReceiver<ExportEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            ExportEvent::RunStarted { total } => {
                println!("Starting export of {total} target(s)");
            }
            ExportEvent::FetchStarted { target, index, total } => {
                println!("[{index}/{total}] {}", target.label().cyan());
            }
            ExportEvent::RateLimitWait { delay, .. } => {
                println!(
                    "  {} rate limited, waiting {}ms",
                    "…".yellow(),
                    delay.as_millis()
                );
            }
            ExportEvent::PreviewUpdated { .. } => {}
            ExportEvent::ProgressUpdated { index, total } => {
                println!("  {} {index}/{total} done", "✓".green());
            }
            ExportEvent::TargetFailed { target, reason } => {
                println!("  {} {}: {reason}", "✗".red(), target.label());
            }
            ExportEvent::RunCompleted { .. } => break,
        }
    }
}

/// Print the per-target summary table and totals.
fn print_summary(summary: &RunSummary, options: &ExportOptions) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Target", "Outcome", "Output"]);

    for report in &summary.reports {
        let (outcome, output) = match &report.outcome {
            TargetOutcome::Succeeded(paths) => {
                ("ok".to_string(), written_path_display(paths))
            }
            TargetOutcome::Partial { written, failed_attachments } => (
                format!("partial ({failed_attachments} attachment(s) failed)"),
                written_path_display(written),
            ),
            TargetOutcome::Failed { reason } => (format!("failed: {reason}"), "-".to_string()),
            TargetOutcome::Skipped => ("skipped".to_string(), "-".to_string()),
        };
        table.add_row(vec![report.target.label(), outcome, output]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "{} {} succeeded, {} failed, {} skipped ({})",
        status_marker(summary),
        summary.succeeded().to_string().green(),
        summary.failed().to_string().red(),
        summary.skipped(),
        summary.status
    );
    println!("Output root: {}", options.output_root.display());
    if let Some(last) = summary.last_written() {
        println!("Last written: {}", written_path_display(last));
    }
}

fn written_path_display(paths: &domain::WrittenPaths) -> String {
    paths
        .txt_path
        .as_deref()
        .or(paths.json_path.as_deref())
        .map_or_else(|| "-".to_string(), |p| p.display().to_string())
}

fn status_marker(summary: &RunSummary) -> colored::ColoredString {
    if summary.failed() > 0 {
        "✗".red().bold()
    } else {
        "✓".green().bold()
    }
}

/// Setup tracing/logging based on verbosity level.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
