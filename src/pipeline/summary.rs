//! End-of-run reporting: colored counts in the log and an optional JSON file.

use anyhow::{Context, Result};
use log::{info, warn};
use std::path::Path;

use crate::utils::Colors;
use crate::{BatchSummary, JobOutcome};

/// Log counts for a finished batch; list failures. In verbose mode also list skipped inputs.
pub fn log_batch_summary(summary: &BatchSummary, verbose: bool) {
    info!(
        "{} jobs | {} | {} | {}",
        summary.total(),
        Colors::colorize(Colors::BUILT, &format!("Built: {}", summary.built())),
        Colors::colorize(Colors::FAILED, &format!("Failed: {}", summary.failed())),
        Colors::colorize(Colors::SKIPPED, &format!("Skipped: {}", summary.skipped()))
    );
    for report in summary.failures() {
        if let JobOutcome::Failed { stage, message } = &report.outcome {
            warn!("{} ({:?}): {}", report.input.display(), stage, message);
        }
    }
    if verbose {
        for report in summary.reports.iter().filter(|r| r.outcome.is_skipped()) {
            eprintln!("  skipped: {}", report.input.display());
        }
    }
}

/// Write the summary as pretty JSON.
pub fn write_summary_json(summary: &BatchSummary, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("serialize batch summary")?;
    std::fs::write(path, json).with_context(|| format!("write report {}", path.display()))
}
