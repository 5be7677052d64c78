//! Worker threads: each drains the shared queue and reports every job it finishes.

use anyhow::{Context, Result};
use log::{debug, error};
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crate::engine::job::panic_message;
use crate::utils::config::PackagePaths;
use crate::{FailureStage, JobOutcome, JobReport};

use super::context::WorkerShared;

/// Single worker: pop a job, process it, send its report, acknowledge it. Exits when the
/// queue is closed and drained.
fn worker_loop(shared: WorkerShared) {
    let ctx = shared.job_context();
    while let Some(job) = shared.queue.dequeue() {
        let report = panic::catch_unwind(AssertUnwindSafe(|| job.process(&ctx))).unwrap_or_else(
            |payload| {
                let message = panic_message(&*payload);
                error!("Job for {} panicked: {}", job.input().display(), message);
                JobReport {
                    input: job.input().to_path_buf(),
                    output: None,
                    outcome: JobOutcome::Failed {
                        stage: FailureStage::Build,
                        message,
                    },
                    rezipped: false,
                    elapsed_ms: 0,
                }
            },
        );
        // Report before acknowledging so the driver has every report once join returns.
        let _ = shared.report_tx.send(report);
        if let Err(e) = shared.queue.task_done() {
            error!("{:#}", e);
        }
    }
    debug!("queue closed, worker exiting");
}

/// Spawn `num_workers` named workers over `shared`. Caller closes the queue and joins the
/// handles to stop them.
pub fn spawn_workers(shared: &WorkerShared, num_workers: usize) -> Result<Vec<JoinHandle<()>>> {
    (0..num_workers)
        .map(|id| {
            let shared = shared.clone();
            thread::Builder::new()
                .name(PackagePaths::get().worker_name(id))
                .spawn(move || worker_loop(shared))
                .with_context(|| format!("spawn worker {}", id))
        })
        .collect()
}
