//! Batch driver: owns one queue and its workers for the life of a batch run.

use anyhow::Result;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use log::debug;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::engine::archive::Archiver;
use crate::engine::builder::TreeBuilder;
use crate::engine::job::Job;
use crate::engine::progress::{finish_progress, job_progress, update_progress_bar};
use crate::pipeline::{self, WorkerShared, REPORT_POLL_INTERVAL};
use crate::{BatchSummary, BuildOpts, JobReport};

/// Owns one work queue and its worker threads.
///
/// [`start`](BatchDriver::start) spawns the workers, [`run`](BatchDriver::run) feeds them a
/// batch and waits for it, [`shutdown`](BatchDriver::shutdown) closes the queue and joins every
/// worker. Dropping the driver does the same as `shutdown`, so workers never outlive it.
pub struct BatchDriver {
    opts: BuildOpts,
    shared: WorkerShared,
    report_rx: Receiver<JobReport>,
    workers: Vec<JoinHandle<()>>,
    /// Set when a run bails. Its unreported jobs may still post reports.
    failed: bool,
}

impl BatchDriver {
    /// Spawn exactly `opts.workers` workers.
    pub fn start(
        opts: &BuildOpts,
        builder: Arc<dyn TreeBuilder>,
        archiver: Arc<dyn Archiver>,
    ) -> Result<Self> {
        if opts.workers == 0 {
            anyhow::bail!("worker count must be at least 1");
        }
        let channels = pipeline::create_pipeline_channels(opts, builder, archiver);
        let workers = match pipeline::spawn_workers(&channels.shared, opts.workers) {
            Ok(w) => w,
            Err(e) => {
                // Already-spawned workers exit once they see the queue closed.
                channels.shared.queue.close();
                return Err(e);
            }
        };
        debug!("Started {} workers", workers.len());
        Ok(Self {
            opts: opts.clone(),
            shared: channels.shared,
            report_rx: channels.report_rx,
            workers,
            failed: false,
        })
    }

    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    /// Enqueue one job per file in input order and block until every job is done.
    /// Returns one report per file. Nothing is cached between runs.
    ///
    /// After a run returns an error the driver refuses further runs; start a new one.
    pub fn run(&mut self, files: &[PathBuf]) -> Result<BatchSummary> {
        if self.failed {
            anyhow::bail!("batch driver is unusable after a failed run");
        }
        let result = self.run_batch(files);
        self.failed = result.is_err();
        result
    }

    fn run_batch(&mut self, files: &[PathBuf]) -> Result<BatchSummary> {
        let total = files.len();
        let bar = job_progress(self.opts.progress, total);
        for file in files {
            self.shared.queue.enqueue(Job::new(file, &self.opts))?;
        }
        debug!("Enqueued {} jobs", total);

        let mut summary = BatchSummary::default();
        while summary.reports.len() < total {
            match self.report_rx.recv_timeout(REPORT_POLL_INTERVAL) {
                Ok(report) => {
                    if let Some(bar) = &bar {
                        update_progress_bar(bar, 1);
                    }
                    summary.reports.push(report);
                }
                Err(RecvTimeoutError::Timeout) => {
                    if self.workers.iter().all(|h| h.is_finished()) {
                        anyhow::bail!(
                            "all workers exited with {} of {} jobs unreported",
                            total - summary.reports.len(),
                            total
                        );
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    anyhow::bail!("report channel closed")
                }
            }
        }
        finish_progress(&bar);

        self.shared.queue.join();
        Ok(summary)
    }

    /// Close the queue and join every worker.
    pub fn shutdown(mut self) -> Result<()> {
        self.close_and_join()
    }

    fn close_and_join(&mut self) -> Result<()> {
        self.shared.queue.close();
        let mut panicked = 0;
        for h in self.workers.drain(..) {
            if h.join().is_err() {
                panicked += 1;
            }
        }
        if panicked > 0 {
            anyhow::bail!("{} worker thread(s) panicked", panicked);
        }
        Ok(())
    }
}

impl Drop for BatchDriver {
    fn drop(&mut self) {
        if let Err(e) = self.close_and_join() {
            log::error!("{:#}", e);
        }
    }
}

/// Build trees for every file in `files` with a fresh driver: start, run, shut down.
pub fn build_list(
    files: &[PathBuf],
    opts: &BuildOpts,
    builder: Arc<dyn TreeBuilder>,
    archiver: Arc<dyn Archiver>,
) -> Result<BatchSummary> {
    let mut driver = BatchDriver::start(opts, builder, archiver)?;
    let summary = driver.run(files)?;
    driver.shutdown()?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::archive::Compression;
    use std::path::Path;

    struct Noop;

    impl TreeBuilder for Noop {
        fn build_tree(&self, _: &Path, _: &Path, _: Option<u64>) -> Result<()> {
            Ok(())
        }
    }

    impl Archiver for Noop {
        fn decompress(&self, _: &Path, _: Compression) -> Result<()> {
            Ok(())
        }

        fn compress(&self, _: &Path, _: Compression) -> Result<()> {
            Ok(())
        }
    }

    fn driver() -> BatchDriver {
        let opts = BuildOpts {
            workers: 2,
            ..Default::default()
        };
        BatchDriver::start(&opts, Arc::new(Noop), Arc::new(Noop)).unwrap()
    }

    #[test]
    fn test_failed_run_disables_driver() {
        let mut driver = driver();
        driver.shared.queue.close();
        let files = vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")];
        assert!(driver.run(&files).is_err());

        // An empty batch would otherwise succeed immediately.
        let err = driver.run(&[]).unwrap_err();
        assert!(format!("{:#}", err).contains("unusable after a failed run"));
    }

    #[test]
    fn test_successful_runs_stay_usable() {
        let mut driver = driver();
        for _ in 0..3 {
            let summary = driver.run(&[PathBuf::from("a.txt")]).unwrap();
            assert_eq!(summary.built(), 1);
        }
        driver.shutdown().unwrap();
    }
}
