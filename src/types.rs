//! Public and internal types for the eicbuild API and pipeline.

use serde::Serialize;
use std::path::PathBuf;

/// What to do when an input could not be decompressed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum DecompressFailurePolicy {
    /// Fail the job at the decompress stage; `BuildTree` is never handed a file that may still be compressed.
    #[default]
    FailJob,
    /// Build from the uncompressed name anyway (legacy `build.py` behavior).
    BuildAnyway,
}

impl DecompressFailurePolicy {
    /// Policy selected by a `build_anyway` flag (CLI or config file).
    pub fn from_build_anyway(anyway: bool) -> Self {
        if anyway {
            DecompressFailurePolicy::BuildAnyway
        } else {
            DecompressFailurePolicy::FailJob
        }
    }
}

/// Lib options for [`build_list`](crate::build_list) and [`BatchDriver`](crate::pipeline::BatchDriver).
#[derive(Clone, Debug)]
pub struct BuildOpts {
    /// Directory `BuildTree` writes tree files into.
    pub outdir: PathBuf,
    /// Maximum events per file. `None` reads every event.
    pub max_events: Option<u64>,
    /// Worker thread count. Must be at least 1.
    pub workers: usize,
    /// Recompress inputs that were decompressed for the build.
    pub rezip: bool,
    /// Run at most one `build_tree` call at a time (for builders that are not reentrant).
    pub serialize_builds: bool,
    pub on_decompress_failure: DecompressFailurePolicy,
    /// Show a progress bar over completed jobs.
    pub progress: bool,
}

impl Default for BuildOpts {
    fn default() -> Self {
        Self {
            outdir: PathBuf::from("."),
            max_events: None,
            workers: crate::utils::WorkerThreadLimits::DEFAULT_WORKERS,
            rezip: true,
            serialize_builds: false,
            on_decompress_failure: DecompressFailurePolicy::default(),
            progress: false,
        }
    }
}

/// Full options (CLI). Use [`BuildOpts`] for lib.
#[derive(Clone, Debug, Default)]
pub struct Opts {
    pub build: BuildOpts,
    /// Debug logging and progress bar.
    pub verbose: bool,
    /// Explicit ROOT executable. When None, located via `ROOTSYS` then `PATH`.
    pub root_executable: Option<PathBuf>,
    /// Explicit path to the event-tree shared library.
    pub library: Option<PathBuf>,
    /// Extra directories searched for the library after the loader path variables.
    pub library_paths: Vec<PathBuf>,
    /// Write the batch summary as JSON here.
    pub report_path: Option<PathBuf>,
}

/// Convert a signed event count (`<= 0` meaning all events, as `BuildTree` takes it) to a cap.
pub fn event_cap(n: i64) -> Option<u64> {
    (n > 0).then_some(n as u64)
}

/// Step of a job that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum FailureStage {
    Decompress,
    Build,
}

/// Result of processing one job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum JobOutcome {
    /// Extension not supported; nothing was run.
    Skipped,
    /// `BuildTree` returned successfully.
    Built,
    Failed { stage: FailureStage, message: String },
}

impl JobOutcome {
    pub fn is_built(&self) -> bool {
        matches!(self, JobOutcome::Built)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, JobOutcome::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, JobOutcome::Skipped)
    }
}

/// Per-job record sent from a worker back to the driver.
#[derive(Clone, Debug, Serialize)]
pub struct JobReport {
    /// Input as given in the file list.
    pub input: PathBuf,
    /// Tree file `BuildTree` writes for this input (None when skipped).
    pub output: Option<PathBuf>,
    pub outcome: JobOutcome,
    /// True when the input was decompressed and then recompressed successfully.
    pub rezipped: bool,
    pub elapsed_ms: u64,
}

/// Reports of one batch run, in completion order.
#[derive(Clone, Debug, Default, Serialize)]
pub struct BatchSummary {
    pub reports: Vec<JobReport>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.reports.len()
    }

    pub fn built(&self) -> usize {
        self.reports.iter().filter(|r| r.outcome.is_built()).count()
    }

    pub fn failed(&self) -> usize {
        self.reports.iter().filter(|r| r.outcome.is_failed()).count()
    }

    pub fn skipped(&self) -> usize {
        self.reports.iter().filter(|r| r.outcome.is_skipped()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &JobReport> {
        self.reports.iter().filter(|r| r.outcome.is_failed())
    }

    /// Report for `input`, if it was part of the batch.
    pub fn report_for(&self, input: &std::path::Path) -> Option<&JobReport> {
        self.reports.iter().find(|r| r.input == input)
    }
}
