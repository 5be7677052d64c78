//! One input file's trip from (possibly compressed) text to a built tree.

use anyhow::Result;
use log::{debug, error, info, warn};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::engine::archive::{Archiver, Compression};
use crate::engine::builder::TreeBuilder;
use crate::engine::tools::{append_extension, expected_output_path, split_input_name};
use crate::utils::config::SUPPORTED_EXTENSIONS;
use crate::{BuildOpts, DecompressFailurePolicy, FailureStage, JobOutcome, JobReport};

/// Collaborators a job runs against. Borrowed from the worker for one `process` call.
#[derive(Clone, Copy)]
pub struct JobContext<'a> {
    pub builder: &'a dyn TreeBuilder,
    pub archiver: &'a dyn Archiver,
    pub on_decompress_failure: DecompressFailurePolicy,
}

/// One input file. Built by the driver at enqueue time and consumed once by a worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Job {
    input: PathBuf,
    base: PathBuf,
    extension: Option<String>,
    compression: Option<Compression>,
    outdir: PathBuf,
    max_events: Option<u64>,
    /// Only ever true for a compressed input.
    rezip: bool,
}

impl Job {
    pub fn new(input: impl Into<PathBuf>, opts: &BuildOpts) -> Self {
        let input = input.into();
        let name = split_input_name(&input);
        Self {
            rezip: opts.rezip && name.compression.is_some(),
            input,
            base: name.base,
            extension: name.extension,
            compression: name.compression,
            outdir: opts.outdir.clone(),
            max_events: opts.max_events,
        }
    }

    /// Path as it appeared in the file list.
    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    pub fn compression(&self) -> Option<Compression> {
        self.compression
    }

    pub fn rezip(&self) -> bool {
        self.rezip
    }

    pub fn is_supported(&self) -> bool {
        self.extension
            .as_deref()
            .is_some_and(|e| SUPPORTED_EXTENSIONS.contains(&e))
    }

    /// Uncompressed file name: base plus extension.
    pub fn filename(&self) -> PathBuf {
        match &self.extension {
            Some(ext) => append_extension(&self.base, ext),
            None => self.base.clone(),
        }
    }

    /// Name of the compressed input, if the job has one.
    pub fn compressed_filename(&self) -> Option<PathBuf> {
        self.compression
            .map(|c| append_extension(&self.filename(), c.extension()))
    }

    /// Decompress, build, recompress. Never fails: every problem ends up in the report.
    pub fn process(&self, ctx: &JobContext<'_>) -> JobReport {
        let start = Instant::now();
        if !self.is_supported() {
            debug!("Skipping {}: unsupported extension", self.input.display());
            return self.report(JobOutcome::Skipped, None, false, start);
        }
        let filename = self.filename();
        let output = expected_output_path(&filename, &self.outdir, self.max_events);

        let unzipped = match (self.compression, self.compressed_filename()) {
            (Some(c), Some(zipped)) => match catching_panics("archiver", || ctx.archiver.decompress(&zipped, c)) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Could not decompress {}: {:#}", zipped.display(), e);
                    if ctx.on_decompress_failure == DecompressFailurePolicy::FailJob {
                        let outcome = JobOutcome::Failed {
                            stage: FailureStage::Decompress,
                            message: format!("{:#}", e),
                        };
                        return self.report(outcome, Some(output), false, start);
                    }
                    false
                }
            },
            _ => false,
        };

        // Build errors never skip the rezip below.
        let built = catching_panics("builder", || {
            ctx.builder.build_tree(&filename, &self.outdir, self.max_events)
        });
        let outcome = match built {
            Ok(()) => {
                info!("Built {} -> {}", filename.display(), output.display());
                JobOutcome::Built
            }
            Err(e) => {
                error!("Error encountered building tree from {}: {:#}", filename.display(), e);
                JobOutcome::Failed {
                    stage: FailureStage::Build,
                    message: format!("{:#}", e),
                }
            }
        };

        let mut rezipped = false;
        if unzipped
            && self.rezip
            && let Some(c) = self.compression
        {
            info!("Rezipping {}", filename.display());
            match catching_panics("archiver", || ctx.archiver.compress(&filename, c)) {
                Ok(()) => rezipped = true,
                Err(e) => warn!("Could not rezip {}: {:#}", filename.display(), e),
            }
        }

        self.report(outcome, Some(output), rezipped, start)
    }

    fn report(
        &self,
        outcome: JobOutcome,
        output: Option<PathBuf>,
        rezipped: bool,
        start: Instant,
    ) -> JobReport {
        JobReport {
            input: self.input.clone(),
            output,
            outcome,
            rezipped,
            elapsed_ms: start.elapsed().as_millis() as u64,
        }
    }
}

/// Runs one collaborator call, turning a panic into an error so it stays in its stage.
fn catching_panics(who: &str, f: impl FnOnce() -> Result<()>) -> Result<()> {
    panic::catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|payload| Err(anyhow::anyhow!("{} panicked: {}", who, panic_message(&*payload))))
}

/// Text of a panic payload (`&str` or `String`), or a placeholder.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic>".to_string()
    }
}
