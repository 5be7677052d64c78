//! eicbuild: batch builder for eic-smear event trees
//!
//! Converts a list of Monte-Carlo text files (optionally gzip or bzip2 compressed) into ROOT
//! tree files over a fixed pool of worker threads. Compressed inputs are decompressed before
//! the build and recompressed afterwards.

pub mod engine;
pub mod pipeline;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use engine::{Archiver, CommandArchiver, Compression, Job, RootTreeBuilder, TreeBuilder};
pub use pipeline::{BatchDriver, WorkQueue};

use std::path::PathBuf;
use std::sync::Arc;

/// Result alias used by public eicbuild API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Build a tree for every file in `files` and return one report per file.
///
/// Starts `opts.workers` workers, enqueues the files in order, waits for all of them and joins
/// the workers before returning. Per-file failures are in the summary, never in the `Err`;
/// an `Err` means the pool itself could not run (e.g. `workers == 0`).
///
/// ```ignore
/// let builder = eicbuild::RootTreeBuilder::new("root", "libeicsmear");
/// let summary = eicbuild::build_list(
///     &files,
///     &eicbuild::BuildOpts { workers: 4, ..Default::default() },
///     std::sync::Arc::new(builder),
///     std::sync::Arc::new(eicbuild::CommandArchiver),
/// )?;
/// println!("{} built, {} failed", summary.built(), summary.failed());
/// ```
pub fn build_list(
    files: &[PathBuf],
    opts: &BuildOpts,
    builder: Arc<dyn TreeBuilder>,
    archiver: Arc<dyn Archiver>,
) -> Result<BatchSummary> {
    pipeline::build_list(files, opts, builder, archiver)
}
