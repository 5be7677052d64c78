//! CLI command handler: resolve inputs and runtime, then build every file.

use anyhow::{Context, Result};
use log::debug;
use std::path::Path;
use std::sync::Arc;

use crate::engine::archive::CommandArchiver;
use crate::engine::arg_parser::Cli;
use crate::engine::builder::RootTreeBuilder;
use crate::engine::tools::read_source;
use crate::pipeline::{build_list, log_batch_summary, write_summary_json};
use crate::utils::eicbuild_toml::{apply_file_to_opts, load_eicbuild_toml};
use crate::utils::{WorkerThreadLimits, load_dotenv, locate_runtime, setup_logging};
use crate::{DecompressFailurePolicy, Opts, event_cap};

/// Defaults, then `.eicbuild.toml` in `config_dir`, then CLI flags.
pub fn resolve_opts(cli: &Cli, config_dir: &Path) -> Opts {
    let mut opts = Opts::default();
    if let Some(file) = load_eicbuild_toml(config_dir) {
        apply_file_to_opts(&file, &mut opts);
    }
    if let Some(ref dir) = cli.outdir {
        opts.build.outdir = dir.clone();
    }
    if let Some(n) = cli.events {
        opts.build.max_events = event_cap(n);
    }
    if let Some(n) = cli.processes {
        opts.build.workers = n;
    }
    opts.build.workers = WorkerThreadLimits::current().resolve(opts.build.workers);
    if let Some(norezip) = cli.norezip {
        opts.build.rezip = !norezip;
    }
    if let Some(serial) = cli.serial_builds {
        opts.build.serialize_builds = serial;
    }
    if let Some(anyway) = cli.build_anyway {
        opts.build.on_decompress_failure = DecompressFailurePolicy::from_build_anyway(anyway);
    }
    if let Some(v) = cli.verbose {
        opts.verbose = v;
    }
    opts.build.progress = opts.verbose;
    if cli.root.is_some() {
        opts.root_executable = cli.root.clone();
    }
    if cli.library.is_some() {
        opts.library = cli.library.clone();
    }
    if cli.report.is_some() {
        opts.report_path = cli.report.clone();
    }
    opts
}

/// Build trees for every input named by `cli.source`. Startup problems (runtime not found,
/// bad source, unusable output directory) are errors; per-file failures only show in the summary.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("read current directory")?;
    let opts = resolve_opts(cli, &cwd);
    setup_logging(opts.verbose);
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        opts
    );

    load_dotenv(&cwd);
    let runtime = locate_runtime(&opts)?;
    let files = read_source(&cli.source)?;
    debug!("{} inputs from {}", files.len(), cli.source.display());

    std::fs::create_dir_all(&opts.build.outdir)
        .with_context(|| format!("create output directory {}", opts.build.outdir.display()))?;

    let builder = RootTreeBuilder::new(
        runtime.root_executable,
        runtime.library.to_string_lossy(),
    );
    let summary = build_list(
        &files,
        &opts.build,
        Arc::new(builder),
        Arc::new(CommandArchiver),
    )?;

    log_batch_summary(&summary, opts.verbose);
    if let Some(ref path) = opts.report_path {
        write_summary_json(&summary, path)?;
    }
    Ok(())
}
