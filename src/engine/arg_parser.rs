use clap::Parser;
use std::path::PathBuf;

/// Build eic-smear trees from files in a list or directory.
#[derive(Clone, Debug, Parser)]
#[command(name = "eicbuild")]
#[command(about = "Build ROOT trees from Monte-Carlo text files listed in a file or found in a directory.")]
pub struct Cli {
    /// File holding one input name per line, or a directory whose entries are all inputs.
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Directory to write tree files to. Default: current directory.
    #[arg(long, short)]
    pub outdir: Option<PathBuf>,

    /// Maximum events per file. Values <= 0 read every event (default).
    #[arg(long, short, allow_negative_numbers = true, value_parser = clap::value_parser!(i64))]
    pub events: Option<i64>,

    /// Number of files built in parallel. 0 uses one worker per available thread. Default: 1.
    #[arg(long, short, value_parser = clap::value_parser!(usize))]
    pub processes: Option<usize>,

    /// Do not recompress inputs after building.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub norezip: Option<bool>,

    /// Run one build at a time while archives are still handled in parallel.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub serial_builds: Option<bool>,

    /// Build even when decompression failed (legacy behavior). Default: fail the job.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub build_anyway: Option<bool>,

    /// ROOT executable. Default: $EICBUILD_ROOT, $ROOTSYS/bin/root, then PATH.
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Path to libeicsmear. Default: $EICBUILD_LIBRARY, then the library search path.
    #[arg(long)]
    pub library: Option<PathBuf>,

    /// Write a JSON summary of every job to this file.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Verbose output and progress bar.
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,
}
