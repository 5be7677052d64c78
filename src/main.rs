//! eicbuild CLI: build trees from the files in a list or directory.

use anyhow::Result;
use clap::Parser;
use eicbuild::engine::arg_parser::Cli;
use eicbuild::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
