//! Compressed-input handling: detect the archive type by extension and run the
//! matching tool before and after a build.

use anyhow::{Context, Result};
use log::debug;
use serde::Serialize;
use std::path::Path;
use std::process::Command;

/// Compression formats recognized on input files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Compression {
    Gzip,
    Bzip2,
}

impl Compression {
    pub const ALL: [Compression; 2] = [Compression::Gzip, Compression::Bzip2];

    /// Match an extension (without the dot), e.g. `gz`.
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.extension() == ext)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Compression::Gzip => "gz",
            Compression::Bzip2 => "bz2",
        }
    }

    pub fn compress_tool(&self) -> &'static str {
        match self {
            Compression::Gzip => "gzip",
            Compression::Bzip2 => "bzip2",
        }
    }

    pub fn decompress_tool(&self) -> &'static str {
        match self {
            Compression::Gzip => "gunzip",
            Compression::Bzip2 => "bunzip2",
        }
    }
}

/// Runs decompression and recompression for a job. Implementations must be usable from
/// every worker at once.
pub trait Archiver: Send + Sync {
    /// Decompress `compressed` in place (e.g. `data.txt.gz` -> `data.txt`).
    fn decompress(&self, compressed: &Path, compression: Compression) -> Result<()>;

    /// Compress `path` in place (e.g. `data.txt` -> `data.txt.gz`).
    fn compress(&self, path: &Path, compression: Compression) -> Result<()>;
}

/// [`Archiver`] that shells out to gzip/gunzip and bzip2/bunzip2.
#[derive(Clone, Copy, Debug, Default)]
pub struct CommandArchiver;

impl CommandArchiver {
    fn run_tool(tool: &str, path: &Path) -> Result<()> {
        debug!("{} -v {}", tool, path.display());
        let status = Command::new(tool)
            .arg("-v")
            .arg(path)
            .status()
            .with_context(|| format!("spawn {}", tool))?;
        if !status.success() {
            match status.code() {
                Some(code) => anyhow::bail!("{} {} exited with {}", tool, path.display(), code),
                None => anyhow::bail!("{} {} terminated by signal", tool, path.display()),
            }
        }
        Ok(())
    }
}

impl Archiver for CommandArchiver {
    fn decompress(&self, compressed: &Path, compression: Compression) -> Result<()> {
        Self::run_tool(compression.decompress_tool(), compressed)
    }

    fn compress(&self, path: &Path, compression: Compression) -> Result<()> {
        Self::run_tool(compression.compress_tool(), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool_is_error() {
        let err = CommandArchiver::run_tool("eicbuild-no-such-tool", Path::new("x.txt"))
            .unwrap_err();
        assert!(format!("{:#}", err).contains("spawn eicbuild-no-such-tool"));
    }
}
