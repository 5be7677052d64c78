//! Path utilities: input name parsing, output naming, source listing.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::engine::archive::Compression;
use crate::utils::config::TREE_EXTENSION;

/// Pieces of an input file name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputName {
    /// Path without the file extension and without the compression suffix.
    pub base: PathBuf,
    /// File extension without the dot (`txt`), if any.
    pub extension: Option<String>,
    pub compression: Option<Compression>,
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().into_owned())
}

/// Split `path` into base, extension and compression suffix.
/// `data.txt.gz` -> (`data`, `txt`, Gzip); `data.dat` -> (`data`, `dat`, None).
pub fn split_input_name(path: &Path) -> InputName {
    let compression = extension_of(path).and_then(|e| Compression::from_extension(&e));
    let inner = match compression {
        Some(_) => path.with_extension(""),
        None => path.to_path_buf(),
    };
    let extension = extension_of(&inner);
    let base = match extension {
        Some(_) => inner.with_extension(""),
        None => inner,
    };
    InputName {
        base,
        extension,
        compression,
    }
}

/// Append `.ext` to `path` without replacing an existing extension.
pub fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

/// Tree file `BuildTree` writes for `input`: the input's file name with its last extension
/// removed, `.<N>event` when an event cap is set, then `.root`, inside `outdir`.
pub fn expected_output_path(input: &Path, outdir: &Path, max_events: Option<u64>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match max_events {
        Some(n) => format!("{stem}.{n}event.{TREE_EXTENSION}"),
        None => format!("{stem}.{TREE_EXTENSION}"),
    };
    outdir.join(name)
}

/// Resolve the input list: a file holding one name per line, or every entry of a directory.
pub fn read_source(source: &Path) -> Result<Vec<PathBuf>> {
    if source.is_file() {
        let text = std::fs::read_to_string(source)
            .with_context(|| format!("read file list {}", source.display()))?;
        Ok(parse_file_list(&text))
    } else if source.is_dir() {
        list_dir(source)
    } else {
        anyhow::bail!("{} not recognized... quitting", source.display())
    }
}

/// One path per non-blank line; surrounding whitespace is trimmed.
pub fn parse_file_list(text: &str) -> Vec<PathBuf> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Immediate entries of `dir`, sorted by name. Not recursive.
pub fn list_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("list directory {}", dir.display()))?;
        files.push(entry.into_path());
    }
    Ok(files)
}
