//! The tree-build seam: [`TreeBuilder`] and the ROOT-backed implementation.

use anyhow::{Context, Result};
use log::debug;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::sync::{Mutex, PoisonError};

use crate::utils::config::RuntimeNames;

/// Builds one tree file from one text input. Shared by every worker.
pub trait TreeBuilder: Send + Sync {
    /// Build a tree from `input` into `outdir`, reading at most `max_events` events.
    fn build_tree(&self, input: &Path, outdir: &Path, max_events: Option<u64>) -> Result<()>;
}

/// Runs `BuildTree` in a batch-mode ROOT process per input.
///
/// Each call is a separate process, so concurrent calls share no library state.
#[derive(Clone, Debug)]
pub struct RootTreeBuilder {
    root_executable: PathBuf,
    library: String,
}

impl RootTreeBuilder {
    /// `library` is what `gSystem->Load` receives: a stem (`libeicsmear`) or a full path.
    pub fn new(root_executable: impl Into<PathBuf>, library: impl Into<String>) -> Self {
        Self {
            root_executable: root_executable.into(),
            library: library.into(),
        }
    }

    /// The `-e` expressions passed to ROOT for one build.
    ///
    /// `BuildTree` reports failure by returning a negative count and ROOT itself would still
    /// exit 0, so both lines turn their status into the process exit code.
    pub fn macro_lines(&self, input: &Path, outdir: &Path, max_events: Option<u64>) -> [String; 2] {
        let n = max_events.map_or(RuntimeNames::ALL_EVENTS, |n| n as i64);
        [
            format!(
                "if (gSystem->Load(\"{}\") < 0) gSystem->Exit({});",
                escape(&self.library),
                RuntimeNames::LOAD_FAILED_EXIT
            ),
            format!(
                "gSystem->Exit(BuildTree(\"{}\", \"{}\", {}) < 0 ? {} : 0);",
                escape(&input.to_string_lossy()),
                escape(&outdir.to_string_lossy()),
                n,
                RuntimeNames::BUILD_FAILED_EXIT
            ),
        ]
    }

    fn failure_reason(&self, status: ExitStatus) -> String {
        match status.code() {
            Some(RuntimeNames::LOAD_FAILED_EXIT) => format!("could not load {}", self.library),
            Some(RuntimeNames::BUILD_FAILED_EXIT) => "BuildTree returned an error".to_string(),
            Some(code) => format!("root exited with {}", code),
            None => "root terminated by signal".to_string(),
        }
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Last `n` non-empty lines of `text`, joined by `"; "`.
fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    lines[lines.len().saturating_sub(n)..].join("; ")
}

impl TreeBuilder for RootTreeBuilder {
    fn build_tree(&self, input: &Path, outdir: &Path, max_events: Option<u64>) -> Result<()> {
        let [load, build] = self.macro_lines(input, outdir, max_events);
        debug!("{} -l -b -q -e '{}' -e '{}'", self.root_executable.display(), load, build);
        let output = Command::new(&self.root_executable)
            .args(["-l", "-b", "-q", "-e", load.as_str(), "-e", build.as_str()])
            .output()
            .with_context(|| format!("spawn {}", self.root_executable.display()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "BuildTree({}) failed, {}: {}",
                input.display(),
                self.failure_reason(output.status),
                tail_lines(&stderr, RuntimeNames::STDERR_TAIL_LINES)
            );
        }
        Ok(())
    }
}

/// Wraps a builder so only one `build_tree` call runs at a time.
pub struct SerializedBuilder<B> {
    inner: B,
    lock: Mutex<()>,
}

impl<B: TreeBuilder> SerializedBuilder<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            lock: Mutex::new(()),
        }
    }
}

impl<B: TreeBuilder> TreeBuilder for SerializedBuilder<B> {
    fn build_tree(&self, input: &Path, outdir: &Path, max_events: Option<u64>) -> Result<()> {
        // The guard protects no data, so a poisoned lock is still usable.
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.inner.build_tree(input, outdir, max_events)
    }
}

impl<B: TreeBuilder + ?Sized> TreeBuilder for std::sync::Arc<B> {
    fn build_tree(&self, input: &Path, outdir: &Path, max_events: Option<u64>) -> Result<()> {
        (**self).build_tree(input, outdir, max_events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_lines() {
        assert_eq!(tail_lines("a\n\nb\nc\n", 2), "b; c");
        assert_eq!(tail_lines("", 3), "");
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_reason() {
        use std::os::unix::process::ExitStatusExt;

        let b = RootTreeBuilder::new("root", "libeicsmear");
        // Raw wait status: exit code lives in the high byte.
        let exited = |code: i32| ExitStatus::from_raw(code << 8);
        assert_eq!(b.failure_reason(exited(2)), "could not load libeicsmear");
        assert_eq!(b.failure_reason(exited(1)), "BuildTree returned an error");
        assert_eq!(b.failure_reason(exited(3)), "root exited with 3");
        assert_eq!(b.failure_reason(ExitStatus::from_raw(9)), "root terminated by signal");
    }
}
