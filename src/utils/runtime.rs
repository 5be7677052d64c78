//! Locate the external runtime before any batch work: `.env` → explicit path → env vars → search paths.

use anyhow::Result;
use log::{debug, info, warn};
use std::env;
use std::path::{Path, PathBuf};

use crate::Opts;
use crate::utils::config::{PackagePaths, RuntimeNames};

/// Resolved ROOT executable and event-tree library.
#[derive(Clone, Debug)]
pub struct Runtime {
    pub root_executable: PathBuf,
    pub library: PathBuf,
}

/// Load `dir/.env` into the process environment if present (e.g. to set `ROOTSYS` or `LD_LIBRARY_PATH`).
pub fn load_dotenv(dir: &Path) {
    let env_path = dir.join(".env");
    if env_path.is_file() {
        match dotenvy::from_path(&env_path) {
            Ok(()) => debug!("Loaded {}", env_path.display()),
            Err(e) => warn!("{}: {}", env_path.display(), e),
        }
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn split_env_paths(name: &str) -> Vec<PathBuf> {
    env::var_os(name)
        .map(|v| env::split_paths(&v).filter(|p| !p.as_os_str().is_empty()).collect())
        .unwrap_or_default()
}

/// First `dir/name` that is a file.
pub fn find_in_dirs(name: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter().map(|d| d.join(name)).find(|p| p.is_file())
}

/// First `dir/libeicsmear.<suffix>` that is a file, trying each dir with every suffix.
pub fn find_library_in(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter().find_map(|d| {
        RuntimeNames::LIBRARY_SUFFIXES
            .iter()
            .map(|ext| d.join(format!("{}.{}", RuntimeNames::LIBRARY, ext)))
            .find(|p| p.is_file())
    })
}

/// Library search order: loader path variables, `$ROOTSYS/lib`, then `extra`.
pub fn library_search_dirs(extra: &[PathBuf]) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = RuntimeNames::LIBRARY_PATH_VARS
        .iter()
        .flat_map(|v| split_env_paths(v))
        .collect();
    if let Some(rootsys) = env_path(RuntimeNames::ROOTSYS) {
        dirs.push(rootsys.join("lib"));
    }
    dirs.extend(extra.iter().cloned());
    dirs
}

/// Executable search order: `$ROOTSYS/bin`, then `PATH`.
pub fn executable_search_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(rootsys) = env_path(RuntimeNames::ROOTSYS) {
        dirs.push(rootsys.join("bin"));
    }
    dirs.extend(split_env_paths("PATH"));
    dirs
}

fn explicit_or_env(explicit: Option<&Path>, env_suffix: &str) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| env_path(&PackagePaths::get().env_var(env_suffix)))
}

pub fn locate_root_executable(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = explicit_or_env(explicit, "ROOT") {
        if !p.is_file() {
            anyhow::bail!("ROOT executable {} does not exist", p.display());
        }
        return Ok(p);
    }
    find_in_dirs(RuntimeNames::ROOT_EXECUTABLE, &executable_search_dirs()).ok_or_else(|| {
        anyhow::anyhow!(
            "{} could not be located (set {} or {}, or add it to PATH)",
            RuntimeNames::ROOT_EXECUTABLE,
            RuntimeNames::ROOTSYS,
            PackagePaths::get().env_var("ROOT")
        )
    })
}

pub fn locate_library(explicit: Option<&Path>, extra_dirs: &[PathBuf]) -> Result<PathBuf> {
    if let Some(p) = explicit_or_env(explicit, "LIBRARY") {
        if !p.is_file() {
            anyhow::bail!("{} {} does not exist", RuntimeNames::LIBRARY, p.display());
        }
        return Ok(p);
    }
    find_library_in(&library_search_dirs(extra_dirs)).ok_or_else(|| {
        anyhow::anyhow!(
            "{} could not be located (searched {} and {}/lib)",
            RuntimeNames::LIBRARY,
            RuntimeNames::LIBRARY_PATH_VARS.join(", "),
            RuntimeNames::ROOTSYS
        )
    })
}

/// Locate both pieces of the runtime. Any failure is fatal for the CLI.
pub fn locate_runtime(opts: &Opts) -> Result<Runtime> {
    let root_executable = locate_root_executable(opts.root_executable.as_deref())?;
    let library = locate_library(opts.library.as_deref(), &opts.library_paths)?;
    info!(
        "Using {} with {}",
        root_executable.display(),
        library.display()
    );
    Ok(Runtime {
        root_executable,
        library,
    })
}
