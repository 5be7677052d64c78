//! Application configuration constants.
//! Tuning and names in one place.

use std::sync::OnceLock;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    config_filename: String,
    env_prefix: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                config_filename: format!(".{pkg}.toml"),
                env_prefix: pkg.to_uppercase(),
            }
        })
    }

    /// Per-directory config file, e.g. `.eicbuild.toml`.
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    /// Name of a package-scoped environment variable, e.g. `EICBUILD_ROOT`.
    pub fn env_var(&self, suffix: &str) -> String {
        format!("{}_{}", self.env_prefix, suffix)
    }

    /// Thread name for worker `id`.
    pub fn worker_name(&self, id: usize) -> String {
        format!("{}-worker-{}", self.pkg_name, id)
    }
}

// ---- Input files ----

/// Extensions (without the dot) that `BuildTree` accepts. Anything else is skipped.
pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["txt", "dat"];

/// Extension of the tree file written by `BuildTree`.
pub const TREE_EXTENSION: &str = "root";

// ---- External runtime ----

/// Names and search hints for the ROOT runtime and the event-tree library.
pub struct RuntimeNames;

impl RuntimeNames {
    /// Executable that runs ROOT macros.
    pub const ROOT_EXECUTABLE: &'static str = "root";
    /// Library stem loaded via `gSystem->Load`.
    pub const LIBRARY: &'static str = "libeicsmear";
    /// Shared-object suffixes tried when locating the library.
    pub const LIBRARY_SUFFIXES: [&'static str; 2] = ["so", "dylib"];
    /// Dynamic loader search path variables, in search order.
    pub const LIBRARY_PATH_VARS: [&'static str; 2] = ["LD_LIBRARY_PATH", "DYLD_LIBRARY_PATH"];
    /// ROOT installation prefix variable.
    pub const ROOTSYS: &'static str = "ROOTSYS";
    /// Event cap passed to `BuildTree` when unlimited (`<= 0` means all events).
    pub const ALL_EVENTS: i64 = -1;
    /// Lines of ROOT stderr kept in a build error.
    pub const STDERR_TAIL_LINES: usize = 5;
    /// ROOT exit code when `BuildTree` returns a negative status.
    pub const BUILD_FAILED_EXIT: i32 = 1;
    /// ROOT exit code when `gSystem->Load` fails.
    pub const LOAD_FAILED_EXIT: i32 = 2;
}

// ---- Worker threads ----

/// Worker count limits for the batch pool.
#[derive(Clone, Copy, Debug, Default)]
pub struct WorkerThreadLimits {
    /// Available threads (from rayon); set by [`WorkerThreadLimits::current()`].
    pub all_threads: usize,
}

impl WorkerThreadLimits {
    /// Worker count when none is requested.
    pub const DEFAULT_WORKERS: usize = 1;

    /// Build limits with `all_threads` set from `rayon::current_num_threads()`.
    pub fn current() -> Self {
        Self {
            all_threads: rayon::current_num_threads(),
        }
    }

    /// Resolve a requested worker count: `0` means one worker per available thread.
    pub fn resolve(&self, requested: usize) -> usize {
        match requested {
            0 => self.all_threads.max(1),
            n => n,
        }
    }
}
