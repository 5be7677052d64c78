//! Load `.eicbuild.toml` from a directory (CLI only). Lib callers pass [`BuildOpts`](crate::BuildOpts) directly.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::Opts;
use crate::utils::config::PackagePaths;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct EicbuildToml {
    #[serde(default)]
    settings: BuildSection,
}

#[derive(Debug, Default, Deserialize)]
struct BuildSection {
    outdir: Option<String>,
    events: Option<i64>,
    processes: Option<usize>,
    rezip: Option<bool>,
    serial_builds: Option<bool>,
    build_anyway: Option<bool>,
    verbose: Option<bool>,
    root: Option<String>,
    library: Option<String>,
    library_paths: Option<Vec<String>>,
    report: Option<String>,
}

/// Load `.eicbuild.toml` from `dir` if present. Returns None if file missing or unreadable.
pub(crate) fn load_eicbuild_toml(dir: &Path) -> Option<EicbuildToml> {
    let path = dir.join(PackagePaths::get().config_filename());
    let s = std::fs::read_to_string(&path).ok()?;
    parse_eicbuild_toml(&s)
        .map_err(|e| log::warn!("{}: {}", path.display(), e))
        .ok()
}

pub(crate) fn parse_eicbuild_toml(s: &str) -> Result<EicbuildToml, toml::de::Error> {
    toml::from_str(s)
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($sec:expr, $opts:expr, $sec_field:ident => $opts_field:ident) => {
        if let Some(v) = $sec.$sec_field {
            $opts.$opts_field = v;
        }
    };
}

/// Apply file config to opts (only fields present in the file). Call before applying CLI.
pub(crate) fn apply_file_to_opts(file: &EicbuildToml, opts: &mut Opts) {
    let sec = &file.settings;
    if let Some(ref p) = sec.outdir {
        opts.build.outdir = PathBuf::from(p);
    }
    if let Some(n) = sec.events {
        opts.build.max_events = crate::types::event_cap(n);
    }
    apply_file_opt!(sec, opts.build, processes => workers);
    apply_file_opt!(sec, opts.build, rezip => rezip);
    apply_file_opt!(sec, opts.build, serial_builds => serialize_builds);
    if let Some(anyway) = sec.build_anyway {
        opts.build.on_decompress_failure = crate::DecompressFailurePolicy::from_build_anyway(anyway);
    }
    apply_file_opt!(sec, opts, verbose => verbose);
    if let Some(ref p) = sec.root {
        opts.root_executable = Some(PathBuf::from(p));
    }
    if let Some(ref p) = sec.library {
        opts.library = Some(PathBuf::from(p));
    }
    if let Some(ref v) = sec.library_paths {
        opts.library_paths = v.iter().map(PathBuf::from).collect();
    }
    if let Some(ref p) = sec.report {
        opts.report_path = Some(PathBuf::from(p));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_only_present_fields() {
        let file = parse_eicbuild_toml(
            r#"
            [settings]
            outdir = "trees"
            events = 500
            processes = 4
            rezip = false
            "#,
        )
        .unwrap();
        let mut opts = Opts::default();
        apply_file_to_opts(&file, &mut opts);
        assert_eq!(opts.build.outdir, PathBuf::from("trees"));
        assert_eq!(opts.build.max_events, Some(500));
        assert_eq!(opts.build.workers, 4);
        assert!(!opts.build.rezip);
        assert!(!opts.verbose);
        assert!(opts.root_executable.is_none());
    }

    #[test]
    fn test_negative_events_mean_unlimited() {
        let file = parse_eicbuild_toml("[settings]\nevents = -1\n").unwrap();
        let mut opts = Opts::default();
        opts.build.max_events = Some(10);
        apply_file_to_opts(&file, &mut opts);
        assert_eq!(opts.build.max_events, None);
    }

    #[test]
    fn test_build_anyway_and_paths() {
        let file = parse_eicbuild_toml(
            r#"
            [settings]
            build_anyway = true
            library_paths = ["/opt/eic/lib", "/usr/local/lib"]
            report = "summary.json"
            "#,
        )
        .unwrap();
        let mut opts = Opts::default();
        apply_file_to_opts(&file, &mut opts);
        assert_eq!(
            opts.build.on_decompress_failure,
            crate::DecompressFailurePolicy::BuildAnyway
        );
        assert_eq!(opts.library_paths.len(), 2);
        assert_eq!(opts.report_path, Some(PathBuf::from("summary.json")));
    }

    #[test]
    fn test_build_anyway_false_resets_policy() {
        let file = parse_eicbuild_toml("[settings]\nbuild_anyway = false\n").unwrap();
        let mut opts = Opts::default();
        opts.build.on_decompress_failure = crate::DecompressFailurePolicy::BuildAnyway;
        apply_file_to_opts(&file, &mut opts);
        assert_eq!(
            opts.build.on_decompress_failure,
            crate::DecompressFailurePolicy::FailJob
        );
    }

    #[test]
    fn test_empty_file_is_default() {
        let file = parse_eicbuild_toml("").unwrap();
        let mut opts = Opts::default();
        apply_file_to_opts(&file, &mut opts);
        assert_eq!(opts.build.workers, 1);
        assert!(opts.build.rezip);
    }
}
