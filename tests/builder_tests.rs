//! ROOT-backed tree builder: the macro it runs and how ROOT's exit status maps to a result.

use eicbuild::engine::{RootTreeBuilder, SerializedBuilder, TreeBuilder};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

// --- macro lines ---

#[test]
fn test_macro_lines_unlimited() {
    let b = RootTreeBuilder::new("root", "libeicsmear");
    let [load, build] = b.macro_lines(Path::new("in/data.txt"), Path::new("out"), None);
    assert_eq!(
        load,
        "if (gSystem->Load(\"libeicsmear\") < 0) gSystem->Exit(2);"
    );
    assert_eq!(
        build,
        "gSystem->Exit(BuildTree(\"in/data.txt\", \"out\", -1) < 0 ? 1 : 0);"
    );
}

#[test]
fn test_macro_lines_capped_and_escaped() {
    let b = RootTreeBuilder::new("root", "/opt/lib/libeicsmear.so");
    let [load, build] = b.macro_lines(Path::new("we\"ird.dat"), Path::new("."), Some(1000));
    assert!(load.contains("gSystem->Load(\"/opt/lib/libeicsmear.so\")"));
    assert_eq!(
        build,
        "gSystem->Exit(BuildTree(\"we\\\"ird.dat\", \".\", 1000) < 0 ? 1 : 0);"
    );
}

// --- running ROOT ---

/// Executable shell script named `root` in `dir`.
#[cfg(unix)]
fn fake_root(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// All process-spawning checks run in one test so no other test thread forks while a
/// script is still open for writing.
#[cfg(unix)]
#[test]
fn test_root_exit_status() {
    let dir = tempfile::tempdir().unwrap();
    let input = Path::new("data.txt");

    // Behaves like ROOT when BuildTree catches an exception and returns -1: stderr gets the
    // message, and only the Exit wrapper turns that into a nonzero status.
    let build_fails = fake_root(
        dir.path(),
        "root_build_fails",
        r#"echo "Caught exception in Forester::Plant(): cannot open data.txt" >&2
for arg in "$@"; do
  case "$arg" in
    "gSystem->Exit(BuildTree("*) exit 1 ;;
  esac
done
exit 0
"#,
    );
    let err = RootTreeBuilder::new(&build_fails, "libeicsmear")
        .build_tree(input, dir.path(), None)
        .unwrap_err();
    let msg = format!("{:#}", err);
    assert!(msg.contains("BuildTree returned an error"), "{msg}");
    assert!(msg.contains("Caught exception in Forester::Plant()"), "{msg}");

    // Library cannot be loaded.
    let load_fails = fake_root(
        dir.path(),
        "root_load_fails",
        r#"for arg in "$@"; do
  case "$arg" in
    "if (gSystem->Load("*"< 0) gSystem->Exit(2);") echo "cannot find libeicsmear" >&2; exit 2 ;;
  esac
done
exit 0
"#,
    );
    let err = RootTreeBuilder::new(&load_fails, "libeicsmear")
        .build_tree(input, dir.path(), None)
        .unwrap_err();
    assert!(format!("{:#}", err).contains("could not load libeicsmear"));

    // Batch flags and both expressions reach ROOT in order.
    let args_file = dir.path().join("args");
    let builds = fake_root(
        dir.path(),
        "root_builds",
        &format!(
            "echo 'Processing...' >&2\nprintf '%s\\n' \"$@\" > '{}'\nexit 0\n",
            args_file.display()
        ),
    );
    RootTreeBuilder::new(&builds, "libeicsmear")
        .build_tree(input, Path::new("trees"), Some(50))
        .unwrap();
    let args = std::fs::read_to_string(&args_file).unwrap();
    let args: Vec<&str> = args.lines().collect();
    assert_eq!(&args[..4], ["-l", "-b", "-q", "-e"]);
    assert!(args[4].starts_with("if (gSystem->Load("));
    assert_eq!(args[5], "-e");
    assert_eq!(
        args[6],
        "gSystem->Exit(BuildTree(\"data.txt\", \"trees\", 50) < 0 ? 1 : 0);"
    );

    let missing = RootTreeBuilder::new("/nonexistent/eicbuild/root", "libeicsmear");
    assert!(missing.build_tree(input, dir.path(), None).is_err());
}

// --- serialized builds ---

#[derive(Default)]
struct Overlap {
    active: AtomicUsize,
    max_seen: AtomicUsize,
}

impl TreeBuilder for Overlap {
    fn build_tree(&self, _: &Path, _: &Path, _: Option<u64>) -> anyhow::Result<()> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_seen.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(10));
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_serialized_builder_never_overlaps() {
    let inner = Arc::new(Overlap::default());
    let b = Arc::new(SerializedBuilder::new(Arc::clone(&inner)));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let b = Arc::clone(&b);
            thread::spawn(move || b.build_tree(Path::new("x.txt"), Path::new("."), None))
        })
        .collect();
    for h in handles {
        h.join().unwrap().unwrap();
    }
    assert_eq!(inner.max_seen.load(Ordering::SeqCst), 1);
}
