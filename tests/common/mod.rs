//! Shared helpers for txfs integration tests.

use assert_cmd::cargo::cargo_bin_cmd;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Creates a temp directory with `root` inside it, seeded with `files`.
#[allow(unused)]
pub fn seeded_root(root: &str, files: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join(root);
    fs::create_dir_all(&root).unwrap();

    for (name, content) in files {
        let path = root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    (temp, root)
}

/// Writes `plan.toml` into `dir` and returns its path.
#[allow(unused)]
pub fn write_plan(dir: &Path, plan: &str) -> PathBuf {
    let path = dir.join("plan.toml");
    fs::write(&path, plan).unwrap();
    path
}

/// Helper to run `txfs apply` against a plan.
#[allow(unused)]
pub fn run_apply(plan: &Path, extra_args: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = cargo_bin_cmd!("txfs");
    cmd.arg("apply").arg(plan).args(extra_args);
    if let Some(dir) = plan.parent() {
        cmd.current_dir(dir);
    }

    cmd.assert()
}

#[allow(unused)]
pub fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).unwrap()
}
