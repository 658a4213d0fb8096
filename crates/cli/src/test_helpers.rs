//! Test helpers for unit tests
//!
//! Shared guards for tests that touch process-wide state. Tests using them
//! must be marked `#[serial]`. For integration tests, see
//! `tests/integration_test_helpers.rs`.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Changes the working directory and restores the original one on drop.
pub struct DirGuard {
    original_dir: PathBuf,
}

impl DirGuard {
    /// Create `path` if needed and change into it.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory can't be created or entered, or the
    /// current directory can't be determined.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let path = path.as_ref();
        fs::create_dir_all(path)?;
        let original_dir = std::env::current_dir()?;
        std::env::set_current_dir(path)?;
        Ok(DirGuard { original_dir })
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.original_dir);
    }
}

/// Sets (or removes, for `None`) environment variables and restores their
/// previous values on drop.
pub struct EnvGuard {
    saved: Vec<(String, Option<OsString>)>,
}

impl EnvGuard {
    pub fn set(vars: &[(&str, Option<&str>)]) -> Self {
        let mut saved = Vec::new();
        for (name, value) in vars {
            saved.push((name.to_string(), std::env::var_os(name)));
            match value {
                Some(value) => std::env::set_var(name, value),
                None => std::env::remove_var(name),
            }
        }
        EnvGuard { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (name, value) in self.saved.drain(..).rev() {
            match value {
                Some(value) => std::env::set_var(&name, value),
                None => std::env::remove_var(&name),
            }
        }
    }
}

/// Run git in `dir`, panicking on failure.
pub fn git(dir: &Path, args: &[&str]) {
    let status = std::process::Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .status()
        .expect("git is installed");
    assert!(status.success(), "git {args:?} failed");
}

/// Write `files` under `dir` and commit everything.
pub fn commit_files(dir: &Path, files: &[(&str, &str)], message: &str) {
    for (path, content) in files {
        let full = dir.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
    }
    git(dir, &["add", "-A"]);
    git(dir, &["commit", "-q", "-m", message]);
}

/// Initialise a git repository holding the Go module `github.com/acme/shop`
/// with an initial commit.
pub fn init_go_repo(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    git(dir, &["init", "-q", "-b", "main"]);
    git(dir, &["config", "user.email", "test@example.com"]);
    git(dir, &["config", "user.name", "Test User"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
    commit_files(
        dir,
        &[
            ("go.mod", "module github.com/acme/shop\n\ngo 1.21\n"),
            ("cmd/a/main.go", "package main\n"),
            ("cmd/b/main.go", "package main\n"),
        ],
        "initial commit",
    );
}

/// Write an executable shell script at `dir/name` and return its path.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Put a `go` stub first on PATH whose `go list` prints `listing`.
///
/// The stub lives in `bin_dir`, which must not be inside the repository under
/// test. PATH is restored when the returned guard drops.
#[cfg(unix)]
pub fn stub_go_list(bin_dir: &Path, listing: &str) -> EnvGuard {
    let listing_path = bin_dir.join("go-list.txt");
    fs::create_dir_all(bin_dir).unwrap();
    fs::write(&listing_path, listing).unwrap();
    write_script(
        bin_dir,
        "go",
        &format!("[ \"$1\" = list ] || exit 2\ncat '{}'", listing_path.display()),
    );

    let mut paths = vec![bin_dir.to_path_buf()];
    if let Some(path) = std::env::var_os("PATH") {
        paths.extend(std::env::split_paths(&path));
    }
    let path = std::env::join_paths(paths).unwrap();
    EnvGuard::set(&[("PATH", Some(path.to_str().unwrap()))])
}
