//! Go toolchain queries by shelling out: pinned version and package graph

use circlegen_resolver::{
    parse_package_deps, PackageDeps, PackageGraph, ResolverError, ResolverResult, VersionSource,
};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Shell pipeline printing the Go version pinned in `go.mod`.
pub const GO_MOD_VERSION_SCRIPT: &str = "go mod edit -json | jq -r .Go";

/// `go list` template printing each package followed by its transitive imports.
pub const GO_LIST_DEPS_TEMPLATE: &str = r#"{{.ImportPath}} {{join .Deps " "}}"#;

/// Runs a shell script and treats its stdout as the version.
#[derive(Debug, Clone)]
pub struct CommandVersionSource {
    shell: String,
    script: String,
    working_dir: PathBuf,
}

impl CommandVersionSource {
    pub fn new(shell: &str, script: &str, working_dir: &Path) -> Self {
        Self {
            shell: shell.to_string(),
            script: script.to_string(),
            working_dir: working_dir.to_path_buf(),
        }
    }

    /// Ask the Go toolchain for the version in the module's `go.mod`.
    pub fn go_mod(module_root: &Path) -> Self {
        Self::new("bash", GO_MOD_VERSION_SCRIPT, module_root)
    }
}

impl VersionSource for CommandVersionSource {
    fn go_version(&self) -> ResolverResult<String> {
        tracing::debug!(script = %self.script, "looking up Go version");
        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(&self.script)
            .current_dir(&self.working_dir)
            .output()
            .map_err(|e| ResolverError::VersionLookup(format!("can't run {}: {e}", self.shell)))?;

        if !output.status.success() {
            return Err(ResolverError::VersionLookup(format!(
                "'{}' failed: {}",
                self.script,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Package graph of a Go module, from `go list ./...`.
#[derive(Debug, Clone)]
pub struct GoListGraph {
    go: String,
    module_root: PathBuf,
}

impl GoListGraph {
    pub fn new(go: &str, module_root: &Path) -> Self {
        Self {
            go: go.to_string(),
            module_root: module_root.to_path_buf(),
        }
    }

    /// Use the `go` binary found on PATH.
    pub fn go(module_root: &Path) -> Self {
        Self::new("go", module_root)
    }
}

impl PackageGraph for GoListGraph {
    fn packages(&self) -> ResolverResult<Vec<PackageDeps>> {
        tracing::debug!(module_root = %self.module_root.display(), "listing package dependencies");
        // -e keeps packages with errors in the listing instead of failing the whole run.
        let output = Command::new(&self.go)
            .args(["list", "-e", "-f", GO_LIST_DEPS_TEMPLATE, "./..."])
            .current_dir(&self.module_root)
            .output()
            .map_err(|e| ResolverError::Differ(format!("can't run {}: {e}", self.go)))?;

        if !output.status.success() {
            return Err(ResolverError::Differ(format!(
                "{} list failed: {}",
                self.go,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(parse_package_deps(&String::from_utf8_lossy(&output.stdout)))
    }
}
