//! Git-backed package differ

use circlegen_resolver::{
    import_paths_for_files, parse_module_path, BaseRef, ChangedPackage, PackageDiffer,
    ResolverError, ResolverResult,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Lists changed Go packages by diffing the module directory against a base reference.
///
/// Only the changed packages themselves are reported; wrap it in a
/// `DependentsDiffer` to add the packages that import them.
#[derive(Debug, Clone)]
pub struct GitDiffer {
    module_root: PathBuf,
    module_path: String,
}

impl GitDiffer {
    /// Create a differ for the Go module rooted at `module_root`.
    ///
    /// # Errors
    ///
    /// Returns `ResolverError::Differ` if `go.mod` is missing or declares no module.
    pub fn new(module_root: &Path) -> ResolverResult<Self> {
        let go_mod_path = module_root.join("go.mod");
        let go_mod = fs::read_to_string(&go_mod_path).map_err(|e| {
            ResolverError::Differ(format!("can't read {}: {e}", go_mod_path.display()))
        })?;
        let module_path = parse_module_path(&go_mod).ok_or_else(|| {
            ResolverError::Differ(format!(
                "no module directive in {}",
                go_mod_path.display()
            ))
        })?;

        Ok(Self {
            module_root: module_root.to_path_buf(),
            module_path,
        })
    }

    pub fn module_path(&self) -> &str {
        &self.module_path
    }

    fn git(&self, args: &[&str]) -> ResolverResult<String> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.module_root)
            .args(args)
            .output()
            .map_err(|e| ResolverError::Differ(format!("can't run git: {e}")))?;

        if !output.status.success() {
            return Err(ResolverError::Differ(format!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| ResolverError::Differ(format!("git output is not UTF-8: {e}")))
    }
}

impl PackageDiffer for GitDiffer {
    fn changed_packages(&self, base: &BaseRef) -> ResolverResult<Vec<ChangedPackage>> {
        let revision = base.as_revision();
        let merge_base = self.git(&["merge-base", &revision, "HEAD"])?;
        let merge_base = merge_base.trim();

        // --relative limits the diff to the module directory and makes paths module-relative.
        let files = self.git(&["diff", "--name-only", "--no-renames", "--relative", merge_base])?;
        let packages = import_paths_for_files(&self.module_path, files.lines());

        tracing::debug!(base = %base, merge_base, count = packages.len(), "listed changed packages");
        Ok(packages)
    }
}
