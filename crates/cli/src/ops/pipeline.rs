//! Pipeline steps shared by `generate` and `changed`
//!
//! Each step reports failures prefixed with the step name, so a fatal error
//! tells the user where the run stopped.

use crate::error::{CliError, CliResult};
use crate::utils::environment::RunIdentity;
use crate::utils::git::GitDiffer;
use crate::utils::toolchain::GoListGraph;
use circlegen_resolver::{
    apply_changed_services, backfill_go_version, parse_metadata, select_base_ref, BaseRef,
    BranchPolicy, DependentsDiffer, Metadata, PackageDiffer, VersionSource,
};
use std::fs;
use std::path::{Path, PathBuf};

/// The Go module root: the directory holding the metadata file.
pub fn module_root(metadata_path: &Path) -> PathBuf {
    match metadata_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Read and parse the metadata file.
pub fn load_metadata(path: &Path) -> CliResult<Metadata> {
    let content = fs::read_to_string(path)
        .map_err(|e| CliError::at_step("read metadata", format!("{}: {e}", path.display())))?;
    parse_metadata(&content)
        .map_err(|e| CliError::at_step("parse metadata", format!("{}: {e}", path.display())))
}

/// Pick the base reference for this run.
pub fn select_base(run: &RunIdentity, trunk: &str, policy: BranchPolicy) -> CliResult<BaseRef> {
    let base = select_base_ref(run.branch.as_deref(), trunk, policy)
        .map_err(|e| CliError::at_step("select base reference", e))?;
    tracing::info!(base = %base, "comparing against base reference");
    Ok(base)
}

/// Differ for the Go module at `module_root`: changed packages from git,
/// expanded with the module packages that import them.
pub fn package_differ(module_root: &Path) -> CliResult<DependentsDiffer<GitDiffer, GoListGraph>> {
    let git = GitDiffer::new(module_root)
        .map_err(|e| CliError::at_step("prepare package differ", e))?;
    tracing::debug!(module = git.module_path(), "diffing Go module");
    Ok(DependentsDiffer::new(git, GoListGraph::go(module_root)))
}

/// Ask the differ what changed and record the affected services on the metadata.
///
/// Returns the number of changed-service entries recorded.
pub fn resolve_changes(
    metadata: &mut Metadata,
    run: &RunIdentity,
    base: &BaseRef,
    differ: &dyn PackageDiffer,
) -> CliResult<usize> {
    let changed = differ
        .changed_packages(base)
        .map_err(|e| CliError::at_step("list changed packages", e))?;
    tracing::debug!(count = changed.len(), "changed packages");

    let count = apply_changed_services(metadata, &changed, &run.repo);
    tracing::info!(count, "resolved changed services");
    Ok(count)
}

/// Fill derived fields that the metadata left empty.
pub fn derive_fields(metadata: &mut Metadata, versions: &dyn VersionSource) -> CliResult<()> {
    backfill_go_version(metadata, versions)
        .map_err(|e| CliError::at_step("determine Go version", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use circlegen_resolver::{ChangedPackage, RepoIdentity, ResolverError, ResolverResult};
    use std::cell::RefCell;
    use tempfile::TempDir;

    struct FakeDiffer {
        packages: Vec<&'static str>,
        seen_base: RefCell<Option<BaseRef>>,
    }

    impl FakeDiffer {
        fn new(packages: Vec<&'static str>) -> Self {
            Self {
                packages,
                seen_base: RefCell::new(None),
            }
        }
    }

    impl PackageDiffer for FakeDiffer {
        fn changed_packages(&self, base: &BaseRef) -> ResolverResult<Vec<ChangedPackage>> {
            *self.seen_base.borrow_mut() = Some(base.clone());
            Ok(self.packages.iter().map(|p| ChangedPackage::new(*p)).collect())
        }
    }

    struct BrokenDiffer;

    impl PackageDiffer for BrokenDiffer {
        fn changed_packages(&self, _base: &BaseRef) -> ResolverResult<Vec<ChangedPackage>> {
            Err(ResolverError::Differ("not a git repository".to_string()))
        }
    }

    struct FixedVersion(&'static str);

    impl VersionSource for FixedVersion {
        fn go_version(&self) -> ResolverResult<String> {
            Ok(self.0.to_string())
        }
    }

    fn run_identity(branch: Option<&str>) -> RunIdentity {
        RunIdentity {
            branch: branch.map(str::to_string),
            repo: RepoIdentity::new("acme", "shop"),
        }
    }

    fn two_services() -> Metadata {
        parse_metadata("services:\n  - name: a\n  - name: b\n").unwrap()
    }

    #[test]
    fn test_module_root() {
        assert_eq!(module_root(Path::new(".metadata.yml")), PathBuf::from("."));
        assert_eq!(
            module_root(Path::new("services/shop/.metadata.yml")),
            PathBuf::from("services/shop")
        );
    }

    #[test]
    fn test_load_metadata() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(".metadata.yml");
        fs::write(&path, "name: shop\ncdEnabled: true\n").unwrap();

        let metadata = load_metadata(&path).unwrap();
        assert_eq!(metadata.name, "shop");
        assert!(metadata.cd_enabled);
    }

    #[test]
    fn test_load_metadata_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = load_metadata(&temp_dir.path().join(".metadata.yml")).unwrap_err();
        assert!(err.to_string().starts_with("read metadata:"));
    }

    #[test]
    fn test_load_metadata_malformed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(".metadata.yml");
        fs::write(&path, "services: [unclosed").unwrap();

        let err = load_metadata(&path).unwrap_err();
        assert!(err.to_string().starts_with("parse metadata:"));
    }

    #[test]
    fn test_select_base_requires_branch() {
        let err = select_base(&run_identity(None), "origin/master", BranchPolicy::Required).unwrap_err();
        assert_eq!(
            err.to_string(),
            "select base reference: CIRCLE_BRANCH envvar must be set"
        );
    }

    #[test]
    fn test_select_base_with_branch() {
        let base = select_base(&run_identity(Some("feature")), "origin/master", BranchPolicy::Required).unwrap();
        assert_eq!(base, BaseRef::BranchParent("feature".to_string()));
    }

    #[test]
    fn test_resolve_changes_end_to_end() {
        let mut metadata = two_services();
        let differ = FakeDiffer::new(vec!["/acme/shop/cmd/b/main"]);
        let base = BaseRef::BranchParent("feature".to_string());

        let count = resolve_changes(&mut metadata, &run_identity(Some("feature")), &base, &differ).unwrap();
        assert_eq!(count, 1);
        assert_eq!(metadata.changed_services().len(), 1);
        assert_eq!(metadata.changed_services()[0].name, "b");
        assert_eq!(*differ.seen_base.borrow(), Some(base));
    }

    #[test]
    fn test_resolve_changes_root_level_only() {
        let mut metadata = two_services();
        let differ = FakeDiffer::new(vec!["/acme/shop/go.mod"]);
        let base = BaseRef::Trunk("origin/master".to_string());

        let count = resolve_changes(&mut metadata, &run_identity(None), &base, &differ).unwrap();
        assert_eq!(count, 0);
        assert!(metadata.changed_services().is_empty());
    }

    #[test]
    fn test_resolve_changes_differ_failure() {
        let mut metadata = two_services();
        let base = BaseRef::Trunk("origin/master".to_string());

        let err = resolve_changes(&mut metadata, &run_identity(None), &base, &BrokenDiffer).unwrap_err();
        assert!(err.to_string().starts_with("list changed packages:"));
    }

    #[test]
    fn test_derive_fields_backfills_go_version() {
        let mut metadata = two_services();
        derive_fields(&mut metadata, &FixedVersion("1.21\n")).unwrap();
        assert_eq!(metadata.go_version, "1.21");
    }

    #[test]
    fn test_derive_fields_bad_version() {
        let mut metadata = two_services();
        let err = derive_fields(&mut metadata, &FixedVersion("null")).unwrap_err();
        assert!(err.to_string().starts_with("determine Go version:"));
    }

    #[test]
    fn test_package_differ_without_go_mod() {
        let temp_dir = TempDir::new().unwrap();
        let err = package_differ(temp_dir.path()).unwrap_err();
        assert!(err.to_string().starts_with("prepare package differ:"));
    }
}
