//! circlegen resolver library
//!
//! Copyright 2025 Release Workshop Ltd
//! Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
//! See the LICENSE file in the project root for details.
//!
//! This library decides which services of a Go monorepo changed on the current branch
//! and computes the values a CI config template needs about them.
//! It works only with in-memory data (no file or process I/O); reading the repository
//! and shelling out is left to implementations of [`PackageDiffer`], [`PackageGraph`]
//! and [`VersionSource`].
//!
//! # Example
//!
//! ```rust
//! use circlegen_resolver::{apply_changed_services, parse_metadata, ChangedPackage, RepoIdentity};
//!
//! let metadata_yaml = r#"
//! name: shop
//! services:
//!   - name: a
//!   - name: b
//! "#;
//!
//! let mut metadata = parse_metadata(metadata_yaml)?;
//! let identity = RepoIdentity::new("acme", "shop");
//! let changed = vec![ChangedPackage::new("github.com/acme/shop/cmd/b")];
//!
//! apply_changed_services(&mut metadata, &changed, &identity);
//! assert_eq!(metadata.changed_services()[0].name, "b");
//! # Ok::<(), circlegen_resolver::ResolverError>(())
//! ```

pub mod derived;
pub mod differ;
pub mod error;
pub mod metadata;
pub mod resolver;

pub use derived::{backfill_go_version, normalize_version, VersionSource};
pub use differ::{
    add_dependents, import_paths_for_files, parse_module_path, parse_package_deps,
    select_base_ref, trunk_branch_name, BaseRef, BranchPolicy, ChangedPackage, DependentsDiffer,
    PackageDeps, PackageDiffer, PackageGraph, BRANCH_ENV_VAR, DEFAULT_TRUNK,
};
pub use error::{ResolverError, ResolverResult};
pub use metadata::{parse_metadata, Deploy, Metadata, ServiceSpec, GRPC_SERVICE_TYPE};
pub use resolver::{
    apply_changed_services, classify_import_path, resolve_changed_services, PathMatch,
    RepoIdentity, EXPECTED_PATH_PARTS, SERVICE_DIR_MARKER,
};
