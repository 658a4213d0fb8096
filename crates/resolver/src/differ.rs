/*!
 * Copyright 2025 Release Workshop Ltd
 * Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
 * See the LICENSE file in the project root for details.
 *
 * Package differ seam: base-reference policy, the differ trait, the
 * file-to-import-path mapping, and expansion to dependent packages.
 */

use crate::error::{ResolverError, ResolverResult};
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

/// Environment variable naming the branch under test.
pub const BRANCH_ENV_VAR: &str = "CIRCLE_BRANCH";

/// Base reference used when no branch is known.
pub const DEFAULT_TRUNK: &str = "origin/master";

/// The "before" point for change detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseRef {
    /// The commit immediately preceding the tip of the named branch.
    BranchParent(String),
    /// A fixed trunk reference.
    Trunk(String),
}

impl BaseRef {
    /// Revision expression understood by git.
    pub fn as_revision(&self) -> String {
        match self {
            Self::BranchParent(branch) => format!("{branch}~1"),
            Self::Trunk(trunk) => trunk.clone(),
        }
    }
}

impl fmt::Display for BaseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_revision())
    }
}

/// Whether a missing branch name is fatal or falls back to trunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchPolicy {
    Required,
    TrunkFallback,
}

/// Select the base reference for the current run
///
/// A blank branch name counts as unset.
///
/// # Errors
///
/// Returns `ResolverError::MissingEnvironment` when the policy requires a branch
/// and none is available.
pub fn select_base_ref(
    branch: Option<&str>,
    trunk: &str,
    policy: BranchPolicy,
) -> ResolverResult<BaseRef> {
    match branch.map(str::trim).filter(|b| !b.is_empty()) {
        Some(branch) => Ok(BaseRef::BranchParent(branch.to_string())),
        None => match policy {
            BranchPolicy::Required => Err(ResolverError::MissingEnvironment(
                BRANCH_ENV_VAR.to_string(),
            )),
            BranchPolicy::TrunkFallback => Ok(BaseRef::Trunk(trunk.to_string())),
        },
    }
}

/// One package reported as modified relative to the base reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedPackage {
    /// Slash-delimited import path, `<host>/<owner>/<repo>/<subpath...>`.
    pub import_path: String,
}

impl ChangedPackage {
    pub fn new(import_path: impl Into<String>) -> Self {
        Self {
            import_path: import_path.into(),
        }
    }
}

/// Lists the packages changed since a base reference.
pub trait PackageDiffer {
    /// Changed packages, in whatever order the underlying tool reports them.
    ///
    /// # Errors
    ///
    /// Any failure is fatal to the run; implementations should not retry.
    fn changed_packages(&self, base: &BaseRef) -> ResolverResult<Vec<ChangedPackage>>;
}

/// One package of the module and every package it imports, directly or transitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDeps {
    pub import_path: String,
    pub deps: Vec<String>,
}

/// Lists the packages of the module with their transitive imports.
pub trait PackageGraph {
    /// # Errors
    ///
    /// Any failure is fatal to the run.
    fn packages(&self) -> ResolverResult<Vec<PackageDeps>>;
}

/// Parse a package listing with one package per line: its import path
/// followed by its dependencies, separated by whitespace.
pub fn parse_package_deps(listing: &str) -> Vec<PackageDeps> {
    listing
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let import_path = fields.next()?.to_string();
            Some(PackageDeps {
                import_path,
                deps: fields.map(str::to_string).collect(),
            })
        })
        .collect()
}

/// Append every package that depends on a changed package.
///
/// The changed packages keep their order and come first; dependents follow in
/// graph order. No package is reported twice.
pub fn add_dependents(changed: Vec<ChangedPackage>, graph: &[PackageDeps]) -> Vec<ChangedPackage> {
    let changed_paths: HashSet<String> = changed.iter().map(|p| p.import_path.clone()).collect();
    let mut seen = changed_paths.clone();
    let mut expanded = changed;

    for package in graph {
        if seen.contains(&package.import_path) {
            continue;
        }
        if let Some(dep) = package.deps.iter().find(|d| changed_paths.contains(*d)) {
            tracing::debug!(package = %package.import_path, changed = %dep, "package depends on a changed package");
            seen.insert(package.import_path.clone());
            expanded.push(ChangedPackage::new(package.import_path.clone()));
        }
    }

    expanded
}

/// Differ reporting the packages another differ found changed, plus every
/// package of the module that imports one of them.
#[derive(Debug, Clone)]
pub struct DependentsDiffer<D, G> {
    differ: D,
    graph: G,
}

impl<D: PackageDiffer, G: PackageGraph> DependentsDiffer<D, G> {
    pub fn new(differ: D, graph: G) -> Self {
        Self { differ, graph }
    }
}

impl<D: PackageDiffer, G: PackageGraph> PackageDiffer for DependentsDiffer<D, G> {
    fn changed_packages(&self, base: &BaseRef) -> ResolverResult<Vec<ChangedPackage>> {
        let changed = self.differ.changed_packages(base)?;
        if changed.is_empty() {
            return Ok(changed);
        }

        let graph = self.graph.packages()?;
        Ok(add_dependents(changed, &graph))
    }
}

/// Branch name of a trunk reference: `origin/master` and
/// `refs/remotes/origin/master` are both `master`.
pub fn trunk_branch_name(trunk: &str) -> &str {
    if let Some(branch) = trunk.strip_prefix("refs/heads/") {
        return branch;
    }
    if let Some(rest) = trunk.strip_prefix("refs/remotes/") {
        return rest.split_once('/').map_or(rest, |(_, branch)| branch);
    }
    trunk.strip_prefix("origin/").unwrap_or(trunk)
}

fn module_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?m)^\s*module\s+"?([^\s"]+)"?\s*(?://.*)?$"#).expect("valid module regex")
    })
}

/// Extract the module path from the contents of a `go.mod` file.
pub fn parse_module_path(go_mod: &str) -> Option<String> {
    module_regex()
        .captures(go_mod)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Map changed files (relative to the module root) to the import paths of
/// their packages.
///
/// A file's package is its containing directory, so files at the root map to
/// the module path itself. Each package is reported once, in first-seen order.
pub fn import_paths_for_files<I, S>(module_path: &str, files: I) -> Vec<ChangedPackage>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let module_path = module_path.trim_end_matches('/');
    let mut seen = HashSet::new();
    let mut packages = Vec::new();

    for file in files {
        let file = file.as_ref().trim().trim_start_matches("./");
        if file.is_empty() {
            continue;
        }

        let import_path = match file.rsplit_once('/') {
            Some((dir, _)) => format!("{module_path}/{dir}"),
            None => module_path.to_string(),
        };

        if seen.insert(import_path.clone()) {
            packages.push(ChangedPackage { import_path });
        }
    }

    packages
}
