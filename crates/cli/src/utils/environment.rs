//! Run identity from the CI environment
//!
//! The CircleCI variables are read exactly once, here; everything downstream
//! receives an explicit [`RunIdentity`].

use circlegen_resolver::{RepoIdentity, BRANCH_ENV_VAR};

/// Owner of the project being built (GitHub org or user).
pub const OWNER_ENV_VAR: &str = "CIRCLE_PROJECT_USERNAME";

/// Name of the repository being built.
pub const REPO_ENV_VAR: &str = "CIRCLE_PROJECT_REPONAME";

/// Who and what this run is building.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunIdentity {
    /// Branch under test, if the environment names one.
    pub branch: Option<String>,
    pub repo: RepoIdentity,
}

impl RunIdentity {
    /// Read the run identity from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the run identity from an arbitrary variable lookup.
    ///
    /// Empty values are kept as empty strings for owner and repo, which then
    /// never match a changed path; an empty branch counts as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let branch = lookup(BRANCH_ENV_VAR).filter(|b| !b.trim().is_empty());
        let owner = lookup(OWNER_ENV_VAR).unwrap_or_default();
        let repo = lookup(REPO_ENV_VAR).unwrap_or_default();

        if owner.is_empty() || repo.is_empty() {
            tracing::warn!(
                "{OWNER_ENV_VAR} or {REPO_ENV_VAR} is empty, no service will be detected as changed"
            );
        }

        Self {
            branch,
            repo: RepoIdentity::new(owner, repo),
        }
    }
}
