/*!
 * Copyright 2025 Release Workshop Ltd
 * Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
 * See the LICENSE file in the project root for details.
 *
 * Change resolution: maps changed import paths to declared services.
 */

use crate::differ::ChangedPackage;
use crate::metadata::{Metadata, ServiceSpec};
use std::collections::BTreeMap;
use strsim::levenshtein;

/// Minimum number of `/`-separated segments in a service import path:
/// `<host>/<owner>/<repo>/cmd/<service>`.
pub const EXPECTED_PATH_PARTS: usize = 5;

/// Directory holding every service entrypoint.
pub const SERVICE_DIR_MARKER: &str = "cmd";

/// Owner and name of the repository being built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoIdentity {
    pub owner: String,
    pub repo: String,
}

impl RepoIdentity {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

/// How a changed import path relates to the service layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMatch<'a> {
    /// Too short to name a service: go.mod, go.sum or another root level package.
    RootLevel,
    /// Not under `<owner>/<repo>/cmd/`, e.g. a library package.
    OutsideConvention,
    /// Under `cmd/`; carries the candidate service name.
    Service(&'a str),
}

/// Classify one changed import path against the repository identity.
///
/// An empty owner or repo never matches.
pub fn classify_import_path<'a>(import_path: &'a str, identity: &RepoIdentity) -> PathMatch<'a> {
    let parts: Vec<&str> = import_path.split('/').collect();

    if parts.len() < EXPECTED_PATH_PARTS {
        return PathMatch::RootLevel;
    }

    if identity.owner.is_empty() || identity.repo.is_empty() {
        return PathMatch::OutsideConvention;
    }

    if parts[1] == identity.owner && parts[2] == identity.repo && parts[3] == SERVICE_DIR_MARKER {
        PathMatch::Service(parts[4])
    } else {
        PathMatch::OutsideConvention
    }
}

/// Resolve the services touched by a set of changed packages.
///
/// Results follow the order of `changed`. Every service whose name matches is
/// included, and a service is included once per changed package that names
/// it: duplicates are neither removed nor rejected.
pub fn resolve_changed_services(
    changed: &[ChangedPackage],
    services: &[ServiceSpec],
    identity: &RepoIdentity,
) -> Vec<ServiceSpec> {
    let mut resolved = Vec::new();

    for package in changed {
        match classify_import_path(&package.import_path, identity) {
            PathMatch::RootLevel => {
                tracing::info!(
                    import_path = %package.import_path,
                    "skipping change with no specific service code: go.mod, go.sum or another root level file may have changed"
                );
            }
            PathMatch::OutsideConvention => {
                tracing::debug!(import_path = %package.import_path, "change is not under a service entrypoint");
            }
            PathMatch::Service(candidate) => {
                let before = resolved.len();
                resolved.extend(services.iter().filter(|s| s.name == candidate).cloned());

                if resolved.len() == before {
                    let similar = find_similar_service_names(services, candidate);
                    if similar.is_empty() {
                        tracing::warn!(service = candidate, "changed service is not declared in metadata");
                    } else {
                        tracing::warn!(
                            service = candidate,
                            "changed service is not declared in metadata, did you mean: {}",
                            similar.join(", ")
                        );
                    }
                }
            }
        }
    }

    resolved
}

/// Resolve changed services and record them on the metadata.
///
/// Returns the number of entries recorded.
pub fn apply_changed_services(
    metadata: &mut Metadata,
    changed: &[ChangedPackage],
    identity: &RepoIdentity,
) -> usize {
    let resolved = resolve_changed_services(changed, &metadata.services, identity);
    let count = resolved.len();
    metadata.record_changed_services(resolved);
    count
}

fn find_similar_service_names(services: &[ServiceSpec], name: &str) -> Vec<String> {
    // Keyed by name: duplicate declarations yield one hint.
    let mut candidates: BTreeMap<&str, usize> = BTreeMap::new();
    for service in services {
        let distance = levenshtein(name, &service.name);
        if distance > 0 && distance <= name.len().max(service.name.len()) / 2 {
            candidates.insert(&service.name, distance);
        }
    }

    let mut similar: Vec<(&str, usize)> = candidates.into_iter().collect();
    similar.sort_by_key(|(_, d)| *d);
    similar.into_iter().take(3).map(|(name, _)| name.to_string()).collect()
}
