/*!
 * Copyright 2025 Release Workshop Ltd
 * Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
 * See the LICENSE file in the project root for details.
 */
use thiserror::Error;

/// Top-level error type for the resolver
///
/// Every variant is a configuration error: the caller is expected to abort the run.
/// A changed path that does not name a service is never an error.
#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("{0} envvar must be set")]
    MissingEnvironment(String),

    #[error("Package differ failed: {0}")]
    Differ(String),

    #[error("Version lookup failed: {0}")]
    VersionLookup(String),
}

pub type ResolverResult<T> = Result<T, ResolverError>;
