/*!
 * Copyright 2025 Release Workshop Ltd
 * Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
 * See the LICENSE file in the project root for details.
 *
 * Derived fields: version fallbacks and docker build-arg overrides.
 */

use crate::error::{ResolverError, ResolverResult};
use crate::metadata::Metadata;
use regex::Regex;
use std::sync::OnceLock;

/// Supplies the Go version pinned by the repository when metadata leaves it empty.
pub trait VersionSource {
    /// Raw version text; surrounding whitespace is tolerated.
    ///
    /// # Errors
    ///
    /// Returns `ResolverError::VersionLookup` if the version cannot be determined.
    fn go_version(&self) -> ResolverResult<String>;
}

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\d+(\.\d+)*((rc|beta)\d+)?$").expect("valid version regex")
    })
}

/// Trim a looked-up version and check that it looks like a Go version.
///
/// # Errors
///
/// Returns `ResolverError::VersionLookup` for empty or malformed output,
/// e.g. `null` when `go.mod` has no `go` directive.
pub fn normalize_version(raw: &str) -> ResolverResult<String> {
    let version = raw.trim();
    if version.is_empty() {
        return Err(ResolverError::VersionLookup(
            "version lookup returned no output".to_string(),
        ));
    }
    if !version_regex().is_match(version) {
        return Err(ResolverError::VersionLookup(format!(
            "'{version}' is not a Go version"
        )));
    }
    Ok(version.to_string())
}

/// Fill `go_version` from `source` if the metadata left it empty.
///
/// An explicit value is never replaced and `source` is not consulted for it.
/// Returns whether the field was filled.
///
/// # Errors
///
/// Propagates the source's failure, or `ResolverError::VersionLookup` if its
/// answer is not a version.
pub fn backfill_go_version(metadata: &mut Metadata, source: &dyn VersionSource) -> ResolverResult<bool> {
    if !metadata.go_version.is_empty() {
        return Ok(false);
    }

    let version = normalize_version(&source.go_version()?)?;
    tracing::debug!(%version, "using Go version pinned in go.mod");
    metadata.go_version = version;
    Ok(true)
}

fn build_arg(name: &str, value: &str) -> String {
    if value.is_empty() {
        String::new()
    } else {
        format!(" --build-arg {name}={value}")
    }
}

impl Metadata {
    pub fn override_go_version(&self) -> String {
        build_arg("GO_VERSION", &self.go_version)
    }

    pub fn override_alpine_version(&self) -> String {
        build_arg("ALPINE_VERSION", &self.alpine_version)
    }

    /// Build args for the tzdata and ca-certificates packages, in that order.
    pub fn override_alpine_package_versions(&self) -> String {
        build_arg("TZDATA_VERSION", &self.tz_data_version)
            + &build_arg("CA_CERTIFICATE_VERSION", &self.ca_cert_version)
    }

    /// All docker build-arg overrides, each with a leading space, in fixed order.
    pub fn arg_overrides(&self) -> String {
        self.override_go_version()
            + &self.override_alpine_version()
            + &self.override_alpine_package_versions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FakeVersionSource {
        answer: Result<&'static str, &'static str>,
        calls: Cell<usize>,
    }

    impl FakeVersionSource {
        fn ok(version: &'static str) -> Self {
            Self {
                answer: Ok(version),
                calls: Cell::new(0),
            }
        }

        fn failing(message: &'static str) -> Self {
            Self {
                answer: Err(message),
                calls: Cell::new(0),
            }
        }
    }

    impl VersionSource for FakeVersionSource {
        fn go_version(&self) -> ResolverResult<String> {
            self.calls.set(self.calls.get() + 1);
            self.answer
                .map(str::to_string)
                .map_err(|e| ResolverError::VersionLookup(e.to_string()))
        }
    }

    #[test]
    fn test_arg_overrides_only_alpine() {
        let metadata = Metadata {
            alpine_version: "3.18".to_string(),
            ..Default::default()
        };
        assert_eq!(metadata.arg_overrides(), " --build-arg ALPINE_VERSION=3.18");
    }

    #[test]
    fn test_arg_overrides_empty() {
        assert_eq!(Metadata::default().arg_overrides(), "");
    }

    #[test]
    fn test_arg_overrides_all_in_order() {
        let metadata = Metadata {
            go_version: "1.21".to_string(),
            alpine_version: "3.18".to_string(),
            tz_data_version: "2023c-r1".to_string(),
            ca_cert_version: "20230506-r0".to_string(),
            ..Default::default()
        };
        assert_eq!(
            metadata.arg_overrides(),
            " --build-arg GO_VERSION=1.21 --build-arg ALPINE_VERSION=3.18 --build-arg TZDATA_VERSION=2023c-r1 --build-arg CA_CERTIFICATE_VERSION=20230506-r0"
        );
    }

    #[test]
    fn test_alpine_package_versions_keeps_both() {
        let metadata = Metadata {
            tz_data_version: "2023c-r1".to_string(),
            ca_cert_version: "20230506-r0".to_string(),
            ..Default::default()
        };
        assert_eq!(
            metadata.override_alpine_package_versions(),
            " --build-arg TZDATA_VERSION=2023c-r1 --build-arg CA_CERTIFICATE_VERSION=20230506-r0"
        );
    }

    #[test]
    fn test_backfill_go_version_when_empty() {
        let mut metadata = Metadata::default();
        let source = FakeVersionSource::ok("1.22\n");

        assert!(backfill_go_version(&mut metadata, &source).unwrap());
        assert_eq!(metadata.go_version, "1.22");
        assert_eq!(metadata.override_go_version(), " --build-arg GO_VERSION=1.22");
        assert_eq!(source.calls.get(), 1);
    }

    #[test]
    fn test_backfill_go_version_keeps_explicit_value() {
        let mut metadata = Metadata {
            go_version: "1.20".to_string(),
            ..Default::default()
        };
        let source = FakeVersionSource::failing("must not be called");

        assert!(!backfill_go_version(&mut metadata, &source).unwrap());
        assert_eq!(metadata.go_version, "1.20");
        assert_eq!(source.calls.get(), 0);
    }

    #[test]
    fn test_backfill_go_version_propagates_failure() {
        let mut metadata = Metadata::default();
        let source = FakeVersionSource::failing("go: command not found");

        let result = backfill_go_version(&mut metadata, &source);
        assert!(matches!(result, Err(ResolverError::VersionLookup(_))));
        assert_eq!(metadata.go_version, "");
    }

    #[test]
    fn test_backfill_go_version_rejects_null() {
        let mut metadata = Metadata::default();
        let source = FakeVersionSource::ok("null\n");

        let result = backfill_go_version(&mut metadata, &source);
        assert!(result.is_err());
        assert_eq!(metadata.go_version, "");
    }

    #[test]
    fn test_normalize_version() {
        assert_eq!(normalize_version(" 1.21.3 \n").unwrap(), "1.21.3");
        assert_eq!(normalize_version("1.22rc1").unwrap(), "1.22rc1");
        assert!(normalize_version("").is_err());
        assert!(normalize_version("go1.21").is_err());
    }
}
