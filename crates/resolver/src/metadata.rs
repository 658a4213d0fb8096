/*!
 * Copyright 2025 Release Workshop Ltd
 * Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
 * See the LICENSE file in the project root for details.
 *
 * Repository metadata model, as declared in `.metadata.yml`.
 */

use crate::error::{ResolverError, ResolverResult};
use serde::{Deserialize, Serialize};

/// Service type that exposes a gRPC-over-HTTP interface.
pub const GRPC_SERVICE_TYPE: &str = "http-grpc";

/// Repo-wide metadata.
///
/// Loaded once per run. After loading, only two mutations happen: the change
/// resolver records `changed_services`, and the derived-field calculator fills
/// `go_version` when it was left empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Metadata {
    pub name: String,
    pub staging: bool,
    pub team: String,
    pub domain: String,
    pub kubescore_enabled: bool,
    pub cd_enabled: bool,
    pub services: Vec<ServiceSpec>,
    pub argo_app_names_production: String,
    pub argo_app_names_staging: String,
    pub deploy: Deploy,
    pub go_version: String,
    pub alpine_version: String,
    pub tz_data_version: String,
    pub ca_cert_version: String,
    pub disable_whitesource: bool,

    /// Never read from the source document.
    #[serde(skip_deserializing)]
    pub(crate) changed_services: Vec<ServiceSpec>,
}

/// Deployment target description, passed through to the template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Deploy {
    pub platform: String,
    pub product: String,
}

/// One deployable unit. Its entrypoint lives at `cmd/<name>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub ci_enabled: bool,
    pub dockerfile: Option<String>,
}

impl Metadata {
    /// True if any declared service speaks gRPC over HTTP.
    pub fn has_grpc(&self) -> bool {
        self.services.iter().any(|s| s.kind == GRPC_SERVICE_TYPE)
    }

    /// Staging deploys, and deploys without CD automation, need a manual approval gate.
    pub fn needs_approval(&self) -> bool {
        self.staging || !self.cd_enabled
    }

    /// Services touched by the current change set, in the order the differ reported them.
    pub fn changed_services(&self) -> &[ServiceSpec] {
        &self.changed_services
    }

    pub(crate) fn record_changed_services(&mut self, changed: Vec<ServiceSpec>) {
        self.changed_services = changed;
    }
}

impl ServiceSpec {
    /// Service name usable in identifiers that may not contain hyphens.
    pub fn name_underscored(&self) -> String {
        self.name.replace('-', "_")
    }
}

/// Parse repository metadata from a YAML string
///
/// Unknown keys are ignored and missing keys take their empty defaults.
/// An empty document yields default metadata.
///
/// # Errors
///
/// Returns `ResolverError::InvalidMetadata` if the document is not valid YAML
/// or a field has the wrong type.
pub fn parse_metadata(content: &str) -> ResolverResult<Metadata> {
    if content.trim().is_empty() {
        return Ok(Metadata::default());
    }

    serde_yaml::from_str(content).map_err(|e| ResolverError::InvalidMetadata(e.to_string()))
}
