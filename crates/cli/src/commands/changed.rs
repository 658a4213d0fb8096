//! Changed command implementation
//!
//! Lists the services the current change set touches, without rendering a config.

use crate::error::{CliError, CliResult};
use crate::ops::pipeline;
use crate::utils::environment::RunIdentity;
use circlegen_resolver::{BranchPolicy, Metadata, ServiceSpec};
use serde::Serialize;
use std::path::Path;

pub struct Options {
    /// Path to the metadata file
    pub metadata: String,
    /// Base reference used when no branch is set
    pub trunk: String,
    /// Output format (table, json)
    pub format: String,
}

/// Output format for the changed-service list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(Self::Table),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangedReport<'a> {
    base: String,
    changed_services: &'a [ServiceSpec],
}

/// List changed services
pub fn run(options: &Options) -> i32 {
    match run_inner(options) {
        Ok(output) => {
            println!("{output}");
            0
        }
        Err(e) => {
            eprintln!("✗ Failed to list changed services");
            eprintln!("  Error: {e}");
            1
        }
    }
}

fn run_inner(options: &Options) -> CliResult<String> {
    let format = OutputFormat::from_str(&options.format).ok_or_else(|| {
        CliError::Message(format!(
            "Unsupported format: {}. Supported formats: table, json",
            options.format
        ))
    })?;

    let metadata_path = Path::new(&options.metadata);
    let module_root = pipeline::module_root(metadata_path);
    let mut metadata = pipeline::load_metadata(metadata_path)?;

    let run = RunIdentity::from_env();
    let base = pipeline::select_base(&run, &options.trunk, BranchPolicy::TrunkFallback)?;
    let differ = pipeline::package_differ(&module_root)?;
    pipeline::resolve_changes(&mut metadata, &run, &base, &differ)?;

    format_report(&metadata, &base.to_string(), format)
}

fn format_report(metadata: &Metadata, base: &str, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => {
            let report = ChangedReport {
                base: base.to_string(),
                changed_services: metadata.changed_services(),
            };
            serde_json::to_string_pretty(&report)
                .map_err(|e| CliError::Message(format!("Failed to serialize report: {e}")))
        }
        OutputFormat::Table => {
            let changed = metadata.changed_services();
            if changed.is_empty() {
                return Ok(format!("No services changed since {base}"));
            }

            let mut lines = vec![format!("Changed services since {base}:")];
            for service in changed {
                let ci = if service.ci_enabled { "" } else { " [ci disabled]" };
                lines.push(format!("  - {} ({}){}", service.name, service.kind, ci));
            }
            Ok(lines.join("\n"))
        }
    }
}
