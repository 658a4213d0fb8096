//! Generate command implementation - render the pipeline config

use crate::error::{CliError, CliResult};
use crate::generator::circleci::CircleCiRenderer;
use crate::generator::emit_config;
use crate::ops::pipeline;
use crate::utils::environment::RunIdentity;
use crate::utils::toolchain::CommandVersionSource;
use circlegen_resolver::{trunk_branch_name, BranchPolicy};
use std::path::Path;

/// Metadata file read by default
pub const DEFAULT_METADATA_PATH: &str = ".metadata.yml";

/// Generated config written by default
pub const DEFAULT_OUTPUT_PATH: &str = ".circleci/generated-config.yml";

pub struct Options {
    /// Path to the metadata file
    pub metadata: String,
    /// Path of the generated config
    pub output: String,
    /// Base reference used when no branch is set
    pub trunk: String,
    /// Fall back to the trunk instead of failing when the branch is unset
    pub allow_trunk_fallback: bool,
}

/// Run the full generation pipeline
pub fn run(options: &Options) -> i32 {
    match run_inner(options) {
        Ok(count) => {
            println!("✓ Wrote {} ({} changed service(s))", options.output, count);
            0
        }
        Err(e) => {
            eprintln!("✗ Generation failed");
            eprintln!("  Error: {e}");
            1
        }
    }
}

fn run_inner(options: &Options) -> CliResult<usize> {
    let metadata_path = Path::new(&options.metadata);
    let module_root = pipeline::module_root(metadata_path);

    // Step 1: Load metadata
    let mut metadata = pipeline::load_metadata(metadata_path)?;

    // Step 2: Pick the base reference
    let run = RunIdentity::from_env();
    let policy = if options.allow_trunk_fallback {
        BranchPolicy::TrunkFallback
    } else {
        BranchPolicy::Required
    };
    let base = pipeline::select_base(&run, &options.trunk, policy)?;

    // Step 3: Resolve changed services
    let differ = pipeline::package_differ(&module_root)?;
    let count = pipeline::resolve_changes(&mut metadata, &run, &base, &differ)?;

    // Step 4: Derived fields
    pipeline::derive_fields(&mut metadata, &CommandVersionSource::go_mod(&module_root))?;

    // Step 5: Render and write
    let renderer = CircleCiRenderer::new()
        .map_err(|e| CliError::at_step("load template", e))?
        .with_deploy_branch(trunk_branch_name(&options.trunk));
    emit_config(&renderer, &metadata, Path::new(&options.output))
        .map_err(|e| CliError::at_step("emit config", e))?;

    Ok(count)
}
