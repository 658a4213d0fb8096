//! Config generator
//!
//! Renders the pipeline config from fully resolved metadata and writes it out.

pub mod circleci;


use crate::error::{CliError, CliResult};
use circlegen_resolver::Metadata;
use std::fs;
use std::path::Path;

/// Trait for config renderers
pub trait Renderer {
    /// Render the complete config document for `metadata`.
    fn render(&self, metadata: &Metadata) -> CliResult<String>;
}

/// Render the config and write it to `output_path`.
///
/// Rendering finishes in memory before the output file is touched, so a
/// render failure leaves any previous file in place. The file is created or
/// truncated, and missing parent directories are created.
pub fn emit_config(renderer: &dyn Renderer, metadata: &Metadata, output_path: &Path) -> CliResult<()> {
    let rendered = renderer.render(metadata)?;

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    fs::write(output_path, rendered).map_err(|e| {
        CliError::Message(format!("Failed to write {}: {e}", output_path.display()))
    })?;

    Ok(())
}
