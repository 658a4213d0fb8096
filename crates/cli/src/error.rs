//! CLI error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Resolver(#[from] circlegen_resolver::ResolverError),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("{0}")]
    Message(String),
}

impl CliError {
    /// Prefix the error with the pipeline step that produced it.
    pub fn at_step(step: &str, err: impl std::fmt::Display) -> Self {
        Self::Message(format!("{step}: {err}"))
    }
}

pub type CliResult<T> = Result<T, CliError>;
