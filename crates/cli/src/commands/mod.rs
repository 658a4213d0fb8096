//! CLI commands

pub mod changed;
pub mod completion;
pub mod generate;
