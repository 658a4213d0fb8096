//! Reusable pipeline operations
//!
//! These functions are used by multiple commands to avoid code duplication
//! and ensure consistent behavior across the CLI.

pub mod pipeline;
