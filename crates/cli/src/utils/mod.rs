//! Process-boundary helpers: environment, git and toolchain access

pub mod environment;
pub mod git;
pub mod toolchain;
