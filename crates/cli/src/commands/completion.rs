//! Shell completion command implementation

use crate::error::{CliError, CliResult};
use crate::get_cli_command;
use clap_complete::{generate, Shell};
use std::io::{self, Write};

const SUPPORTED_SHELLS: &str = "bash, zsh, fish";

pub struct Options {
    pub shell: String,
}

/// Print the completion script for the requested shell
pub fn run(options: &Options) -> i32 {
    let result = parse_shell(&options.shell).map(|shell| write_completion(shell, &mut io::stdout()));
    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("✗ Completion generation failed");
            eprintln!("  Error: {e}");
            1
        }
    }
}

fn parse_shell(name: &str) -> CliResult<Shell> {
    match name.to_lowercase().as_str() {
        "" => Err(CliError::Message(format!(
            "Shell name is required. Supported shells: {SUPPORTED_SHELLS}"
        ))),
        "bash" => Ok(Shell::Bash),
        "zsh" => Ok(Shell::Zsh),
        "fish" => Ok(Shell::Fish),
        _ => Err(CliError::Message(format!(
            "Unsupported shell: {name}. Supported shells: {SUPPORTED_SHELLS}"
        ))),
    }
}

fn write_completion(shell: Shell, out: &mut dyn Write) {
    let mut cmd = get_cli_command();
    generate(shell, &mut cmd, "circlegen", out);
}
