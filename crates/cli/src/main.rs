//! circlegen CLI
//!
//! Copyright 2025 Release Workshop Ltd
//! Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
//! See the LICENSE file in the project root for details.

mod commands;
mod error;
mod generator;
mod ops;
mod telemetry;
#[cfg(test)]
mod test_helpers;
mod utils;

use circlegen_resolver::DEFAULT_TRUNK;
use clap::{CommandFactory, Parser, Subcommand};
use commands::{changed, completion, generate};

/// circlegen - Generate CircleCI config for the services changed on a branch
#[derive(Parser)]
#[command(name = "circlegen")]
#[command(about = "circlegen - Generate CircleCI config for the services changed on a branch", long_about = None)]
#[command(version = env!("CIRCLEGEN_VERSION"))]
struct Cli {
    /// Increase log verbosity (-v for debug output)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the pipeline config for the changed services
    Generate {
        /// Path to the metadata file
        #[arg(long, default_value = generate::DEFAULT_METADATA_PATH)]
        metadata: String,
        /// Output path for the generated config
        #[arg(long, default_value = generate::DEFAULT_OUTPUT_PATH)]
        output: String,
        /// Base reference used when no branch is set
        #[arg(long, default_value = DEFAULT_TRUNK)]
        trunk: String,
        /// Diff against the trunk instead of failing when CIRCLE_BRANCH is unset
        #[arg(long)]
        allow_trunk_fallback: bool,
    },
    /// List the services changed since the base reference
    Changed {
        /// Path to the metadata file
        #[arg(long, default_value = generate::DEFAULT_METADATA_PATH)]
        metadata: String,
        /// Base reference used when no branch is set
        #[arg(long, default_value = DEFAULT_TRUNK)]
        trunk: String,
        /// Output format (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Generate shell completion script
    Completion {
        /// Shell name (bash, zsh, fish)
        shell: String,
    },
}

/// Get the CLI command structure for completion generation
pub fn get_cli_command() -> clap::Command {
    Cli::command()
}

fn main() {
    let cli = Cli::parse();

    telemetry::init(cli.verbose);

    let exit_code = match cli.command {
        Commands::Generate {
            metadata,
            output,
            trunk,
            allow_trunk_fallback,
        } => {
            let opts = generate::Options {
                metadata,
                output,
                trunk,
                allow_trunk_fallback,
            };
            generate::run(&opts)
        }
        Commands::Changed {
            metadata,
            trunk,
            format,
        } => {
            let opts = changed::Options {
                metadata,
                trunk,
                format,
            };
            changed::run(&opts)
        }
        Commands::Completion { shell } => {
            let opts = completion::Options { shell };
            completion::run(&opts)
        }
    };

    std::process::exit(exit_code);
}
