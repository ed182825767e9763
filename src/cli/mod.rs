//! CLI module for dynaschema
//!
//! Provides command-line interface for:
//! - init: Seed the schema file for a resource
//! - serve: Load the schema and serve the HTTP API

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{build_server, init, init_schema, run_command, serve, Config, RecordStorage};
pub use errors::{CliError, CliErrorCode, CliResult};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}
