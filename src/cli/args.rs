//! CLI argument definitions using clap
//!
//! Commands:
//! - dynaschema init --config <path> [--resource finance|k12]
//! - dynaschema serve --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::records::ResourceKind;

/// dynaschema - schema registry and record service with a runtime-editable schema
#[derive(Parser, Debug)]
#[command(name = "dynaschema")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write the seed schema for a resource into the data directory
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./dynaschema.json")]
        config: PathBuf,

        /// Resource to seed; overrides the config file
        #[arg(long, value_enum)]
        resource: Option<ResourceKind>,
    },

    /// Load the schema and serve the HTTP API
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./dynaschema.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
