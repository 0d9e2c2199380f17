//! CLI argument definitions for Graft.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "graft",
    version,
    about = "Resolve dependency conflicts with force rules, exclusions and highest-version-wins",
    long_about = "Graft expands a project's declared dependencies through a module registry, \
                  applies force and exclusion rules, and picks exactly one version per module."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to Graft.toml
    #[arg(long, global = true, env = "GRAFT_MANIFEST", default_value = "Graft.toml")]
    pub manifest_path: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve dependencies and print one version per module
    Resolve {
        /// Print the resolution as JSON
        #[arg(long)]
        json: bool,
    },

    /// Display the dependency tree
    Tree {
        /// Maximum depth to display
        #[arg(long)]
        depth: Option<u32>,
    },

    /// Show every path that pulls in a module
    Why {
        /// `group:module`, or just the module name
        module: String,
    },

    /// Resolve and write Graft.lock
    Lock {
        /// Fail if Graft.lock is missing or out of date instead of writing it
        #[arg(long)]
        check: bool,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}
