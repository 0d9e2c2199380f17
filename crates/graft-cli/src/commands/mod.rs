//! Command dispatch and handler modules.

mod lock;
mod resolve;
mod tree;
mod why;

use std::path::Path;

use miette::Result;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    let manifest_path = cli.manifest_path.as_path();
    match cli.command {
        Command::Resolve { json } => resolve::exec(manifest_path, json),
        Command::Tree { depth } => tree::exec(manifest_path, depth),
        Command::Why { ref module } => why::exec(manifest_path, module),
        Command::Lock { check } => lock::exec(manifest_path, check),
    }
}

/// Fail early with a readable error when there is no manifest to load.
fn require_manifest(manifest_path: &Path) -> Result<()> {
    if manifest_path.is_file() {
        Ok(())
    } else {
        Err(graft_ops::project::missing_manifest(manifest_path).into())
    }
}
