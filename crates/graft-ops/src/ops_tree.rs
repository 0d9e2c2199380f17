//! Operation: display the declaration tree.

use std::path::Path;

use graft_util::errors::GraftResult;

use crate::project::Project;

/// Options for `graft tree`.
#[derive(Default)]
pub struct TreeOptions {
    /// Maximum tree depth to display.
    pub depth: Option<usize>,
}

/// Print every declaration that survived exclusion, annotated with the
/// version it resolved to.
pub fn tree(manifest_path: &Path, opts: &TreeOptions) -> GraftResult<()> {
    let project = Project::load(manifest_path)?;
    let resolution = project.resolve()?;

    if resolution.graph.is_empty() {
        println!("No dependencies.");
        return Ok(());
    }
    print!(
        "{}",
        resolution
            .graph
            .print_tree(&resolution.resolved, opts.depth)
    );
    Ok(())
}
