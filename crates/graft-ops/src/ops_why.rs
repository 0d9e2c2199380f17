//! Operation: explain why a module is in the graph.

use std::path::Path;

use graft_resolver::Resolution;

use graft_util::errors::GraftResult;

use crate::project::Project;

pub fn why(manifest_path: &Path, target: &str) -> GraftResult<()> {
    let project = Project::load(manifest_path)?;
    let resolution = project.resolve()?;
    print!("{}", render_paths(&resolution, target));
    Ok(())
}

/// The resolved version of `target`, then every path from a direct
/// dependency down to it.
pub fn render_paths(resolution: &Resolution, target: &str) -> String {
    let paths = resolution.graph.paths_to(target);
    if paths.is_empty() {
        return format!("Module '{target}' not found in the dependency graph.\n");
    }

    let mut out = String::new();
    for m in resolution.resolved.modules() {
        if m.module == target || format!("{}:{}", m.group, m.module) == target {
            out.push_str(&format!("{}:{} = {}\n", m.group, m.module, m.version));
        }
    }
    for path in &paths {
        for (i, step) in path.iter().enumerate() {
            let indent = "  ".repeat(i);
            out.push_str(&format!("{indent}{step}\n"));
        }
    }
    out
}
