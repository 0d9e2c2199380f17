//! Operation: resolve the project and print one version per module.

use std::path::Path;

use graft_resolver::resolver::{ResolvedModule, Selection};
use graft_resolver::ResolvedGraph;
use graft_util::errors::{GraftError, GraftResult};

use crate::project::Project;

/// Options for `graft resolve`.
#[derive(Default)]
pub struct ResolveOptions {
    /// Emit JSON instead of `group:module = version` lines.
    pub json: bool,
}

pub fn resolve(manifest_path: &Path, opts: &ResolveOptions) -> GraftResult<()> {
    let project = Project::load(manifest_path)?;
    let resolution = project.resolve()?;

    if opts.json {
        println!("{}", render_json(&resolution.resolved)?);
    } else {
        print!("{}", render_text(&resolution.resolved));
    }
    eprintln!("Resolved {} modules", resolution.resolved.len());
    Ok(())
}

/// One `group:module = version` line per module, tagged when not simply agreed.
pub fn render_text(resolved: &ResolvedGraph) -> String {
    let mut out = String::new();
    for m in resolved.modules() {
        out.push_str(&format!("{}:{} = {}", m.group, m.module, m.version));
        match m.selection {
            Selection::Forced => out.push_str(" (forced)"),
            Selection::HighestWins => {
                out.push_str(&format!(" (requested {})", m.requested.join(", ")))
            }
            Selection::Agreed | Selection::Available => {}
        }
        out.push('\n');
    }
    out
}

pub fn render_json(resolved: &ResolvedGraph) -> miette::Result<String> {
    let modules: Vec<&ResolvedModule> = resolved.modules().collect();
    serde_json::to_string_pretty(&modules).map_err(|e| {
        GraftError::Generic {
            message: format!("Failed to serialize resolution: {e}"),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use graft_core::dependency::{DependencyDeclaration, ForceRule};
    use graft_resolver::source::NoTransitives;
    use graft_resolver::{resolve, ResolutionRequest};

    fn resolved() -> ResolvedGraph {
        let request = ResolutionRequest::new(vec![
            DependencyDeclaration::direct("org.a", "a", "1.0"),
            DependencyDeclaration::direct("org.b", "b", "1.0"),
            DependencyDeclaration::direct("org.b", "b", "1.2"),
            DependencyDeclaration::direct("org.c", "c", "1.0"),
        ])
        .force(ForceRule::new("org.c", "c", "5.0"));
        resolve(&request, &NoTransitives).unwrap().resolved
    }

    #[test]
    fn text_lines_in_module_order() {
        assert_eq!(
            render_text(&resolved()),
            "org.a:a = 1.0\norg.b:b = 1.2 (requested 1.0, 1.2)\norg.c:c = 5.0 (forced)\n"
        );
    }

    #[test]
    fn json_lists_selection() {
        let json = render_json(&resolved()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let modules = value.as_array().unwrap();
        assert_eq!(modules.len(), 3);
        assert_eq!(modules[1]["version"], "1.2");
        assert_eq!(modules[1]["selection"], "highest-wins");
        assert_eq!(modules[2]["selection"], "forced");
        assert_eq!(modules[2]["requested"][0], "1.0");
    }
}
