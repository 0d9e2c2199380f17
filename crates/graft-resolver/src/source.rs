//! The lookup the resolver uses to discover transitive dependencies.

use graft_core::dependency::{DependencyDeclaration, ModuleId};

/// Metadata for published modules: what each version depends on, which
/// versions exist, and what a platform (BOM) manages.
///
/// Implementations take `&self`, so a `Sync` source can serve concurrent
/// resolutions without locking.
pub trait DependencySource {
    /// Declarations required by `group:module` at `version`.
    ///
    /// `version` is the declared constraint text, or the forced version when a
    /// force rule covers the module. Unknown modules have no dependencies.
    fn expand(&self, group: &str, module: &str, version: &str) -> Vec<DependencyDeclaration>;

    /// Every published version of `group:module`, in no particular order.
    fn available_versions(&self, _group: &str, _module: &str) -> Vec<String> {
        Vec::new()
    }

    /// Versions managed by the platform `group:module:version`.
    fn platform(&self, _group: &str, _module: &str, _version: &str) -> Vec<(ModuleId, String)> {
        Vec::new()
    }
}

impl<F> DependencySource for F
where
    F: Fn(&str, &str, &str) -> Vec<DependencyDeclaration>,
{
    fn expand(&self, group: &str, module: &str, version: &str) -> Vec<DependencyDeclaration> {
        self(group, module, version)
    }
}

/// A source with no metadata: every module is a leaf.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTransitives;

impl DependencySource for NoTransitives {
    fn expand(&self, _group: &str, _module: &str, _version: &str) -> Vec<DependencyDeclaration> {
        Vec::new()
    }
}
