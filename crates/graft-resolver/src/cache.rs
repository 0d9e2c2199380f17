//! Per-resolution cache of `expand` results.
//!
//! The same module version is usually reached through several paths; each
//! distinct `group:module:version` is looked up once per resolution.

use std::collections::HashMap;

use graft_core::dependency::DependencyDeclaration;

use crate::source::DependencySource;

#[derive(Debug, Default)]
pub struct ExpansionCache {
    entries: HashMap<String, Vec<DependencyDeclaration>>,
    hits: usize,
}

impl ExpansionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dependencies of `group:module:version`, asking `source` only on a miss.
    pub fn expand<S>(
        &mut self,
        source: &S,
        group: &str,
        module: &str,
        version: &str,
    ) -> Vec<DependencyDeclaration>
    where
        S: DependencySource + ?Sized,
    {
        let key = format!("{group}:{module}:{version}");
        if let Some(deps) = self.entries.get(&key) {
            self.hits += 1;
            tracing::trace!("expansion cache hit for {key}");
            return deps.clone();
        }
        let deps = source.expand(group, module, version);
        self.entries.insert(key, deps.clone());
        deps
    }

    /// Number of distinct coordinates looked up so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }
}
