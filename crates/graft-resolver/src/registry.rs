//! A module registry read from a TOML file.
//!
//! ```toml
//! [modules."com.google.mlkit:text-recognition-chinese"."16.0.0"]
//! dependencies = ["com.google.firebase:firebase-messaging:>=22.0"]
//!
//! [platforms."com.google.firebase:firebase-bom"."32.7.3"]
//! "com.google.firebase:firebase-messaging" = "23.4.1"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use graft_core::dependency::{DeclarationSource, DependencyDeclaration, ModuleId};
use graft_core::manifest::Dependency;
use graft_util::errors::GraftError;
use serde::Deserialize;

use crate::source::DependencySource;
use crate::version::{Version, VersionConstraint};

#[derive(Debug, Default, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    modules: BTreeMap<String, BTreeMap<String, ModuleEntry>>,
    #[serde(default)]
    platforms: BTreeMap<String, BTreeMap<String, BTreeMap<String, String>>>,
}

#[derive(Debug, Default, Deserialize)]
struct ModuleEntry {
    #[serde(default)]
    dependencies: Vec<Dependency>,
}

/// In-memory registry of module metadata and platform version sets.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    modules: BTreeMap<ModuleId, BTreeMap<String, Vec<DependencyDeclaration>>>,
    platforms: BTreeMap<ModuleId, BTreeMap<String, BTreeMap<ModuleId, String>>>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| GraftError::Registry {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::parse_toml(&content)
    }

    pub fn parse_toml(content: &str) -> miette::Result<Self> {
        let file: RegistryFile = toml::from_str(content).map_err(|e| GraftError::Registry {
            message: format!("Failed to parse registry: {e}"),
        })?;

        let mut registry = Self::new();
        for (key, versions) in file.modules {
            let id = parse_module_key(&key)?;
            for (version, entry) in versions {
                let deps = entry
                    .dependencies
                    .iter()
                    .map(|d| {
                        d.to_declaration().map(|mut decl| {
                            decl.source = DeclarationSource::Transitive;
                            decl
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| GraftError::Registry {
                        message: format!("{key}:{version}: {e}"),
                    })?;
                registry
                    .modules
                    .entry(id.clone())
                    .or_default()
                    .insert(version, deps);
            }
        }
        for (key, versions) in file.platforms {
            let id = parse_module_key(&key)?;
            for (version, managed) in versions {
                let mut entries = BTreeMap::new();
                for (module_key, managed_version) in managed {
                    entries.insert(parse_module_key(&module_key)?, managed_version);
                }
                registry
                    .platforms
                    .entry(id.clone())
                    .or_default()
                    .insert(version, entries);
            }
        }
        Ok(registry)
    }

    /// Record the dependencies of `group:module:version`.
    pub fn insert_module(
        &mut self,
        group: &str,
        module: &str,
        version: &str,
        dependencies: Vec<DependencyDeclaration>,
    ) {
        self.modules
            .entry(ModuleId::new(group, module))
            .or_default()
            .insert(version.to_string(), dependencies);
    }

    /// Record the versions managed by the platform `group:module:version`.
    pub fn insert_platform(
        &mut self,
        group: &str,
        module: &str,
        version: &str,
        managed: BTreeMap<ModuleId, String>,
    ) {
        self.platforms
            .entry(ModuleId::new(group, module))
            .or_default()
            .insert(version.to_string(), managed);
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }
}

fn parse_module_key(key: &str) -> Result<ModuleId, GraftError> {
    ModuleId::parse(key).map_err(|e| GraftError::Registry {
        message: e.to_string(),
    })
}

impl DependencySource for StaticRegistry {
    fn expand(&self, group: &str, module: &str, version: &str) -> Vec<DependencyDeclaration> {
        let Some(versions) = self.modules.get(&ModuleId::new(group, module)) else {
            tracing::debug!("no metadata for {group}:{module}");
            return Vec::new();
        };
        if let Some(deps) = versions.get(version) {
            return deps.clone();
        }

        let Ok(constraint) = VersionConstraint::parse(version) else {
            tracing::debug!("no metadata for {group}:{module}:{version}");
            return Vec::new();
        };
        let published = versions
            .iter()
            .filter_map(|(v, deps)| Version::parse(v).ok().map(|parsed| (parsed, deps)));
        let found = match &constraint {
            // A concrete version only matches itself, spelled any way
            // (`1.0` is `1.0.0`).
            VersionConstraint::Require(wanted) | VersionConstraint::Exact(wanted) => {
                published.filter(|(v, _)| v == wanted).map(|(_, deps)| deps).next()
            }
            VersionConstraint::Range(_) | VersionConstraint::Prefix(_) => published
                .filter(|(v, _)| constraint.allows(v))
                .max_by(|(a, _), (b, _)| a.cmp(b))
                .map(|(_, deps)| deps),
        };
        match found {
            Some(deps) => deps.clone(),
            None => {
                tracing::debug!("no metadata for {group}:{module}:{version}");
                Vec::new()
            }
        }
    }

    fn available_versions(&self, group: &str, module: &str) -> Vec<String> {
        self.modules
            .get(&ModuleId::new(group, module))
            .map(|versions| versions.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn platform(&self, group: &str, module: &str, version: &str) -> Vec<(ModuleId, String)> {
        self.platforms
            .get(&ModuleId::new(group, module))
            .and_then(|versions| versions.get(version))
            .map(|managed| {
                managed
                    .iter()
                    .map(|(id, v)| (id.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRY: &str = r#"
[modules."org.a:a"."1.0"]
dependencies = ["org.b:b:2.0"]

[modules."org.a:a"."1.5"]
dependencies = [
    "org.b:b:2.1",
    { group = "org.c", module = "c", version = "1.0", exclude = ["org.d:*"] },
]

[modules."org.b:b"."2.0"]

[platforms."org.bom:bom"."1.0"]
"org.a:a" = "1.5"
"org.b:b" = "2.0"
"#;

    #[test]
    fn exact_version_lookup() {
        let reg = StaticRegistry::parse_toml(REGISTRY).unwrap();
        let deps = reg.expand("org.a", "a", "1.0");
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].to_string(), "org.b:b:2.0");
        assert_eq!(deps[0].source, DeclarationSource::Transitive);
        assert_eq!(reg.module_count(), 2);
    }

    #[test]
    fn constraint_picks_highest_published() {
        let reg = StaticRegistry::parse_toml(REGISTRY).unwrap();
        let deps = reg.expand("org.a", "a", ">=1.0");
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[1].exclusions.len(), 1);
        assert_eq!(deps[1].exclusions[0].to_string(), "org.d:*");

        assert_eq!(reg.expand("org.a", "a", "[1.0,1.5)").len(), 1);
        assert!(reg.expand("org.a", "a", ">=9").is_empty());
        assert_eq!(reg.expand("org.a", "a", "1.+").len(), 2);
    }

    #[test]
    fn concrete_version_matches_only_itself() {
        let reg = StaticRegistry::parse_toml(REGISTRY).unwrap();
        assert!(reg.expand("org.a", "a", "1.2").is_empty());
        assert!(reg.expand("org.a", "a", "[1.2]").is_empty());
        assert_eq!(reg.expand("org.a", "a", "1.0.0").len(), 1);
        assert_eq!(reg.expand("org.a", "a", "=1.5.0").len(), 2);
    }

    #[test]
    fn unknown_module_is_a_leaf() {
        let reg = StaticRegistry::parse_toml(REGISTRY).unwrap();
        assert!(reg.expand("org.zzz", "z", "1.0").is_empty());
        assert!(reg.expand("org.b", "b", "2.0").is_empty());
        assert!(reg.available_versions("org.zzz", "z").is_empty());
    }

    #[test]
    fn lists_available_versions() {
        let reg = StaticRegistry::parse_toml(REGISTRY).unwrap();
        assert_eq!(reg.available_versions("org.a", "a"), vec!["1.0", "1.5"]);
    }

    #[test]
    fn platform_managed_versions() {
        let reg = StaticRegistry::parse_toml(REGISTRY).unwrap();
        let managed = reg.platform("org.bom", "bom", "1.0");
        assert_eq!(
            managed,
            vec![
                (ModuleId::new("org.a", "a"), "1.5".to_string()),
                (ModuleId::new("org.b", "b"), "2.0".to_string()),
            ]
        );
        assert!(reg.platform("org.bom", "bom", "2.0").is_empty());
    }

    #[test]
    fn invalid_module_key_is_rejected() {
        let err = StaticRegistry::parse_toml("[modules.\"no-colon\".\"1.0\"]\n").unwrap_err();
        assert!(err.to_string().contains("Registry error"));
    }

    #[test]
    fn builder_inserts() {
        let mut reg = StaticRegistry::new();
        reg.insert_module(
            "org.x",
            "x",
            "1.0",
            vec![DependencyDeclaration::transitive("org.y", "y", "1.0")],
        );
        let mut managed = BTreeMap::new();
        managed.insert(ModuleId::new("org.x", "x"), "1.0".to_string());
        reg.insert_platform("org.p", "p", "1", managed);
        assert_eq!(reg.expand("org.x", "x", "1.0").len(), 1);
        assert_eq!(reg.platform("org.p", "p", "1").len(), 1);
    }
}
