use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use graft_util::errors::GraftError;

use crate::dependency::{
    Coordinate, DeclarationSource, DependencyDeclaration, ExclusionRule, ForceRule,
};

/// File name of the project manifest.
pub const MANIFEST_FILE: &str = "Graft.toml";

/// The parsed representation of a `Graft.toml` file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub project: ProjectMetadata,

    /// Platforms (BOMs) supplying versions for versionless dependencies.
    #[serde(default)]
    pub platforms: BTreeMap<String, String>,

    #[serde(default)]
    pub dependencies: BTreeMap<String, Dependency>,

    #[serde(default)]
    pub resolution: ResolutionConfig,

    #[serde(default)]
    pub registry: Option<RegistryConfig>,
}

/// Project identity from the `[project]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub name: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A dependency entry in `[dependencies]`.
///
/// Supports both shorthand (`"group:module:constraint"`) and detailed forms.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dependency {
    Short(String),
    Detailed(DetailedDependency),
}

/// A dependency with explicit coordinates and per-dependency exclusions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedDependency {
    pub group: String,
    pub module: String,
    /// Omitted when a platform manages the version.
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub exclude: Vec<ExclusionRule>,
}

impl Dependency {
    /// Convert this entry into a direct declaration.
    pub fn to_declaration(&self) -> Result<DependencyDeclaration, GraftError> {
        match self {
            Dependency::Short(s) => DependencyDeclaration::parse(s, DeclarationSource::Direct)
                .map_err(|e| GraftError::Manifest {
                    message: e.to_string(),
                }),
            Dependency::Detailed(d) => {
                let mut decl = DependencyDeclaration::direct(
                    &d.group,
                    &d.module,
                    d.version.clone().unwrap_or_default(),
                );
                decl.exclusions = d.exclude.clone();
                Ok(decl)
            }
        }
    }
}

/// Resolution strategy from `[resolution]`, shared with the global config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionConfig {
    #[serde(default)]
    pub force: Vec<ForceRule>,

    #[serde(default)]
    pub exclude: Vec<ExclusionRule>,

    /// Fail on any module requested at differing constraints unless forced.
    #[serde(default, rename = "fail-on-version-conflict")]
    pub fail_on_version_conflict: bool,
}

impl ResolutionConfig {
    /// Combine two rule sets. Rules from `self` come first, so a project-level
    /// force takes precedence over a global one for the same module.
    pub fn merged_with(&self, other: &ResolutionConfig) -> ResolutionConfig {
        let mut force = self.force.clone();
        for rule in &other.force {
            if !force.iter().any(|f| f.matches(&rule.group, &rule.module)) {
                force.push(rule.clone());
            }
        }
        let mut exclude = self.exclude.clone();
        for rule in &other.exclude {
            if !exclude.contains(rule) {
                exclude.push(rule.clone());
            }
        }
        ResolutionConfig {
            force,
            exclude,
            fail_on_version_conflict: self.fail_on_version_conflict
                || other.fail_on_version_conflict,
        }
    }
}

/// Location of the module registry from `[registry]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub path: String,
}

impl RegistryConfig {
    /// Resolve the registry path relative to `base` unless it is absolute.
    pub fn resolve_path(&self, base: &Path) -> PathBuf {
        let path = Path::new(&self.path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base.join(path)
        }
    }
}

impl Manifest {
    /// Load and parse a `Graft.toml` file from the given path.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| GraftError::Manifest {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::parse_toml(&content)
    }

    pub fn parse_toml(content: &str) -> miette::Result<Self> {
        toml::from_str(content).map_err(|e| {
            GraftError::Manifest {
                message: format!("Failed to parse manifest: {e}"),
            }
            .into()
        })
    }

    /// All `[dependencies]` entries as direct declarations, in key order.
    pub fn direct_declarations(&self) -> Result<Vec<DependencyDeclaration>, GraftError> {
        self.dependencies
            .values()
            .map(Dependency::to_declaration)
            .collect()
    }

    /// All `[platforms]` entries as coordinates, in key order.
    pub fn platform_coordinates(&self) -> Result<Vec<Coordinate>, GraftError> {
        self.platforms
            .iter()
            .map(|(name, coord)| {
                Coordinate::parse(coord).map_err(|e| GraftError::Manifest {
                    message: format!("platform `{name}`: {e}"),
                })
            })
            .collect()
    }
}
