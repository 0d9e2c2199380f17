use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while parsing coordinates and rule shorthands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinateError {
    #[error("empty coordinate")]
    Empty,

    #[error("invalid coordinate `{input}`: expected {expected}")]
    Malformed {
        input: String,
        expected: &'static str,
    },
}

/// A `group:module` pair identifying a library independent of its version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModuleId {
    pub group: String,
    pub module: String,
}

impl ModuleId {
    pub fn new(group: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            module: module.into(),
        }
    }

    /// Parse `"group:module"`.
    pub fn parse(s: &str) -> Result<Self, CoordinateError> {
        let parts = split_parts(s)?;
        match parts.as_slice() {
            [group, module] => Ok(Self::new(*group, *module)),
            _ => Err(CoordinateError::Malformed {
                input: s.to_string(),
                expected: "group:module",
            }),
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.module)
    }
}

/// Fully pinned coordinates, as used for platforms (BOMs).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub group: String,
    pub module: String,
    pub version: String,
}

impl Coordinate {
    /// Parse `"group:module:version"` into coordinates.
    pub fn parse(s: &str) -> Result<Self, CoordinateError> {
        let parts = split_parts(s)?;
        match parts.as_slice() {
            [group, module, version] => Ok(Self {
                group: group.to_string(),
                module: module.to_string(),
                version: version.to_string(),
            }),
            _ => Err(CoordinateError::Malformed {
                input: s.to_string(),
                expected: "group:module:version",
            }),
        }
    }

    pub fn module_id(&self) -> ModuleId {
        ModuleId::new(&self.group, &self.module)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.module, self.version)
    }
}

/// Where a declaration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationSource {
    /// Declared by the top-level project.
    Direct,
    /// Pulled in by another declaration's metadata.
    Transitive,
}

impl fmt::Display for DeclarationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => f.write_str("direct"),
            Self::Transitive => f.write_str("transitive"),
        }
    }
}

/// A single requirement on a library: `group:module` at some version constraint.
///
/// An empty `version_constraint` marks a versionless declaration whose version
/// is expected to come from a platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyDeclaration {
    pub group: String,
    pub module: String,
    pub version_constraint: String,
    pub source: DeclarationSource,
    /// Exclusions scoped to everything this declaration pulls in.
    pub exclusions: Vec<ExclusionRule>,
}

impl DependencyDeclaration {
    pub fn direct(
        group: impl Into<String>,
        module: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self::new(group, module, constraint, DeclarationSource::Direct)
    }

    pub fn transitive(
        group: impl Into<String>,
        module: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self::new(group, module, constraint, DeclarationSource::Transitive)
    }

    fn new(
        group: impl Into<String>,
        module: impl Into<String>,
        constraint: impl Into<String>,
        source: DeclarationSource,
    ) -> Self {
        Self {
            group: group.into(),
            module: module.into(),
            version_constraint: constraint.into(),
            source,
            exclusions: Vec::new(),
        }
    }

    /// Parse the shorthand `"group:module:constraint"` or `"group:module"`.
    pub fn parse(s: &str, source: DeclarationSource) -> Result<Self, CoordinateError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CoordinateError::Empty);
        }
        let mut parts = s.splitn(3, ':');
        let group = parts.next().unwrap_or_default().trim();
        let module = parts.next().unwrap_or_default().trim();
        let constraint = parts.next().unwrap_or_default().trim();
        if group.is_empty() || module.is_empty() {
            return Err(CoordinateError::Malformed {
                input: s.to_string(),
                expected: "group:module[:constraint]",
            });
        }
        Ok(Self::new(group, module, constraint, source))
    }

    pub fn with_exclusion(mut self, rule: ExclusionRule) -> Self {
        self.exclusions.push(rule);
        self
    }

    pub fn module_id(&self) -> ModuleId {
        ModuleId::new(&self.group, &self.module)
    }

    pub fn is_versionless(&self) -> bool {
        self.version_constraint.is_empty()
    }
}

impl fmt::Display for DependencyDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version_constraint.is_empty() {
            write!(f, "{}:{}", self.group, self.module)
        } else {
            write!(f, "{}:{}:{}", self.group, self.module, self.version_constraint)
        }
    }
}

/// Omit a module (or a whole group) wherever it would otherwise appear.
///
/// `module: None` is the wildcard and matches every module in the group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExclusionRule {
    pub group: String,
    pub module: Option<String>,
}

impl ExclusionRule {
    pub fn new(group: impl Into<String>, module: impl Into<String>) -> Self {
        let module = module.into();
        Self {
            group: group.into(),
            module: if module == "*" { None } else { Some(module) },
        }
    }

    pub fn group(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            module: None,
        }
    }

    /// Parse `"group:module"`, `"group:*"` or `"group"`.
    pub fn parse(s: &str) -> Result<Self, CoordinateError> {
        let parts = split_parts(s)?;
        match parts.as_slice() {
            [group] => Ok(Self::group(*group)),
            [group, module] => Ok(Self::new(*group, *module)),
            _ => Err(CoordinateError::Malformed {
                input: s.to_string(),
                expected: "group[:module]",
            }),
        }
    }

    pub fn matches(&self, group: &str, module: &str) -> bool {
        self.group == group && self.module.as_deref().map_or(true, |m| m == module)
    }
}

impl fmt::Display for ExclusionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.module.as_deref().unwrap_or("*"))
    }
}

impl TryFrom<String> for ExclusionRule {
    type Error = CoordinateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ExclusionRule> for String {
    fn from(rule: ExclusionRule) -> Self {
        rule.to_string()
    }
}

/// Pin `group:module` to `version`, regardless of what was requested.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ForceRule {
    pub group: String,
    pub module: String,
    pub version: String,
}

impl ForceRule {
    pub fn new(
        group: impl Into<String>,
        module: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            module: module.into(),
            version: version.into(),
        }
    }

    /// Parse `"group:module:version"`.
    pub fn parse(s: &str) -> Result<Self, CoordinateError> {
        let coord = Coordinate::parse(s)?;
        Ok(Self::new(coord.group, coord.module, coord.version))
    }

    pub fn matches(&self, group: &str, module: &str) -> bool {
        self.group == group && self.module == module
    }

    pub fn module_id(&self) -> ModuleId {
        ModuleId::new(&self.group, &self.module)
    }
}

impl fmt::Display for ForceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.module, self.version)
    }
}

impl TryFrom<String> for ForceRule {
    type Error = CoordinateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ForceRule> for String {
    fn from(rule: ForceRule) -> Self {
        rule.to_string()
    }
}

fn split_parts(s: &str) -> Result<Vec<&str>, CoordinateError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(CoordinateError::Empty);
    }
    let parts: Vec<&str> = s.split(':').map(str::trim).collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(CoordinateError::Malformed {
            input: s.to_string(),
            expected: "non-empty `:`-separated parts",
        });
    }
    Ok(parts)
}
