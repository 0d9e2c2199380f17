use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use graft_util::errors::GraftError;

/// File name of the lockfile written next to `Graft.toml`.
pub const LOCKFILE_NAME: &str = "Graft.lock";

/// Deterministic lockfile recording the resolved version of every module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lockfile {
    #[serde(default = "default_lock_version")]
    pub version: u32,
    #[serde(default)]
    pub package: Vec<LockedPackage>,
}

fn default_lock_version() -> u32 {
    1
}

/// A single locked module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedPackage {
    pub group: String,
    pub module: String,
    pub version: String,
    /// Set when a force rule chose the version.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub forced: bool,
    /// Every constraint that was requested for this module.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requested: Vec<String>,
}

/// A difference between two lockfiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockChange {
    Added { key: String, version: String },
    Removed { key: String, version: String },
    Changed { key: String, from: String, to: String },
}

impl fmt::Display for LockChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockChange::Added { key, version } => write!(f, "+ {key} {version}"),
            LockChange::Removed { key, version } => write!(f, "- {key} {version}"),
            LockChange::Changed { key, from, to } => write!(f, "~ {key} {from} -> {to}"),
        }
    }
}

impl Lockfile {
    /// Build a lockfile, sorting packages by `group:module`.
    pub fn generate(mut package: Vec<LockedPackage>) -> Self {
        package.sort_by(|a, b| (&a.group, &a.module).cmp(&(&b.group, &b.module)));
        Self {
            version: default_lock_version(),
            package,
        }
    }

    /// Load and parse a `Graft.lock` file from the given path.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| GraftError::Lockfile {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        toml::from_str(&content).map_err(|e| {
            GraftError::Lockfile {
                message: format!("Failed to parse lockfile: {e}"),
            }
            .into()
        })
    }

    /// Serialize the lockfile to a pretty-printed TOML string.
    pub fn to_string_pretty(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn write_to(&self, path: &Path) -> miette::Result<()> {
        let body = self.to_string_pretty().map_err(|e| GraftError::Lockfile {
            message: format!("Failed to serialize lockfile: {e}"),
        })?;
        let content = format!("# This file is generated by graft. Do not edit.\n{body}");
        std::fs::write(path, content).map_err(GraftError::Io)?;
        Ok(())
    }

    pub fn locked_version(&self, group: &str, module: &str) -> Option<&str> {
        self.package
            .iter()
            .find(|p| p.group == group && p.module == module)
            .map(|p| p.version.as_str())
    }

    /// Changes needed to go from `previous` to `self`, ordered by module.
    pub fn changes_from(&self, previous: &Lockfile) -> Vec<LockChange> {
        let mut changes = Vec::new();
        for pkg in &self.package {
            let key = format!("{}:{}", pkg.group, pkg.module);
            match previous.locked_version(&pkg.group, &pkg.module) {
                None => changes.push(LockChange::Added {
                    key,
                    version: pkg.version.clone(),
                }),
                Some(old) if old != pkg.version => changes.push(LockChange::Changed {
                    key,
                    from: old.to_string(),
                    to: pkg.version.clone(),
                }),
                Some(_) => {}
            }
        }
        for pkg in &previous.package {
            if self.locked_version(&pkg.group, &pkg.module).is_none() {
                changes.push(LockChange::Removed {
                    key: format!("{}:{}", pkg.group, pkg.module),
                    version: pkg.version.clone(),
                });
            }
        }
        changes
    }
}
