//! Conflict reporting for modules whose requested versions cannot be reconciled.

use std::fmt;

use graft_core::dependency::{DeclarationSource, ModuleId};
use miette::Diagnostic;

/// Why resolution of a module failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// No version satisfies every request.
    UnsatisfiableConstraint,
    /// A requested version cannot be parsed, so requests cannot be compared.
    MalformedVersionString,
    /// Only versionless declarations, and no platform manages the module.
    MissingVersion,
    /// Differing requests while `fail-on-version-conflict` is enabled.
    VersionConflict,
}

impl ConflictKind {
    fn code(self) -> &'static str {
        match self {
            Self::UnsatisfiableConstraint => "graft::unsatisfiable_constraint",
            Self::MalformedVersionString => "graft::malformed_version",
            Self::MissingVersion => "graft::missing_version",
            Self::VersionConflict => "graft::version_conflict",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UnsatisfiableConstraint => "unsatisfiable version constraints",
            Self::MalformedVersionString => "malformed version string",
            Self::MissingVersion => "no version declared",
            Self::VersionConflict => "version conflict",
        })
    }
}

/// One request that took part in a conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictingRequest {
    /// The constraint as written, empty for a versionless declaration.
    pub constraint: String,
    pub source: DeclarationSource,
    /// Declarations from the direct dependency down to the request itself.
    pub ancestry: Vec<String>,
}

impl fmt::Display for ConflictingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let constraint = if self.constraint.is_empty() {
            "<none>"
        } else {
            &self.constraint
        };
        write!(
            f,
            "{constraint} ({}) via {}",
            self.source,
            self.ancestry.join(" -> ")
        )
    }
}

/// A module that could not be resolved, with every request that was made for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictReport {
    pub module: ModuleId,
    pub kind: ConflictKind,
    pub requests: Vec<ConflictingRequest>,
}

impl ConflictReport {
    pub fn new(module: ModuleId, kind: ConflictKind) -> Self {
        Self {
            module,
            kind,
            requests: Vec::new(),
        }
    }

    pub fn add(&mut self, request: ConflictingRequest) {
        self.requests.push(request);
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// The constraints involved, in request order.
    pub fn constraints(&self) -> Vec<&str> {
        self.requests.iter().map(|r| r.constraint.as_str()).collect()
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} for {}", self.kind, self.module)?;
        for request in &self.requests {
            write!(f, "\n  {request}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConflictReport {}

impl Diagnostic for ConflictReport {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.kind.code()))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match self.kind {
            ConflictKind::MissingVersion => format!(
                "declare a version for {} or add a platform that manages it",
                self.module
            ),
            _ => format!(
                "pin a single version with [resolution] force = [\"{}:<version>\"]",
                self.module
            ),
        };
        Some(Box::new(help))
    }
}
