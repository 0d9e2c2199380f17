//! Dependency resolution engine: transitive expansion with a cycle guard,
//! exclusion rules, forced versions, platform-managed versions, and
//! highest-version-wins conflict resolution.

pub mod cache;
pub mod conflict;
pub mod graph;
pub mod registry;
pub mod resolver;
pub mod source;
pub mod version;

pub use conflict::{ConflictKind, ConflictReport};
pub use resolver::{resolve, ConflictStrategy, Resolution, ResolutionRequest, ResolvedGraph};
pub use source::DependencySource;
