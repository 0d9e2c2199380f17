//! Operations behind each `graft` subcommand.
//!
//! Every operation loads the project through [`project::Project`], which
//! merges the manifest's rules with the global configuration and hands the
//! result to the resolver as an explicit request.

pub mod ops_lock;
pub mod ops_resolve;
pub mod ops_tree;
pub mod ops_why;
pub mod project;
