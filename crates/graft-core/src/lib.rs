//! Core data types for Graft.
//!
//! This crate defines the inputs and outputs of dependency resolution:
//! module coordinates, dependency declarations, force and exclusion rules,
//! the `Graft.toml` manifest, the `Graft.lock` lockfile, and the global
//! user configuration.
//!
//! This crate is intentionally free of resolution logic.

pub mod config;
pub mod dependency;
pub mod lockfile;
pub mod manifest;
