//! Shared utilities for Graft.
//!
//! This crate provides the cross-cutting error type used by every other
//! Graft crate.

pub mod errors;
