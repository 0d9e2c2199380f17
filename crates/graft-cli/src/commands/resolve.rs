//! Handler for `graft resolve`.

use std::path::Path;

use miette::Result;

use graft_ops::ops_resolve::{self, ResolveOptions};

pub fn exec(manifest_path: &Path, json: bool) -> Result<()> {
    super::require_manifest(manifest_path)?;
    ops_resolve::resolve(manifest_path, &ResolveOptions { json })
}
