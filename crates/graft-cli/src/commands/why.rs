//! Handler for `graft why`.

use std::path::Path;

use miette::Result;

use graft_ops::ops_why;

pub fn exec(manifest_path: &Path, module: &str) -> Result<()> {
    super::require_manifest(manifest_path)?;
    ops_why::why(manifest_path, module)
}
