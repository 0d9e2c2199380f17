//! Handler for `graft lock`.

use std::path::Path;

use miette::Result;

use graft_ops::ops_lock::{self, LockOptions};

pub fn exec(manifest_path: &Path, check: bool) -> Result<()> {
    super::require_manifest(manifest_path)?;
    ops_lock::lock(manifest_path, &LockOptions { check })
}
