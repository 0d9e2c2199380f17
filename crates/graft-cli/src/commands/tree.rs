//! Handler for `graft tree`.

use std::path::Path;

use miette::Result;

use graft_ops::ops_tree::{self, TreeOptions};

pub fn exec(manifest_path: &Path, depth: Option<u32>) -> Result<()> {
    super::require_manifest(manifest_path)?;
    let opts = TreeOptions {
        depth: depth.map(|d| d as usize),
    };
    ops_tree::tree(manifest_path, &opts)
}
