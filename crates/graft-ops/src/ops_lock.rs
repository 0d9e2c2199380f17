//! Operation: resolve and write (or verify) Graft.lock.

use std::path::Path;

use graft_core::lockfile::{LockedPackage, Lockfile, LOCKFILE_NAME};
use graft_resolver::resolver::Selection;
use graft_resolver::ResolvedGraph;
use graft_util::errors::{GraftError, GraftResult};

use crate::project::Project;

/// Options for `graft lock`.
#[derive(Default)]
pub struct LockOptions {
    /// Fail instead of writing when the lockfile is out of date.
    pub check: bool,
}

pub fn lock(manifest_path: &Path, opts: &LockOptions) -> GraftResult<()> {
    let project = Project::load(manifest_path)?;
    let resolution = project.resolve()?;
    let lockfile = Lockfile::generate(resolution_to_lockfile_packages(&resolution.resolved));
    let lockfile_path = project.root.join(LOCKFILE_NAME);

    if opts.check {
        return check(&lockfile, &lockfile_path);
    }

    if let Some(previous) = previous_lockfile(&lockfile_path) {
        for change in lockfile.changes_from(&previous) {
            eprintln!("{change}");
        }
    }
    lockfile.write_to(&lockfile_path)?;
    eprintln!("Locked {} modules", lockfile.package.len());
    Ok(())
}

/// The lockfile being replaced, if any. An unreadable one is logged and
/// then overwritten.
fn previous_lockfile(lockfile_path: &Path) -> Option<Lockfile> {
    if !lockfile_path.is_file() {
        return None;
    }
    match Lockfile::from_path(lockfile_path) {
        Ok(previous) => Some(previous),
        Err(e) => {
            tracing::warn!(
                "ignoring unreadable {}, regenerating: {e}",
                lockfile_path.display()
            );
            None
        }
    }
}

fn check(lockfile: &Lockfile, lockfile_path: &Path) -> miette::Result<()> {
    if !lockfile_path.is_file() {
        return Err(GraftError::Lockfile {
            message: format!(
                "{LOCKFILE_NAME} does not exist (looked for {})",
                lockfile_path.display()
            ),
        }
        .into());
    }
    let existing = Lockfile::from_path(lockfile_path)?;
    let changes = lockfile.changes_from(&existing);
    if changes.is_empty() {
        eprintln!("{LOCKFILE_NAME} is up to date");
        return Ok(());
    }
    for change in &changes {
        eprintln!("{change}");
    }
    Err(GraftError::Lockfile {
        message: format!("{LOCKFILE_NAME} is out of date ({} changes)", changes.len()),
    }
    .into())
}

/// One locked package per resolved module.
pub fn resolution_to_lockfile_packages(resolved: &ResolvedGraph) -> Vec<LockedPackage> {
    resolved
        .modules()
        .map(|m| LockedPackage {
            group: m.group.clone(),
            module: m.module.clone(),
            version: m.version.clone(),
            forced: m.selection == Selection::Forced,
            requested: m.requested.clone(),
        })
        .collect()
}
