//! Loading a project: manifest, global rules, registry.

use std::path::{Path, PathBuf};

use graft_core::config::{self, GlobalConfig};
use graft_core::manifest::Manifest;
use graft_resolver::registry::StaticRegistry;
use graft_resolver::{resolve, ConflictStrategy, Resolution, ResolutionRequest};
use graft_util::errors::GraftError;

/// A loaded project, ready to resolve.
pub struct Project {
    /// Directory containing `Graft.toml`.
    pub root: PathBuf,
    pub manifest: Manifest,
    pub registry: StaticRegistry,
    pub request: ResolutionRequest,
}

impl Project {
    /// Load the project at `manifest_path` with the user's global config.
    pub fn load(manifest_path: &Path) -> miette::Result<Self> {
        let config = GlobalConfig::load()?;
        Self::load_with_config(manifest_path, &config)
    }

    pub fn load_with_config(manifest_path: &Path, config: &GlobalConfig) -> miette::Result<Self> {
        let manifest = Manifest::from_path(manifest_path)?;
        let root = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let registry = load_registry(&manifest, config, &root)?;
        let request = build_request(&manifest, config)?;

        Ok(Self {
            root,
            manifest,
            registry,
            request,
        })
    }

    pub fn resolve(&self) -> miette::Result<Resolution> {
        let resolution = resolve(&self.request, &self.registry)?;
        tracing::debug!(
            "resolved {} modules for {}",
            resolution.resolved.len(),
            self.request.root
        );
        Ok(resolution)
    }
}

/// The project's registry, else the global fallback, else an empty registry.
fn load_registry(
    manifest: &Manifest,
    config: &GlobalConfig,
    root: &Path,
) -> miette::Result<StaticRegistry> {
    let path = match (&manifest.registry, &config.registry) {
        (Some(reg), _) => reg.resolve_path(root),
        (None, Some(reg)) => reg.resolve_path(&config::dirs_path()),
        (None, None) => {
            tracing::warn!("no registry configured; only direct dependencies will be resolved");
            return Ok(StaticRegistry::new());
        }
    };
    tracing::debug!("loading registry from {}", path.display());
    let registry = StaticRegistry::from_path(&path)?;
    tracing::debug!("registry lists {} modules", registry.module_count());
    Ok(registry)
}

fn build_request(manifest: &Manifest, config: &GlobalConfig) -> miette::Result<ResolutionRequest> {
    let rules = manifest.resolution.merged_with(&config.resolution);
    let strategy = if rules.fail_on_version_conflict {
        ConflictStrategy::Fail
    } else {
        ConflictStrategy::HighestWins
    };

    let request = ResolutionRequest {
        root: root_label(manifest),
        direct: manifest.direct_declarations()?,
        exclusions: rules.exclude,
        forces: rules.force,
        platforms: manifest.platform_coordinates()?,
        strategy,
    };
    Ok(request)
}

fn root_label(manifest: &Manifest) -> String {
    let project = &manifest.project;
    match (&project.group, &project.version) {
        (Some(group), Some(version)) => format!("{group}:{}:{version}", project.name),
        (_, Some(version)) => format!("{} v{version}", project.name),
        _ => project.name.clone(),
    }
}

/// Error for a missing manifest, shared by every command.
pub fn missing_manifest(path: &Path) -> GraftError {
    GraftError::Manifest {
        message: format!("could not find {}", path.display()),
    }
}
