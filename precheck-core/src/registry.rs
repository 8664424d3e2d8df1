//! Package discovery.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{Error, Result};
use crate::manifest::{Manifest, WorkspaceConfig, MANIFEST_FILE};
use crate::package::Package;
use crate::path_utils;

/// Default directory depth searched for manifests.
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Directory names never descended into.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "__pycache__",
    ".pytest_cache",
    ".mypy_cache",
    ".ruff_cache",
    ".venv",
    "venv",
    "node_modules",
    "target",
    ".tox",
    ".idea",
    ".vscode",
];

/// Discovers packages under a root directory.
///
/// Looks for `precheck.toml` files up to a bounded depth and returns the
/// packages sorted by root path, so every run sees the same order.
pub struct PackageRegistry {
    root: PathBuf,
    max_depth: usize,
    excludes: Vec<String>,
}

impl PackageRegistry {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            max_depth: DEFAULT_MAX_DEPTH,
            excludes: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Applies the depth bound and extra excludes of a workspace file.
    pub fn with_workspace_config(mut self, config: &WorkspaceConfig) -> Self {
        if let Some(depth) = config.max_depth {
            self.max_depth = depth;
        }
        self.excludes.extend(config.exclude.iter().cloned());
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && self
                .excludes
                .iter()
                .any(|ex| entry.file_name().to_string_lossy() == ex.as_str())
    }

    pub fn discover(&self) -> Result<Vec<Package>> {
        let metadata = std::fs::metadata(&self.root).map_err(|e| Error::Discovery {
            root: self.root.clone(),
            message: e.to_string(),
        })?;
        if !metadata.is_dir() {
            return Err(Error::Discovery {
                root: self.root.clone(),
                message: "not a directory".to_string(),
            });
        }
        std::fs::read_dir(&self.root).map_err(|e| Error::Discovery {
            root: self.root.clone(),
            message: e.to_string(),
        })?;

        let root = path_utils::canonical_dir(&self.root);

        let manifest_files: Vec<PathBuf> = WalkDir::new(&root)
            .max_depth(self.max_depth + 1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.is_excluded(e))
            .filter_map(|e| match e {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!(error = %err, "skipping unreadable entry during discovery");
                    None
                }
            })
            .filter(|e| e.file_type().is_file() && e.file_name() == MANIFEST_FILE)
            .map(|e| e.into_path())
            .collect();

        let packages: Result<Vec<Option<Package>>> = manifest_files
            .into_par_iter()
            .map(|manifest_path| {
                let package_root = manifest_path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.clone());
                let manifest = Manifest::load(&manifest_path).map_err(|e| Error::Discovery {
                    root: root.clone(),
                    message: format!("{}: {}", manifest_path.display(), e),
                })?;
                if !manifest.is_package() {
                    return Ok(None);
                }
                manifest
                    .into_package(&package_root, &manifest_path)
                    .map(Some)
                    .map_err(|e| Error::Discovery {
                        root: root.clone(),
                        message: format!("{}: {}", manifest_path.display(), e),
                    })
            })
            .collect();

        let mut packages: Vec<Package> = packages?.into_iter().flatten().collect();
        packages.sort_by(|a, b| a.root.cmp(&b.root));
        debug!(root = %root.display(), count = packages.len(), "discovered packages");
        Ok(packages)
    }
}

/// Discovers packages under `root` with default settings.
pub fn discover(root: impl AsRef<Path>) -> Result<Vec<Package>> {
    PackageRegistry::new(root).discover()
}
