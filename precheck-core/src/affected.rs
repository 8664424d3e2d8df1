//! Mapping changed files onto the packages that own them.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::change::ChangeSet;
use crate::package::Package;
use crate::path_utils;

/// A package together with the changed files under its root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AffectedPackage {
    pub package: Package,
    /// Absolute paths, sorted.
    pub files: Vec<PathBuf>,
    /// Checked as a whole because it is always checked, not because of changes.
    pub whole_package: bool,
}

impl AffectedPackage {
    pub fn new(package: Package, files: Vec<PathBuf>) -> Self {
        Self {
            package,
            files,
            whole_package: false,
        }
    }

    /// Changed files relative to the package root.
    pub fn relative_files(&self) -> Vec<PathBuf> {
        self.files
            .iter()
            .map(|f| path_utils::relative_to(f, &self.package.root))
            .collect()
    }
}

/// Result of partitioning a change set over the discovered packages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AffectedMapping {
    /// Affected packages in discovery order.
    pub affected: Vec<AffectedPackage>,
    /// Changed files outside every package root.
    pub ignored: Vec<PathBuf>,
}

impl AffectedMapping {
    pub fn is_empty(&self) -> bool {
        self.affected.is_empty()
    }

    /// Adds packages named in `names` that no change touched.
    ///
    /// They are checked in whole-package mode. Discovery order is kept.
    pub fn include_always(mut self, packages: &[Package], names: &[String]) -> Self {
        if names.is_empty() {
            return self;
        }
        for name in names {
            if !packages.iter().any(|p| &p.name == name) {
                warn!(package = %name, "always-checked package was not discovered");
            }
        }

        let mut merged = Vec::with_capacity(packages.len());
        let mut existing = std::mem::take(&mut self.affected).into_iter().peekable();
        for package in packages {
            let changed = matches!(existing.peek(), Some(next) if next.package.root == package.root);
            if changed {
                merged.extend(existing.next());
            } else if names.contains(&package.name) {
                merged.push(AffectedPackage {
                    package: package.clone(),
                    files: Vec::new(),
                    whole_package: true,
                });
            }
        }
        merged.extend(existing);
        self.affected = merged;
        self
    }

    /// Keeps only packages whose name or root-relative path matches `filters`.
    pub fn retain_packages(mut self, filters: &[String], workspace_root: &Path) -> Self {
        if filters.is_empty() {
            return self;
        }
        self.affected.retain(|a| {
            let relative = path_utils::relative_to(&a.package.root, workspace_root);
            filters
                .iter()
                .any(|f| *f == a.package.name || Path::new(f) == relative)
        });
        self
    }
}

/// Index of the package owning `file`: the deepest root containing it.
pub fn owning_package(packages: &[Package], file: &Path) -> Option<usize> {
    packages
        .iter()
        .enumerate()
        .filter(|(_, p)| p.contains(file))
        .max_by_key(|(_, p)| p.root.components().count())
        .map(|(idx, _)| idx)
}

/// Partitions `changes` over `packages`.
///
/// Every changed file lands in exactly one place: the most specific package
/// root containing it, or the ignored list. Files outside all packages never
/// affect a package.
pub fn partition(packages: &[Package], changes: &ChangeSet) -> AffectedMapping {
    let mut buckets: Vec<Vec<PathBuf>> = vec![Vec::new(); packages.len()];
    let mut ignored = Vec::new();

    for file in changes.iter() {
        match owning_package(packages, file) {
            Some(idx) => buckets[idx].push(file.clone()),
            None => ignored.push(file.clone()),
        }
    }

    let affected: Vec<AffectedPackage> = packages
        .iter()
        .zip(buckets)
        .filter(|(_, files)| !files.is_empty())
        .map(|(package, files)| AffectedPackage::new(package.clone(), files))
        .collect();

    debug!(
        affected = affected.len(),
        ignored = ignored.len(),
        "mapped changes to packages"
    );

    AffectedMapping { affected, ignored }
}

/// Affected packages for `changes`, in discovery order.
pub fn map_affected(packages: &[Package], changes: &ChangeSet) -> Vec<AffectedPackage> {
    partition(packages, changes).affected
}
