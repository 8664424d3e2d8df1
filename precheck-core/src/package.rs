//! Package data models.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment declaration from a package manifest.
///
/// `kind` selects the adapter; the remaining fields are adapter specific.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSpec {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EnvironmentSpec {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            path: None,
            name: None,
        }
    }
}

fn default_pass_filenames() -> bool {
    true
}

/// A check declared by a package: one external command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSpec {
    pub name: String,
    pub command: String,
    /// Append the package's changed files to the command line.
    #[serde(default = "default_pass_filenames")]
    pub pass_filenames: bool,
    /// Regex matched against root-relative paths to narrow the file set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,
}

impl CheckSpec {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            pass_filenames: true,
            include: None,
        }
    }
}

/// A package in the monorepo, identified by its root directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub root: PathBuf,
    pub manifest_path: PathBuf,
    pub environment: Option<EnvironmentSpec>,
    pub checks: Vec<CheckSpec>,
}

impl Package {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>, checks: Vec<CheckSpec>) -> Self {
        let root = root.into();
        Self {
            name: name.into(),
            manifest_path: root.join(crate::manifest::MANIFEST_FILE),
            root,
            environment: None,
            checks,
        }
    }

    pub fn with_environment(mut self, environment: EnvironmentSpec) -> Self {
        self.environment = Some(environment);
        self
    }

    #[inline]
    pub fn get_check(&self, name: &str) -> Option<&CheckSpec> {
        self.checks.iter().find(|c| c.name == name)
    }

    /// Whether `path` lies under this package's root.
    #[inline]
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.root)
    }
}
