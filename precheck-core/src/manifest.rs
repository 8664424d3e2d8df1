//! TOML parsing for package manifests and the workspace file.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::command_validator::CommandValidator;
use crate::error::{Error, Result};
use crate::package::{CheckSpec, EnvironmentSpec, Package};

/// File name that marks a directory as a package.
pub const MANIFEST_FILE: &str = "precheck.toml";

/// Contents of a `precheck.toml` file.
///
/// The same file format serves packages and the workspace root; a root file
/// with a `[workspace]` table and no checks is configuration only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    pub name: Option<String>,
    pub environment: Option<EnvironmentSpec>,
    #[serde(default, rename = "check")]
    pub checks: Vec<CheckSpec>,
    pub workspace: Option<WorkspaceConfig>,
}

/// Workspace-level configuration from the `[workspace]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Directory depth bound for package discovery.
    pub max_depth: Option<usize>,
    /// Number of packages checked in parallel.
    pub concurrency: Option<usize>,
    /// Stop a package's remaining checks after its first failure.
    pub fail_fast: Option<bool>,
    /// Run-level timeout.
    pub timeout_secs: Option<u64>,
    /// Extra directory names skipped during discovery.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Packages checked on every run, changed or not.
    #[serde(default)]
    pub always_check: Vec<String>,
}

impl Manifest {
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|error| Error::Toml {
            error,
            context: path.display().to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, path)
    }

    /// Whether this file describes a package rather than only workspace settings.
    pub fn is_package(&self) -> bool {
        self.workspace.is_none() || !self.checks.is_empty()
    }

    /// Builds the package rooted at `root`, validating names and checks.
    pub fn into_package(self, root: &Path, manifest_path: &Path) -> Result<Package> {
        let name = match self.name {
            Some(name) => name,
            None => root
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .ok_or_else(|| Error::InvalidPackageName(root.display().to_string()))?,
        };
        CommandValidator::validate_identifier(&name, "Package")?;

        let mut seen = HashSet::new();
        for check in &self.checks {
            if !seen.insert(check.name.as_str()) {
                return Err(Error::InvalidCheck {
                    package: name.clone(),
                    check: check.name.clone(),
                    message: "duplicate check name".to_string(),
                });
            }
            if check.command.trim().is_empty() {
                return Err(Error::InvalidCheck {
                    package: name.clone(),
                    check: check.name.clone(),
                    message: "command cannot be empty".to_string(),
                });
            }
        }

        Ok(Package {
            name,
            root: root.to_path_buf(),
            manifest_path: manifest_path.to_path_buf(),
            environment: self.environment,
            checks: self.checks,
        })
    }
}

/// Reads the `[workspace]` table of `<root>/precheck.toml`, if any.
pub fn load_workspace_config(root: &Path) -> Result<Option<WorkspaceConfig>> {
    let path = root.join(MANIFEST_FILE);
    if !path.is_file() {
        return Ok(None);
    }
    Ok(Manifest::load(&path)?.workspace)
}
