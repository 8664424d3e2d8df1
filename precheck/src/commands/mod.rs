//! Command implementations for the CLI.

mod check;
mod discovery;

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use precheck_core::manifest::load_workspace_config;
use precheck_core::path_utils::canonical_dir;
use precheck_core::{
    Baseline, ChangeSet, ChangeSetResolver, GitCli, Package, PackageRegistry, WorkspaceConfig,
};

pub use check::{cmd_check, CheckOptions};
pub use discovery::{cmd_affected, cmd_list};

/// Discovered packages and workspace settings for one invocation.
struct Workspace {
    root: PathBuf,
    config: WorkspaceConfig,
    packages: Vec<Package>,
}

impl Workspace {
    fn load(root: &Path) -> Result<Self> {
        let config = load_workspace_config(root)
            .with_context(|| format!("failed to read workspace config in {}", root.display()))?
            .unwrap_or_default();
        let packages = PackageRegistry::new(root)
            .with_workspace_config(&config)
            .discover()?;
        Ok(Self {
            root: canonical_dir(root),
            config,
            packages,
        })
    }

    fn resolve_changes(&self, baseline: &Baseline) -> Result<ChangeSet> {
        let cwd = std::env::current_dir().context("failed to read current directory")?;
        let resolver = ChangeSetResolver::new(GitCli::new(&self.root), cwd);
        Ok(resolver.resolve(baseline)?)
    }
}

/// Reads changed file paths from stdin, one per line.
pub fn read_stdin_paths() -> Result<Vec<PathBuf>> {
    let stdin = io::stdin();
    let mut files = Vec::new();

    for line in stdin.lock().lines() {
        let line = line.context("failed to read paths from stdin")?;
        let path = PathBuf::from(line.trim());
        if !path.as_os_str().is_empty() {
            files.push(path);
        }
    }

    Ok(files)
}
