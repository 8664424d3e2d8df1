//! Environment adapter trait and the handle it resolves to.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;

use crate::error::Result;
use crate::package::Package;

/// A resolved, pre-provisioned toolchain for one package.
///
/// Applying a handle only ever configures the spawned [`Command`]; the
/// orchestrator's own environment is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentHandle {
    pub kind: String,
    /// Human-readable identifier, e.g. the venv path or container name.
    pub id: String,
    /// Directories prepended to `PATH`.
    pub path_prefix: Vec<PathBuf>,
    /// Extra environment variables.
    pub env: Vec<(String, String)>,
    /// Program and arguments the command is run through, e.g. `poetry run`.
    pub wrapper: Vec<String>,
}

impl EnvironmentHandle {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
            path_prefix: Vec::new(),
            env: Vec::new(),
            wrapper: Vec::new(),
        }
    }

    pub fn with_path_prefix(mut self, dir: impl Into<PathBuf>) -> Self {
        self.path_prefix.push(dir.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn with_wrapper<I, S>(mut self, wrapper: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.wrapper = wrapper.into_iter().map(Into::into).collect();
        self
    }

    /// Builds a command for `program` running inside this environment.
    pub fn command(&self, program: &str, working_dir: &Path) -> Command {
        let mut command = match self.wrapper.split_first() {
            Some((wrapper, args)) => {
                let mut command = Command::new(wrapper);
                command.args(args).arg(program);
                command
            }
            None => Command::new(program),
        };
        command.current_dir(working_dir);

        if !self.path_prefix.is_empty() {
            let mut dirs: Vec<PathBuf> = self.path_prefix.clone();
            if let Some(path) = std::env::var_os("PATH") {
                dirs.extend(std::env::split_paths(&path));
            }
            if let Ok(joined) = std::env::join_paths(dirs) {
                command.env("PATH", joined);
            }
        }
        for (key, value) in &self.env {
            command.env(key, OsString::from(value));
        }
        command
    }
}

/// Resolves isolated toolchains of one kind.
///
/// Adapters only look up environments that already exist. They never
/// create or install anything.
pub trait EnvironmentAdapter: Send + Sync {
    fn kind(&self) -> &'static str;

    /// Whether a package without a declared environment looks like this kind.
    fn detect(&self, root: &Path) -> bool;

    fn resolve(&self, package: &Package) -> Result<EnvironmentHandle>;
}
