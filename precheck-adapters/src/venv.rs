//! Python virtual environment adapter.
//!
//! Resolves an existing virtualenv inside the package root. Commands see the
//! venv's `bin` directory first on `PATH` and `VIRTUAL_ENV` set, which is
//! what `activate` does, without sourcing anything.

use std::path::{Path, PathBuf};

use precheck_core::adapter::{EnvironmentAdapter, EnvironmentHandle};
use precheck_core::error::{Error, Result};
use precheck_core::package::Package;

/// Directory names probed when a package does not name its venv.
const DEFAULT_VENV_DIRS: &[&str] = &[".venv", "venv"];

pub struct VenvAdapter;

impl VenvAdapter {
    fn bin_dir(venv: &Path) -> Option<PathBuf> {
        ["bin", "Scripts"]
            .iter()
            .map(|dir| venv.join(dir))
            .find(|dir| dir.is_dir())
    }

    fn find(root: &Path) -> Option<(PathBuf, PathBuf)> {
        DEFAULT_VENV_DIRS.iter().find_map(|name| {
            let venv = root.join(name);
            Self::bin_dir(&venv).map(|bin| (venv, bin))
        })
    }
}

impl EnvironmentAdapter for VenvAdapter {
    fn kind(&self) -> &'static str {
        "venv"
    }

    fn detect(&self, root: &Path) -> bool {
        Self::find(root).is_some()
    }

    fn resolve(&self, package: &Package) -> Result<EnvironmentHandle> {
        let declared = package.environment.as_ref().and_then(|e| e.path.as_deref());

        let found = match declared {
            Some(path) => {
                let venv = package.root.join(path);
                Self::bin_dir(&venv).map(|bin| (venv, bin))
            }
            None => Self::find(&package.root),
        };

        let (venv, bin) = found.ok_or_else(|| Error::EnvironmentNotFound {
            package: package.name.clone(),
            message: match declared {
                Some(path) => format!(
                    "virtualenv '{}' not found in {}",
                    path,
                    package.root.display()
                ),
                None => format!(
                    "no virtualenv ({}) found in {}",
                    DEFAULT_VENV_DIRS.join(", "),
                    package.root.display()
                ),
            },
        })?;

        Ok(EnvironmentHandle::new(self.kind(), venv.display().to_string())
            .with_path_prefix(bin)
            .with_env("VIRTUAL_ENV", venv.display().to_string()))
    }
}
