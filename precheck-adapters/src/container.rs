//! Running checks inside an already running container.

use std::path::Path;

use precheck_core::adapter::{EnvironmentAdapter, EnvironmentHandle};
use precheck_core::error::{Error, Result};
use precheck_core::package::Package;

/// Wraps commands in `docker exec`, working in the package root.
///
/// The container must mount the repository at the same path as the host.
pub struct ContainerAdapter;

impl EnvironmentAdapter for ContainerAdapter {
    fn kind(&self) -> &'static str {
        "container"
    }

    fn detect(&self, _root: &Path) -> bool {
        false
    }

    fn resolve(&self, package: &Package) -> Result<EnvironmentHandle> {
        let name = package
            .environment
            .as_ref()
            .and_then(|e| e.name.as_deref())
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| Error::EnvironmentNotFound {
                package: package.name.clone(),
                message: "container environment needs a 'name'".to_string(),
            })?;

        let root = package.root.display().to_string();
        Ok(EnvironmentHandle::new(self.kind(), name)
            .with_wrapper(["docker", "exec", "-w", root.as_str(), name]))
    }
}
