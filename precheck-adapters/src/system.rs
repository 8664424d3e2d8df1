use std::path::Path;

use precheck_core::adapter::{EnvironmentAdapter, EnvironmentHandle};
use precheck_core::error::Result;
use precheck_core::package::Package;

/// Runs checks with the host toolchain as-is. Only used when declared.
pub struct SystemAdapter;

impl EnvironmentAdapter for SystemAdapter {
    fn kind(&self) -> &'static str {
        "system"
    }

    fn detect(&self, _root: &Path) -> bool {
        false
    }

    fn resolve(&self, _package: &Package) -> Result<EnvironmentHandle> {
        Ok(EnvironmentHandle::new(self.kind(), "system"))
    }
}
