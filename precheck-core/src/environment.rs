//! Per-run environment resolution with caching.

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::adapter::EnvironmentHandle;
use crate::adapter_registry::AdapterRegistry;
use crate::error::{Error, Result};
use crate::package::Package;

/// Resolves each package's environment once per run.
///
/// Safe to share between package workers; successful resolutions are
/// cached by package root.
pub struct EnvironmentResolver {
    registry: Arc<AdapterRegistry>,
    cache: DashMap<PathBuf, Arc<EnvironmentHandle>>,
}

impl EnvironmentResolver {
    pub fn new(registry: Arc<AdapterRegistry>) -> Self {
        Self {
            registry,
            cache: DashMap::new(),
        }
    }

    pub fn resolve(&self, package: &Package) -> Result<Arc<EnvironmentHandle>> {
        if let Some(handle) = self.cache.get(&package.root) {
            return Ok(Arc::clone(handle.value()));
        }

        let adapter = match &package.environment {
            Some(spec) => self
                .registry
                .get(&spec.kind)
                .ok_or_else(|| Error::EnvironmentNotFound {
                    package: package.name.clone(),
                    message: format!(
                        "unknown environment kind '{}'. Known kinds: {}",
                        spec.kind,
                        self.registry.registered_kinds().join(", ")
                    ),
                })?,
            None => self
                .registry
                .detect(&package.root)
                .ok_or_else(|| Error::EnvironmentNotFound {
                    package: package.name.clone(),
                    message: "no [environment] declared and none detected".to_string(),
                })?,
        };

        let handle = Arc::new(adapter.resolve(package)?);
        debug!(
            package = %package.name,
            kind = %handle.kind,
            id = %handle.id,
            "resolved environment"
        );
        self.cache.insert(package.root.clone(), Arc::clone(&handle));
        Ok(handle)
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}
