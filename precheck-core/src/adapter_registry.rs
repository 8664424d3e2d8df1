//! Registry of environment adapters keyed by kind.

use std::sync::{Arc, RwLock};

use crate::adapter::EnvironmentAdapter;

/// Ordered registry of environment adapters.
///
/// Registration order is the order adapters are tried when a package does
/// not declare its environment kind.
pub struct AdapterRegistry {
    adapters: RwLock<Vec<Arc<dyn EnvironmentAdapter>>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self {
            adapters: RwLock::new(Vec::new()),
        }
    }

    /// Registers an adapter, replacing any earlier one of the same kind.
    pub fn register<A>(&self, adapter: A)
    where
        A: EnvironmentAdapter + 'static,
    {
        if let Ok(mut adapters) = self.adapters.write() {
            let kind = adapter.kind();
            adapters.retain(|a| a.kind() != kind);
            adapters.push(Arc::new(adapter));
        }
    }

    /// Gets the adapter for a kind.
    pub fn get(&self, kind: &str) -> Option<Arc<dyn EnvironmentAdapter>> {
        self.adapters
            .read()
            .ok()
            .and_then(|adapters| adapters.iter().find(|a| a.kind() == kind).cloned())
    }

    /// First adapter, in registration order, whose `detect` accepts `root`.
    pub fn detect(&self, root: &std::path::Path) -> Option<Arc<dyn EnvironmentAdapter>> {
        self.adapters
            .read()
            .ok()
            .and_then(|adapters| adapters.iter().find(|a| a.detect(root)).cloned())
    }

    /// Lists registered kinds in registration order.
    pub fn registered_kinds(&self) -> Vec<&'static str> {
        self.adapters
            .read()
            .map(|adapters| adapters.iter().map(|a| a.kind()).collect())
            .unwrap_or_default()
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
