pub mod container;
pub mod node;
pub mod poetry;
pub mod system;
pub mod venv;

use std::sync::Arc;

pub use container::ContainerAdapter;
pub use node::NodeAdapter;
pub use poetry::PoetryAdapter;
pub use system::SystemAdapter;
pub use venv::VenvAdapter;

use precheck_core::adapter_registry::AdapterRegistry;

/// Registry with every built-in adapter.
///
/// Detection order for packages without a declared kind is venv, Poetry,
/// then Node; container and system environments must be declared.
pub fn default_registry() -> Arc<AdapterRegistry> {
    let registry = AdapterRegistry::new();
    registry.register(VenvAdapter);
    registry.register(PoetryAdapter);
    registry.register(NodeAdapter);
    registry.register(ContainerAdapter);
    registry.register(SystemAdapter);
    Arc::new(registry)
}
