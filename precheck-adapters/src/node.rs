use std::fs;
use std::path::Path;

use precheck_core::adapter::{EnvironmentAdapter, EnvironmentHandle};
use precheck_core::error::{Error, Result};
use precheck_core::package::Package;
use serde_json::Value;

pub struct NodeAdapter;

impl EnvironmentAdapter for NodeAdapter {
    fn kind(&self) -> &'static str {
        "node"
    }

    fn detect(&self, root: &Path) -> bool {
        root.join("package.json").exists()
    }

    fn resolve(&self, package: &Package) -> Result<EnvironmentHandle> {
        let package_json_path = package.root.join("package.json");
        let content = fs::read_to_string(&package_json_path).map_err(|_| Error::EnvironmentNotFound {
            package: package.name.clone(),
            message: format!("package.json not found in {}", package.root.display()),
        })?;

        let json: Value = serde_json::from_str(&content).map_err(|e| Error::EnvironmentNotFound {
            package: package.name.clone(),
            message: format!("Failed to parse package.json: {}", e),
        })?;

        let bin = package.root.join("node_modules").join(".bin");
        if !bin.is_dir() {
            return Err(Error::EnvironmentNotFound {
                package: package.name.clone(),
                message: format!(
                    "{} does not exist; install the package's dependencies first",
                    bin.display()
                ),
            });
        }

        let id = match (
            json.get("name").and_then(|v| v.as_str()),
            json.get("version").and_then(|v| v.as_str()),
        ) {
            (Some(name), Some(version)) => format!("{}@{}", name, version),
            (Some(name), None) => name.to_string(),
            _ => package.name.clone(),
        };

        Ok(EnvironmentHandle::new(self.kind(), id).with_path_prefix(bin))
    }
}
