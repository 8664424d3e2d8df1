//! Poetry adapter: runs checks through `poetry run`.

use std::fs;
use std::path::Path;

use precheck_core::adapter::{EnvironmentAdapter, EnvironmentHandle};
use precheck_core::error::{Error, Result};
use precheck_core::package::Package;
use toml::Value;

/// Adapter for Poetry-managed Python packages.
pub struct PoetryAdapter;

impl PoetryAdapter {
    fn read_pyproject(path: &Path) -> Option<Value> {
        let content = fs::read_to_string(path.join("pyproject.toml")).ok()?;
        content.parse().ok()
    }

    fn poetry_table(pyproject: &Value) -> Option<&Value> {
        pyproject.get("tool").and_then(|t| t.get("poetry"))
    }
}

impl EnvironmentAdapter for PoetryAdapter {
    fn kind(&self) -> &'static str {
        "poetry"
    }

    fn detect(&self, root: &Path) -> bool {
        Self::read_pyproject(root)
            .as_ref()
            .and_then(Self::poetry_table)
            .is_some()
    }

    fn resolve(&self, package: &Package) -> Result<EnvironmentHandle> {
        let pyproject_path = package.root.join("pyproject.toml");
        let content = fs::read_to_string(&pyproject_path).map_err(|e| Error::EnvironmentNotFound {
            package: package.name.clone(),
            message: format!("failed to read {}: {}", pyproject_path.display(), e),
        })?;

        let pyproject: Value = content.parse().map_err(|e| Error::EnvironmentNotFound {
            package: package.name.clone(),
            message: format!(
                "failed to parse {}: {}. File may be malformed.",
                pyproject_path.display(),
                e
            ),
        })?;

        let poetry = Self::poetry_table(&pyproject).ok_or_else(|| Error::EnvironmentNotFound {
            package: package.name.clone(),
            message: format!("no [tool.poetry] table in {}", pyproject_path.display()),
        })?;

        let project = poetry
            .get("name")
            .or_else(|| pyproject.get("project").and_then(|p| p.get("name")))
            .and_then(|v| v.as_str())
            .unwrap_or(&package.name);

        Ok(
            EnvironmentHandle::new(self.kind(), format!("poetry:{}", project))
                .with_wrapper(["poetry", "run"]),
        )
    }
}
