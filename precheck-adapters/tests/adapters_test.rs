use std::fs;
use std::path::Path;

use precheck_adapters::{
    default_registry, ContainerAdapter, NodeAdapter, PoetryAdapter, SystemAdapter, VenvAdapter,
};
use precheck_core::adapter::EnvironmentAdapter;
use precheck_core::environment::EnvironmentResolver;
use precheck_core::error::Error;
use precheck_core::package::{EnvironmentSpec, Package};
use tempfile::TempDir;

fn package(root: &Path) -> Package {
    Package::new("pkg", root, vec![])
}

#[test]
fn test_venv_detect_and_resolve() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    assert!(!VenvAdapter.detect(root));

    fs::create_dir_all(root.join(".venv/bin")).unwrap();
    assert!(VenvAdapter.detect(root));

    let handle = VenvAdapter.resolve(&package(root)).unwrap();
    assert_eq!(handle.kind, "venv");
    assert_eq!(handle.path_prefix, vec![root.join(".venv/bin")]);
    assert!(handle
        .env
        .iter()
        .any(|(k, v)| k == "VIRTUAL_ENV" && Path::new(v) == root.join(".venv")));
}

#[test]
fn test_venv_declared_path() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::create_dir_all(root.join("envs/py311/bin")).unwrap();

    let mut spec = EnvironmentSpec::new("venv");
    spec.path = Some("envs/py311".to_string());
    let handle = VenvAdapter
        .resolve(&package(root).with_environment(spec))
        .unwrap();
    assert_eq!(handle.path_prefix, vec![root.join("envs/py311/bin")]);
}

#[test]
fn test_venv_missing_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let err = VenvAdapter.resolve(&package(temp_dir.path())).unwrap_err();
    assert!(matches!(err, Error::EnvironmentNotFound { .. }));
}

#[test]
fn test_poetry_detect_and_resolve() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    fs::write(root.join("pyproject.toml"), "[project]\nname = \"plain\"\n").unwrap();
    assert!(!PoetryAdapter.detect(root));

    fs::write(
        root.join("pyproject.toml"),
        "[tool.poetry]\nname = \"api\"\nversion = \"0.1.0\"\n",
    )
    .unwrap();
    assert!(PoetryAdapter.detect(root));

    let handle = PoetryAdapter.resolve(&package(root)).unwrap();
    assert_eq!(handle.id, "poetry:api");
    assert_eq!(handle.wrapper, vec!["poetry".to_string(), "run".to_string()]);
}

#[test]
fn test_poetry_without_pyproject_fails() {
    let temp_dir = TempDir::new().unwrap();
    assert!(PoetryAdapter.resolve(&package(temp_dir.path())).is_err());
}

#[test]
fn test_node_requires_installed_dependencies() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::write(
        root.join("package.json"),
        r#"{"name": "web", "version": "1.2.0"}"#,
    )
    .unwrap();
    assert!(NodeAdapter.detect(root));

    let err = NodeAdapter.resolve(&package(root)).unwrap_err();
    assert!(err.to_string().contains("node_modules"));

    fs::create_dir_all(root.join("node_modules/.bin")).unwrap();
    let handle = NodeAdapter.resolve(&package(root)).unwrap();
    assert_eq!(handle.id, "web@1.2.0");
    assert_eq!(handle.path_prefix, vec![root.join("node_modules/.bin")]);
}

#[test]
fn test_node_invalid_package_json() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::write(root.join("package.json"), "{ not json").unwrap();
    fs::create_dir_all(root.join("node_modules/.bin")).unwrap();

    assert!(NodeAdapter.resolve(&package(root)).is_err());
}

#[test]
fn test_container_needs_name() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    assert!(!ContainerAdapter.detect(root));

    let bare = package(root).with_environment(EnvironmentSpec::new("container"));
    assert!(ContainerAdapter.resolve(&bare).is_err());

    let mut spec = EnvironmentSpec::new("container");
    spec.name = Some("api-dev".to_string());
    let handle = ContainerAdapter
        .resolve(&package(root).with_environment(spec))
        .unwrap();
    assert_eq!(handle.id, "api-dev");
    assert_eq!(handle.wrapper[0], "docker");
    assert_eq!(handle.wrapper.last().map(String::as_str), Some("api-dev"));
}

#[test]
fn test_system_is_never_detected() {
    let temp_dir = TempDir::new().unwrap();
    assert!(!SystemAdapter.detect(temp_dir.path()));
    let handle = SystemAdapter.resolve(&package(temp_dir.path())).unwrap();
    assert!(handle.path_prefix.is_empty());
    assert!(handle.wrapper.is_empty());
}

#[test]
fn test_default_registry_detection_order() {
    let registry = default_registry();
    assert_eq!(
        registry.registered_kinds(),
        vec!["venv", "poetry", "node", "container", "system"]
    );

    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::create_dir_all(root.join(".venv/bin")).unwrap();
    fs::write(root.join("package.json"), r#"{"name": "mixed"}"#).unwrap();

    let resolver = EnvironmentResolver::new(registry);
    let handle = resolver.resolve(&package(root)).unwrap();
    assert_eq!(handle.kind, "venv");
}

#[test]
fn test_default_registry_declared_system() {
    let temp_dir = TempDir::new().unwrap();
    let resolver = EnvironmentResolver::new(default_registry());
    let handle = resolver
        .resolve(&package(temp_dir.path()).with_environment(EnvironmentSpec::new("system")))
        .unwrap();
    assert_eq!(handle.kind, "system");
}
