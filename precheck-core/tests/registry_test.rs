use std::fs;
use std::path::{Path, PathBuf};

use precheck_core::error::Error;
use precheck_core::manifest::WorkspaceConfig;
use precheck_core::registry::{discover, PackageRegistry};
use tempfile::TempDir;

fn create_test_package(dir: &Path, rel: &str, checks: &[(&str, &str)]) -> PathBuf {
    let pkg_dir = dir.join(rel);
    fs::create_dir_all(&pkg_dir).unwrap();

    let checks_str: String = checks
        .iter()
        .map(|(name, command)| {
            format!(
                "\n[[check]]\nname = \"{}\"\ncommand = \"{}\"\n",
                name, command
            )
        })
        .collect();

    fs::write(pkg_dir.join("precheck.toml"), checks_str).unwrap();
    pkg_dir
}

fn canonical_root(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().canonicalize().unwrap()
}

#[test]
fn test_discover_packages_sorted_by_root() {
    let temp_dir = TempDir::new().unwrap();
    let root = canonical_root(&temp_dir);

    create_test_package(&root, "web", &[("lint", "eslint")]);
    create_test_package(&root, "api", &[("lint", "ruff check")]);
    create_test_package(&root, "libs/shared", &[]);

    let packages = discover(&root).unwrap();

    assert_eq!(packages.len(), 3);
    assert_eq!(packages[0].name, "api");
    assert_eq!(packages[0].root, root.join("api"));
    assert_eq!(packages[1].name, "shared");
    assert!(packages[1].checks.is_empty());
    assert_eq!(packages[2].name, "web");
    assert_eq!(packages[2].checks[0].command, "eslint");
}

#[test]
fn test_discover_is_deterministic() {
    let temp_dir = TempDir::new().unwrap();
    let root = canonical_root(&temp_dir);

    for name in ["c", "a", "b", "d/e"] {
        create_test_package(&root, name, &[("lint", "true")]);
    }

    let first = discover(&root).unwrap();
    let second = discover(&root).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_discover_respects_depth_bound() {
    let temp_dir = TempDir::new().unwrap();
    let root = canonical_root(&temp_dir);

    create_test_package(&root, "a", &[]);
    create_test_package(&root, "a/b/c/d/deep", &[]);

    let shallow = PackageRegistry::new(&root).with_max_depth(1).discover().unwrap();
    assert_eq!(shallow.len(), 1);

    let deep = PackageRegistry::new(&root).with_max_depth(5).discover().unwrap();
    assert_eq!(deep.len(), 2);
}

#[test]
fn test_discover_skips_excluded_directories() {
    let temp_dir = TempDir::new().unwrap();
    let root = canonical_root(&temp_dir);

    create_test_package(&root, "api", &[]);
    create_test_package(&root, "node_modules/dep", &[]);
    create_test_package(&root, "vendor/thing", &[]);

    let packages = discover(&root).unwrap();
    assert_eq!(packages.len(), 2);

    let config = WorkspaceConfig {
        exclude: vec!["vendor".to_string()],
        ..WorkspaceConfig::default()
    };
    let packages = PackageRegistry::new(&root)
        .with_workspace_config(&config)
        .discover()
        .unwrap();
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0].name, "api");
}

#[test]
fn test_workspace_only_root_file_is_not_a_package() {
    let temp_dir = TempDir::new().unwrap();
    let root = canonical_root(&temp_dir);

    fs::write(root.join("precheck.toml"), "[workspace]\nmax_depth = 2\n").unwrap();
    create_test_package(&root, "api", &[("lint", "true")]);

    let packages = discover(&root).unwrap();
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0].name, "api");
}

#[test]
fn test_nested_packages_are_both_discovered() {
    let temp_dir = TempDir::new().unwrap();
    let root = canonical_root(&temp_dir);

    create_test_package(&root, "app", &[]);
    create_test_package(&root, "app/plugins/auth", &[]);

    let packages = discover(&root).unwrap();
    let names: Vec<&str> = packages.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["app", "auth"]);
}

#[test]
fn test_missing_root_is_a_discovery_error() {
    let temp_dir = TempDir::new().unwrap();
    let err = discover(temp_dir.path().join("missing")).unwrap_err();
    assert!(matches!(err, Error::Discovery { .. }));
    assert!(err.is_fatal());
}

#[test]
fn test_file_root_is_a_discovery_error() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("file.txt");
    fs::write(&file, "x").unwrap();

    assert!(matches!(
        discover(&file).unwrap_err(),
        Error::Discovery { .. }
    ));
}

#[test]
fn test_malformed_manifest_fails_discovery() {
    let temp_dir = TempDir::new().unwrap();
    let root = canonical_root(&temp_dir);

    let pkg = root.join("broken");
    fs::create_dir_all(&pkg).unwrap();
    fs::write(pkg.join("precheck.toml"), "[[check]\nname=").unwrap();

    let err = discover(&root).unwrap_err();
    assert!(err.to_string().contains("broken"));
}

#[test]
fn test_empty_root_has_no_packages() {
    let temp_dir = TempDir::new().unwrap();
    assert!(discover(temp_dir.path()).unwrap().is_empty());
}
