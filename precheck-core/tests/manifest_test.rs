use std::fs;
use std::path::Path;

use precheck_core::error::Error;
use precheck_core::manifest::{load_workspace_config, Manifest};
use tempfile::TempDir;

#[test]
fn test_parse_package_manifest() {
    let manifest = Manifest::parse(
        r#"
name = "api"

[environment]
kind = "venv"
path = ".venv"

[[check]]
name = "lint"
command = "ruff check"
include = '\.py$'

[[check]]
name = "types"
command = "mypy ."
pass_filenames = false
"#,
        Path::new("precheck.toml"),
    )
    .unwrap();

    assert!(manifest.is_package());
    assert_eq!(manifest.name.as_deref(), Some("api"));
    let environment = manifest.environment.as_ref().unwrap();
    assert_eq!(environment.kind, "venv");
    assert_eq!(environment.path.as_deref(), Some(".venv"));
    assert_eq!(manifest.checks.len(), 2);
    assert!(manifest.checks[0].pass_filenames);
    assert_eq!(manifest.checks[0].include.as_deref(), Some(r"\.py$"));
    assert!(!manifest.checks[1].pass_filenames);
}

#[test]
fn test_workspace_only_file_is_not_a_package() {
    let manifest = Manifest::parse(
        r#"
[workspace]
max_depth = 5
concurrency = 2
fail_fast = true
timeout_secs = 60
exclude = ["vendor"]
always_check = ["shared"]
"#,
        Path::new("precheck.toml"),
    )
    .unwrap();

    assert!(!manifest.is_package());
    let workspace = manifest.workspace.unwrap();
    assert_eq!(workspace.max_depth, Some(5));
    assert_eq!(workspace.concurrency, Some(2));
    assert_eq!(workspace.fail_fast, Some(true));
    assert_eq!(workspace.timeout_secs, Some(60));
    assert_eq!(workspace.exclude, vec!["vendor".to_string()]);
    assert_eq!(workspace.always_check, vec!["shared".to_string()]);
}

#[test]
fn test_workspace_file_with_checks_is_a_package() {
    let manifest = Manifest::parse(
        r#"
[workspace]
concurrency = 1

[[check]]
name = "lint"
command = "echo"
"#,
        Path::new("precheck.toml"),
    )
    .unwrap();

    assert!(manifest.is_package());
}

#[test]
fn test_name_defaults_to_directory() {
    let manifest = Manifest::parse(
        r#"
[[check]]
name = "lint"
command = "eslint"
"#,
        Path::new("precheck.toml"),
    )
    .unwrap();

    let package = manifest
        .into_package(Path::new("/repo/web"), Path::new("/repo/web/precheck.toml"))
        .unwrap();
    assert_eq!(package.name, "web");
    assert_eq!(package.root, Path::new("/repo/web"));
}

#[test]
fn test_duplicate_check_names_rejected() {
    let manifest = Manifest::parse(
        r#"
[[check]]
name = "lint"
command = "a"

[[check]]
name = "lint"
command = "b"
"#,
        Path::new("precheck.toml"),
    )
    .unwrap();

    let err = manifest
        .into_package(Path::new("/repo/web"), Path::new("/repo/web/precheck.toml"))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidCheck { .. }));
}

#[test]
fn test_empty_command_rejected() {
    let manifest = Manifest::parse(
        r#"
[[check]]
name = "lint"
command = "  "
"#,
        Path::new("precheck.toml"),
    )
    .unwrap();

    assert!(manifest
        .into_package(Path::new("/repo/web"), Path::new("/repo/web/precheck.toml"))
        .is_err());
}

#[test]
fn test_invalid_package_name_rejected() {
    let manifest = Manifest::parse(r#"name = "../escape""#, Path::new("precheck.toml")).unwrap();

    let err = manifest
        .into_package(Path::new("/repo/web"), Path::new("/repo/web/precheck.toml"))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidPackageName(_)));
}

#[test]
fn test_malformed_toml_reports_path() {
    let err = Manifest::parse("[[check]\nname =", Path::new("/repo/web/precheck.toml")).unwrap_err();
    match err {
        Error::Toml { context, .. } => assert_eq!(context, "/repo/web/precheck.toml"),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_load_workspace_config() {
    let temp_dir = TempDir::new().unwrap();
    assert!(load_workspace_config(temp_dir.path()).unwrap().is_none());

    fs::write(
        temp_dir.path().join("precheck.toml"),
        "[workspace]\nalways_check = [\"shared\"]\n",
    )
    .unwrap();
    let config = load_workspace_config(temp_dir.path()).unwrap().unwrap();
    assert_eq!(config.always_check, vec!["shared".to_string()]);
    assert_eq!(config.max_depth, None);
}
