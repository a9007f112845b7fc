use crate::conf::ConfigError;
use crate::conf::discover::{discover, resolve_glob};

use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[test]
fn discover_returns_manifests_in_sorted_order() {
    // Arrange
    let dir = tempdir().unwrap();
    let root = dir.path();
    fs::create_dir(root.join("resources")).unwrap();

    fs::write(root.join("resources/policies.yaml"), "").unwrap();
    fs::write(root.join("resources/cafe.yaml"), "").unwrap();
    fs::write(root.join("resources/README.md"), "").unwrap();

    // Act
    let result = discover(root, "resources/*.yaml").unwrap();

    // Assert
    assert_eq!(
        result,
        vec![
            root.join("resources/cafe.yaml"),
            root.join("resources/policies.yaml"),
        ]
    );
}

#[test]
fn discover_descends_into_namespaced_directories() {
    // Arrange
    let dir = tempdir().unwrap();
    let root = dir.path();

    fs::create_dir_all(root.join("manifests/tea/v2")).unwrap();
    fs::write(root.join("manifests/cafe.yaml"), "").unwrap();
    fs::write(root.join("manifests/tea/routes.yaml"), "").unwrap();
    fs::write(root.join("manifests/tea/v2/routes.yaml"), "").unwrap();

    // Act
    let result = discover(root, "manifests/**/*.yaml").unwrap();

    // Assert
    assert_eq!(
        result,
        vec![
            root.join("manifests/cafe.yaml"),
            root.join("manifests/tea/routes.yaml"),
            root.join("manifests/tea/v2/routes.yaml"),
        ]
    );
}

#[test]
fn discover_tolerates_missing_include_directories() {
    // Arrange
    let dir = tempdir().unwrap();

    // Act
    let result = discover(dir.path(), "waf/*.yaml").unwrap();

    // Assert
    assert!(result.is_empty());
}

#[test]
fn discover_skips_directories_that_match() {
    // Arrange
    let dir = tempdir().unwrap();
    let root = dir.path();

    fs::create_dir(root.join("secrets.yaml")).unwrap();

    // Act
    let result = discover(root, "*.yaml").unwrap();

    // Assert
    assert!(result.is_empty());
}

#[test]
fn discover_rejects_malformed_patterns() {
    // Arrange
    let dir = tempdir().unwrap();

    // Act
    let err = discover(dir.path(), "resources/[").unwrap_err();

    // Assert
    match err {
        ConfigError::Glob { pattern, .. } => assert!(pattern.ends_with("resources/[")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn resolve_glob_joins_root_and_pattern() {
    // Arrange
    let root = Path::new("/etc/vsgen/bundle");

    // Act
    let resolved = resolve_glob(root, "endpoints/*.yaml");

    // Assert
    assert_eq!(resolved, "/etc/vsgen/bundle/endpoints/*.yaml");
}
