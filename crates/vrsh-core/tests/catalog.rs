// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Validate catalog loading and optional command group includes.
// Author: Lukas Bower

use std::fs;
use std::path::Path;

use vrsh_core::{Catalog, CatalogError, CompletionNode, RegistryBuilder, StrategyKind};

const CATALOG: &str = r#"
[root]
operations = [
    { name = "quit", params = ["self"] },
    { name = "load", params = ["self", "file"] },
    { name = "send", params = ["self", "command"] },
]

[groups.reload]
include = "reload.toml"

[groups.get]
include = "get.toml"
"#;

#[test]
fn missing_include_omits_only_that_group() {
    let dir = tempfile::tempdir().expect("tempdir");
    let catalog_path = dir.path().join("catalog.toml");
    fs::write(&catalog_path, CATALOG).unwrap();
    fs::write(
        dir.path().join("get.toml"),
        "operations = [{ name = \"status\", params = [\"self\"] }]\n",
    )
    .unwrap();

    let catalog = Catalog::load(&catalog_path).expect("load catalog");
    let tree = catalog.build_tree(&RegistryBuilder::default());
    assert_eq!(
        tree.root().keys().collect::<Vec<_>>(),
        vec!["get", "load", "quit"]
    );
    assert_eq!(
        tree.lookup(&["get", "status"]),
        Some(&CompletionNode::Terminal)
    );
    assert!(matches!(
        tree.lookup(&["load"]),
        Some(CompletionNode::Strategy {
            kind: StrategyKind::FilesystemPath,
            ..
        })
    ));
}

#[test]
fn malformed_include_omits_the_group() {
    let dir = tempfile::tempdir().expect("tempdir");
    let catalog_path = dir.path().join("catalog.toml");
    fs::write(&catalog_path, CATALOG).unwrap();
    fs::write(dir.path().join("get.toml"), "operations = 42\n").unwrap();
    fs::write(
        dir.path().join("reload.toml"),
        "operations = [{ name = \"screens\" }]\n",
    )
    .unwrap();

    let tree = Catalog::load(&catalog_path)
        .expect("load catalog")
        .build_tree(&RegistryBuilder::default());
    assert_eq!(
        tree.root().keys().collect::<Vec<_>>(),
        vec!["load", "quit", "reload"]
    );
}

#[test]
fn missing_catalog_reports_its_path() {
    let err = Catalog::load(Path::new("/nonexistent/vrsh/catalog.toml")).unwrap_err();
    assert!(matches!(err, CatalogError::Io { .. }));
    assert!(err.to_string().contains("/nonexistent/vrsh/catalog.toml"));
}

#[test]
fn shipped_catalog_parses() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../configs/catalog.toml");
    let catalog = Catalog::load(&path).expect("load shipped catalog");
    let tree = catalog.build_tree(&RegistryBuilder::default());
    assert!(tree.root().get("quit").is_some());
    assert!(tree.root().get("setScreen").is_some());
}
