//! File-graph assembly tests: specifier resolution, external skipping, and
//! deduplication, asserted over persisted rows.

use compass_core::config::AnalysisConfig;
use compass_core::pipeline::AnalysisPipeline;
use compass_core::store::{AnalysisStore, SqliteStore};
use std::path::PathBuf;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

fn analyze(dir: &TempDir, store: &SqliteStore) -> i64 {
    let pipeline = AnalysisPipeline::new(store, AnalysisConfig::default());
    pipeline.run(dir.path()).unwrap();
    let root = dir.path().canonicalize().unwrap();
    store.ensure_repository(&root, "test").unwrap().id
}

fn edge_paths(store: &SqliteStore, repo: i64) -> Vec<(String, String)> {
    let files = store.files_for_repository(repo).unwrap();
    let name = |id: i64| -> String {
        files
            .iter()
            .find(|f| f.id == id)
            .map(|f| {
                f.path
                    .file_name()
                    .unwrap()
                    .to_string_lossy()
                    .to_string()
            })
            .unwrap_or_else(|| format!("<{id}>"))
    };

    store
        .file_edges_for_repository(repo)
        .unwrap()
        .iter()
        .map(|e| (name(e.from_file_id), name(e.to_file_id)))
        .collect()
}

#[test]
fn test_relative_import_produces_edge() {
    let dir = TempDir::new().unwrap();
    write(&dir, "src/util.ts", "export function helper() {}\n");
    write(
        &dir,
        "src/app.ts",
        "import { helper } from './util';\nfunction run() { helper(); }\n",
    );

    let store = SqliteStore::open_in_memory().unwrap();
    let repo = analyze(&dir, &store);

    let edges = edge_paths(&store, repo);
    assert!(edges.contains(&("app.ts".to_string(), "util.ts".to_string())));
}

#[test]
fn test_external_imports_produce_no_edges() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "src/app.ts",
        "import { ref } from 'vue';\nimport fs from 'fs';\nexport function run() {}\n",
    );

    let store = SqliteStore::open_in_memory().unwrap();
    let repo = analyze(&dir, &store);

    assert!(edge_paths(&store, repo).is_empty());
}

#[test]
fn test_unresolvable_specifier_produces_no_edge() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "src/app.ts",
        "import { gone } from './missing';\nexport function run() {}\n",
    );

    let store = SqliteStore::open_in_memory().unwrap();
    let repo = analyze(&dir, &store);

    assert!(edge_paths(&store, repo).is_empty());
}

#[test]
fn test_multiple_imports_same_target_deduplicate() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "src/util.ts",
        "export function a() {}\nexport function b() {}\n",
    );
    write(
        &dir,
        "src/app.ts",
        "import { a } from './util';\nimport { b } from './util';\nexport function run() { a(); b(); }\n",
    );

    let store = SqliteStore::open_in_memory().unwrap();
    let repo = analyze(&dir, &store);

    let edges = edge_paths(&store, repo);
    assert_eq!(edges.len(), 1, "same (from, to, kind) must collapse");
}

#[test]
fn test_php_use_resolves_through_autoloader() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "composer.json",
        r#"{"autoload": {"psr-4": {"App\\": "app/"}}}"#,
    );
    write(
        &dir,
        "app/Models/User.php",
        "<?php\nnamespace App\\Models;\nclass User {}\n",
    );
    write(
        &dir,
        "app/Http/UserController.php",
        "<?php\nnamespace App\\Http;\nuse App\\Models\\User;\nclass UserController {\n    public function show() {\n        return new User();\n    }\n}\n",
    );

    let store = SqliteStore::open_in_memory().unwrap();
    let repo = analyze(&dir, &store);

    let edges = edge_paths(&store, repo);
    assert!(
        edges.contains(&("UserController.php".to_string(), "User.php".to_string())),
        "expected use-statement edge, got {edges:?}"
    );
}

#[test]
fn test_vue_alias_import_produces_edge() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "src/stores/areasStore.ts",
        "export const useAreasStore = () => ({});\n",
    );
    write(
        &dir,
        "src/components/AreaList.vue",
        "<script setup lang=\"ts\">\nimport { useAreasStore } from '@/stores/areasStore';\n</script>\n<template><div/></template>\n",
    );

    let store = SqliteStore::open_in_memory().unwrap();
    let repo = analyze(&dir, &store);

    let edges = edge_paths(&store, repo);
    assert!(
        edges.contains(&("AreaList.vue".to_string(), "areasStore.ts".to_string())),
        "expected @/ alias edge, got {edges:?}"
    );
}
