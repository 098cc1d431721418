//! End-to-end pipeline tests: summary accounting, determinism and
//! idempotence laws, and framework entity persistence.

use compass_core::config::AnalysisConfig;
use compass_core::pipeline::{AnalysisPipeline, AnalysisSummary, PassStatus};
use compass_core::store::{AnalysisStore, SqliteStore};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

fn analyze(dir: &TempDir, store: &SqliteStore) -> AnalysisSummary {
    let pipeline = AnalysisPipeline::new(store, AnalysisConfig::default());
    pipeline.run(dir.path()).unwrap()
}

fn repo_id(dir: &TempDir, store: &SqliteStore) -> i64 {
    let root = dir.path().canonicalize().unwrap();
    store.ensure_repository(&root, "test").unwrap().id
}

/// Comparable snapshot of the persisted graph rows.
fn graph_snapshot(store: &SqliteStore, repo_id: i64) -> (Vec<String>, Vec<String>, Vec<String>) {
    let mut files: Vec<String> = store
        .files_for_repository(repo_id)
        .unwrap()
        .iter()
        .map(|f| f.path.to_string_lossy().to_string())
        .collect();
    files.sort();

    let mut symbols = Vec::new();
    for file in store.files_for_repository(repo_id).unwrap() {
        for s in store.symbols_for_file(file.id).unwrap() {
            symbols.push(format!(
                "{}:{}:{}:{}",
                file.path.display(),
                s.name,
                s.kind.as_str(),
                s.start_line
            ));
        }
    }
    symbols.sort();

    let mut edges: Vec<String> = store
        .symbol_edges_for_repository(repo_id)
        .unwrap()
        .iter()
        .map(|e| {
            format!(
                "{}->{:?}:{}:{}",
                e.from_symbol_id,
                e.to_symbol_id,
                e.kind.as_str(),
                e.line
            )
        })
        .collect();
    edges.sort();

    (files, symbols, edges)
}

// ── Summary accounting ─────────────────────────────────────────────────────

#[test]
fn test_summary_counts() {
    let dir = TempDir::new().unwrap();
    write(&dir, "src/util.ts", "export function helper() {}\n");
    write(
        &dir,
        "src/app.ts",
        "import { helper } from './util';\n\nfunction run() { helper(); }\n",
    );

    let store = SqliteStore::open_in_memory().unwrap();
    let summary = analyze(&dir, &store);

    assert_eq!(summary.status, PassStatus::Completed);
    assert_eq!(summary.files_discovered, 2);
    assert_eq!(summary.files_processed, 2);
    assert!(summary.symbols_extracted >= 2);
    assert!(summary.symbol_edges_created >= 1);
    assert!(summary.file_edges_created >= 1);
    assert_eq!(summary.graph_counts.file_nodes, 2);
    assert!(summary.duration.as_nanos() > 0);
}

#[test]
fn test_encoding_fallback_reports_error_and_continues() {
    let dir = TempDir::new().unwrap();
    write(&dir, "src/ok.ts", "export function fine() {}\n");
    // Invalid UTF-8 forces the encoding fallback and an error entry
    let bad = dir.path().join("src/bad.ts");
    std::fs::write(&bad, [0x66u8, 0x6e, 0xff, 0xfe, 0x20]).unwrap();

    let store = SqliteStore::open_in_memory().unwrap();
    let summary = analyze(&dir, &store);

    assert!(summary
        .errors
        .iter()
        .any(|e| e.path.ends_with("bad.ts")));
    // The healthy file is unaffected
    let repo = repo_id(&dir, &store);
    assert!(!store.symbols_by_name(repo, "fine").unwrap().is_empty());
}

// ── Determinism and idempotence ────────────────────────────────────────────

#[test]
fn test_reanalysis_of_unchanged_repo_is_identical() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "app/Services/Foo.php",
        "<?php\nnamespace App\\Services;\nclass Foo {\n    public function run() {\n        Bar::baz();\n    }\n}\n",
    );
    write(
        &dir,
        "app/Services/Bar.php",
        "<?php\nnamespace App\\Services;\nclass Bar {\n    public static function baz() {}\n}\n",
    );

    let db = dir.path().join(".compass-test.db");
    let store = SqliteStore::open(&db).unwrap();

    let first = analyze(&dir, &store);
    assert_eq!(first.status, PassStatus::Completed);
    let repo = repo_id(&dir, &store);
    let snapshot_one = graph_snapshot(&store, repo);

    let second = analyze(&dir, &store);
    assert_eq!(second.status, PassStatus::Completed);
    let snapshot_two = graph_snapshot(&store, repo);

    assert_eq!(snapshot_one, snapshot_two);
}

#[test]
fn test_two_fresh_runs_produce_equal_edge_shapes() {
    let build = |dir: &TempDir| {
        write(
            dir,
            "src/util.ts",
            "export const helper = {\n  format(v: string) { return v; },\n};\n",
        );
        write(
            dir,
            "src/app.ts",
            "import { helper } from './util';\nfunction run() { helper.format('x'); }\n",
        );
    };

    let dir_a = TempDir::new().unwrap();
    build(&dir_a);
    let store_a = SqliteStore::open_in_memory().unwrap();
    analyze(&dir_a, &store_a);
    let repo_a = repo_id(&dir_a, &store_a);

    let dir_b = TempDir::new().unwrap();
    build(&dir_b);
    let store_b = SqliteStore::open_in_memory().unwrap();
    analyze(&dir_b, &store_b);
    let repo_b = repo_id(&dir_b, &store_b);

    let (_, symbols_a, edges_a) = graph_snapshot(&store_a, repo_a);
    let (_, symbols_b, edges_b) = graph_snapshot(&store_b, repo_b);
    // Paths differ between temp dirs; shapes must not
    assert_eq!(symbols_a.len(), symbols_b.len());
    assert_eq!(edges_a.len(), edges_b.len());
}

// ── Cancellation ───────────────────────────────────────────────────────────

#[test]
fn test_pre_cancelled_pass_reports_aborted() {
    let dir = TempDir::new().unwrap();
    write(&dir, "src/app.ts", "export function run() {}\n");

    let store = SqliteStore::open_in_memory().unwrap();
    let pipeline = AnalysisPipeline::new(&store, AnalysisConfig::default());
    let cancel = Arc::new(AtomicBool::new(true));
    let summary = pipeline.run_with_cancel(dir.path(), cancel).unwrap();

    assert_eq!(summary.status, PassStatus::Aborted);
}

// ── Framework entities ─────────────────────────────────────────────────────

#[test]
fn test_laravel_entities_tagged() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "composer.json",
        r#"{"require": {"laravel/framework": "^10.0"}, "autoload": {"psr-4": {"App\\": "app/"}}}"#,
    );
    write(
        &dir,
        "app/Http/Controllers/AreaController.php",
        "<?php\nnamespace App\\Http\\Controllers;\nclass AreaController {\n    public function index() {}\n}\n",
    );
    write(
        &dir,
        "app/Models/Area.php",
        "<?php\nnamespace App\\Models;\nclass Area extends Model {}\n",
    );

    let store = SqliteStore::open_in_memory().unwrap();
    analyze(&dir, &store);
    let repo = repo_id(&dir, &store);

    let entities = store.framework_entities_for_repository(repo).unwrap();
    let kinds: Vec<(&str, &str)> = entities
        .iter()
        .map(|e| (e.kind.as_str(), e.name.as_str()))
        .collect();
    assert!(kinds.contains(&("controller", "AreaController")));
    assert!(kinds.contains(&("model", "Area")));

    // Entity rows link back to their symbols
    assert!(entities.iter().all(|e| e.file_id.is_some()));
    assert!(entities
        .iter()
        .any(|e| e.kind.as_str() == "controller" && e.symbol_id.is_some()));
}

#[test]
fn test_godot_entities_persisted() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "project.godot",
        "[application]\nconfig/name=\"Game\"\n\n[autoload]\nGameState=\"*res://scripts/GameState.cs\"\n",
    );
    write(
        &dir,
        "scenes/Main.tscn",
        "[gd_scene format=3]\n\n[ext_resource type=\"Script\" path=\"res://scripts/CardManager.cs\" id=\"1\"]\n\n[node name=\"Main\" type=\"Node2D\"]\n",
    );
    write(
        &dir,
        "scripts/CardManager.cs",
        "public class CardManager {}\n",
    );

    let store = SqliteStore::open_in_memory().unwrap();
    analyze(&dir, &store);
    let repo = repo_id(&dir, &store);

    let entities = store.framework_entities_for_repository(repo).unwrap();
    let kinds: Vec<&str> = entities.iter().map(|e| e.kind.as_str()).collect();
    assert!(kinds.contains(&"scene"));
    assert!(kinds.contains(&"node"));
    assert!(kinds.contains(&"script"));
    assert!(kinds.contains(&"autoload"));
}
