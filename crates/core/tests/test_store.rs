//! Tests for the SQLite store: repository identity, batch inserts, edge
//! endpoint checks, deduplication keys, and transactional cleanup.

use compass_core::parser::{DependencyKind, ImportKind, Symbol, SymbolKind};
use compass_core::store::{
    AnalysisStore, NewFile, NewFileEdge, NewSymbolEdge, SqliteStore,
};
use std::path::{Path, PathBuf};

fn store() -> SqliteStore {
    SqliteStore::open_in_memory().unwrap()
}

fn new_file(path: &str) -> NewFile {
    NewFile {
        path: PathBuf::from(path),
        language: "typescript".to_string(),
        size: 10,
        last_modified: 1000,
        content_hash: Some("abc".to_string()),
        is_test: false,
        is_generated: false,
    }
}

fn symbol(name: &str, qualified: Option<&str>) -> Symbol {
    let mut s = Symbol::new(name, SymbolKind::Function, 1);
    s.end_line = 3;
    s.is_exported = true;
    s.qualified_name = qualified.map(|q| q.to_string());
    s
}

fn edge(from: i64, to: i64, line: usize) -> NewSymbolEdge {
    NewSymbolEdge {
        from_symbol_id: from,
        to_symbol_id: Some(to),
        to_qualified_name: None,
        kind: DependencyKind::Calls,
        line,
        parameter_context: None,
        parameter_types: None,
    }
}

// ── Repository identity ────────────────────────────────────────────────────

#[test]
fn test_ensure_repository_never_duplicates() {
    let store = store();
    let a = store.ensure_repository(Path::new("/repo"), "repo").unwrap();
    let b = store.ensure_repository(Path::new("/repo"), "repo").unwrap();
    assert_eq!(a.id, b.id);

    let other = store.ensure_repository(Path::new("/other"), "other").unwrap();
    assert_ne!(a.id, other.id);
}

// ── Inserts ────────────────────────────────────────────────────────────────

#[test]
fn test_insert_symbols_preserves_order_and_assigns_ids() {
    let store = store();
    let repo = store.ensure_repository(Path::new("/repo"), "repo").unwrap();
    let files = store.insert_files(repo.id, &[new_file("/repo/a.ts")]).unwrap();

    let symbols = store
        .insert_symbols(
            files[0].id,
            &[symbol("alpha", None), symbol("beta", Some("Mod::beta"))],
        )
        .unwrap();

    assert_eq!(symbols.len(), 2);
    assert_eq!(symbols[0].name, "alpha");
    assert_eq!(symbols[1].name, "beta");
    assert!(symbols[0].id < symbols[1].id);
    assert_eq!(symbols[1].qualified_name.as_deref(), Some("Mod::beta"));
}

#[test]
fn test_insert_files_rejects_invalid_repo_id() {
    let store = store();
    assert!(store.insert_files(-1, &[new_file("/repo/a.ts")]).is_err());
}

#[test]
fn test_edge_with_missing_endpoint_is_dropped() {
    let store = store();
    let repo = store.ensure_repository(Path::new("/repo"), "repo").unwrap();
    let files = store.insert_files(repo.id, &[new_file("/repo/a.ts")]).unwrap();
    let symbols = store
        .insert_symbols(files[0].id, &[symbol("alpha", None)])
        .unwrap();

    let inserted = store
        .insert_symbol_edges(&[
            edge(symbols[0].id, 9999, 1),
            edge(symbols[0].id, symbols[0].id, 2),
        ])
        .unwrap();

    // The edge to a nonexistent symbol is silently dropped
    assert_eq!(inserted, 1);
}

#[test]
fn test_external_negative_id_edge_is_accepted() {
    let store = store();
    let repo = store.ensure_repository(Path::new("/repo"), "repo").unwrap();
    let files = store.insert_files(repo.id, &[new_file("/repo/a.ts")]).unwrap();
    let symbols = store
        .insert_symbols(files[0].id, &[symbol("alpha", None)])
        .unwrap();

    let inserted = store
        .insert_symbol_edges(&[edge(symbols[0].id, -42, 1)])
        .unwrap();
    assert_eq!(inserted, 1);
}

#[test]
fn test_symbol_edge_dedup_key_includes_line() {
    let store = store();
    let repo = store.ensure_repository(Path::new("/repo"), "repo").unwrap();
    let files = store.insert_files(repo.id, &[new_file("/repo/a.ts")]).unwrap();
    let symbols = store
        .insert_symbols(files[0].id, &[symbol("a", None), symbol("b", None)])
        .unwrap();

    let inserted = store
        .insert_symbol_edges(&[
            edge(symbols[0].id, symbols[1].id, 5),
            edge(symbols[0].id, symbols[1].id, 5),
            edge(symbols[0].id, symbols[1].id, 9),
        ])
        .unwrap();

    // Same (from, to, kind, line) collapses; a new line survives
    assert_eq!(inserted, 2);
}

#[test]
fn test_file_edge_dedup_ignores_line() {
    let store = store();
    let repo = store.ensure_repository(Path::new("/repo"), "repo").unwrap();
    let files = store
        .insert_files(repo.id, &[new_file("/repo/a.ts"), new_file("/repo/b.ts")])
        .unwrap();

    let inserted = store
        .insert_file_edges(&[
            NewFileEdge {
                from_file_id: files[0].id,
                to_file_id: files[1].id,
                kind: ImportKind::Named,
                line: 1,
            },
            NewFileEdge {
                from_file_id: files[0].id,
                to_file_id: files[1].id,
                kind: ImportKind::Named,
                line: 7,
            },
        ])
        .unwrap();

    assert_eq!(inserted, 1);
}

// ── Cleanup ────────────────────────────────────────────────────────────────

#[test]
fn test_cleanup_removes_all_rows_keyed_to_file() {
    let store = store();
    let repo = store.ensure_repository(Path::new("/repo"), "repo").unwrap();
    let files = store
        .insert_files(repo.id, &[new_file("/repo/a.ts"), new_file("/repo/b.ts")])
        .unwrap();
    let a_symbols = store
        .insert_symbols(files[0].id, &[symbol("alpha", None)])
        .unwrap();
    let b_symbols = store
        .insert_symbols(files[1].id, &[symbol("beta", None)])
        .unwrap();

    store
        .insert_symbol_edges(&[edge(a_symbols[0].id, b_symbols[0].id, 1)])
        .unwrap();
    store
        .insert_file_edges(&[NewFileEdge {
            from_file_id: files[0].id,
            to_file_id: files[1].id,
            kind: ImportKind::Named,
            line: 1,
        }])
        .unwrap();

    store.cleanup_file_data(&[files[0].id]).unwrap();

    assert_eq!(store.file_id_for_path(repo.id, Path::new("/repo/a.ts")).unwrap(), None);
    assert!(store.symbols_by_name(repo.id, "alpha").unwrap().is_empty());
    // Edges originating in the removed file are gone, as are file edges
    assert!(store.symbol_edges_for_repository(repo.id).unwrap().is_empty());
    assert!(store.file_edges_for_repository(repo.id).unwrap().is_empty());
    // The untouched file survives
    assert!(store
        .file_id_for_path(repo.id, Path::new("/repo/b.ts"))
        .unwrap()
        .is_some());
}

#[test]
fn test_cleanup_requeues_inbound_edges_with_qualified_name() {
    let store = store();
    let repo = store.ensure_repository(Path::new("/repo"), "repo").unwrap();
    let files = store
        .insert_files(
            repo.id,
            &[new_file("/repo/callee.php"), new_file("/repo/caller.php")],
        )
        .unwrap();
    let callee = store
        .insert_symbols(files[0].id, &[symbol("baz", Some("App\\Bar::baz"))])
        .unwrap();
    let caller = store
        .insert_symbols(files[1].id, &[symbol("run", Some("App\\Foo::run"))])
        .unwrap();

    store
        .insert_symbol_edges(&[NewSymbolEdge {
            from_symbol_id: caller[0].id,
            to_symbol_id: Some(callee[0].id),
            to_qualified_name: Some("App\\Bar::baz".to_string()),
            kind: DependencyKind::Calls,
            line: 3,
            parameter_context: None,
            parameter_types: None,
        }])
        .unwrap();

    // Removing the callee's file re-queues the caller's edge: target symbol
    // cleared, qualified name retained
    store.cleanup_file_data(&[files[0].id]).unwrap();

    let unresolved = store.unresolved_dependencies(repo.id).unwrap();
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0].to_symbol_id, None);
    assert_eq!(
        unresolved[0].to_qualified_name.as_deref(),
        Some("App\\Bar::baz")
    );

    // Re-inserting a symbol with that qualified name allows re-binding
    let files2 = store.insert_files(repo.id, &[new_file("/repo/callee.php")]).unwrap();
    let callee2 = store
        .insert_symbols(files2[0].id, &[symbol("baz", Some("App\\Bar::baz"))])
        .unwrap();
    store
        .bind_dependency(unresolved[0].id, callee2[0].id)
        .unwrap();
    assert!(store.unresolved_dependencies(repo.id).unwrap().is_empty());
}

#[test]
fn test_cleanup_repository_clears_everything() {
    let store = store();
    let repo = store.ensure_repository(Path::new("/repo"), "repo").unwrap();
    let files = store
        .insert_files(repo.id, &[new_file("/repo/a.ts"), new_file("/repo/b.ts")])
        .unwrap();
    store.insert_symbols(files[0].id, &[symbol("x", None)]).unwrap();

    store.cleanup_repository(repo.id).unwrap();

    let counts = store.graph_counts(repo.id).unwrap();
    assert_eq!(counts.file_nodes, 0);
    assert_eq!(counts.symbol_nodes, 0);
    assert_eq!(counts.symbol_edges, 0);
}
