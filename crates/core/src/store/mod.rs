//! Persistent store abstraction
//!
//! Decouples the pipeline from the storage engine behind an object-safe
//! trait. The shipped backend is SQLite ([`SqliteStore`]); tests run it on an
//! in-memory connection. All writes happen inside per-batch transactions; a
//! failed batch leaves no partial rows.

pub mod models;
pub mod sqlite;

pub use models::{
    FileEdgeRecord, FileRecord, FrameworkEntityRecord, GraphCounts, NewFile, NewFileEdge,
    NewFrameworkEntity, NewSymbolEdge, Repository, SymbolEdgeRecord, SymbolRecord,
};
pub use sqlite::SqliteStore;

use crate::parser::Symbol;
use std::path::Path;
use thiserror::Error;

/// Error types for store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid id in batch: {0}")]
    InvalidId(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Abstract persistent store for repositories, files, symbols, and edges.
///
/// Write operations are transactional per call; read indexes back the
/// resolver's incremental re-binding and the file graph's path lookups.
pub trait AnalysisStore: Send + Sync {
    // -- Repository lifecycle --

    /// Insert the repository on absence; never duplicates (path is unique).
    fn ensure_repository(&self, root: &Path, name: &str) -> Result<Repository, StoreError>;

    /// Update detection metadata and stamp `last_indexed`.
    fn update_repository_meta(
        &self,
        repo_id: i64,
        primary_language: Option<&str>,
        frameworks: &[String],
        vcs_hash: Option<&str>,
    ) -> Result<(), StoreError>;

    // -- Batch writes --

    /// Insert file rows, preserving input order in the returned records.
    fn insert_files(&self, repo_id: i64, files: &[NewFile]) -> Result<Vec<FileRecord>, StoreError>;

    /// Insert a file's symbols in parser order, assigning ids.
    fn insert_symbols(&self, file_id: i64, symbols: &[Symbol])
        -> Result<Vec<SymbolRecord>, StoreError>;

    /// Insert symbol edges in one transaction. Edges whose endpoints are not
    /// present (and not negative external-library ids) are silently dropped
    /// and logged. Returns the number of rows actually inserted.
    fn insert_symbol_edges(&self, edges: &[NewSymbolEdge]) -> Result<usize, StoreError>;

    /// Insert file edges in one transaction; duplicates are ignored.
    fn insert_file_edges(&self, edges: &[NewFileEdge]) -> Result<usize, StoreError>;

    /// Insert framework entity rows.
    fn insert_framework_entities(
        &self,
        repo_id: i64,
        entities: &[NewFrameworkEntity],
    ) -> Result<usize, StoreError>;

    // -- Cleanup --

    /// Remove all rows keyed to the given files inside one transaction.
    ///
    /// Deletes, in order: edges originating from these files' symbols;
    /// framework entities keyed to the files or their symbols; file edges
    /// touching the files; the symbols; the files. Edges *into* removed
    /// symbols whose callers live outside the set are re-queued unresolved:
    /// `to_symbol_id` cleared, `to_qualified_name` retained.
    fn cleanup_file_data(&self, file_ids: &[i64]) -> Result<(), StoreError>;

    /// Same cleanup over every file of the repository.
    fn cleanup_repository(&self, repo_id: i64) -> Result<(), StoreError>;

    // -- Read indexes --

    fn files_for_repository(&self, repo_id: i64) -> Result<Vec<FileRecord>, StoreError>;

    fn file_id_for_path(&self, repo_id: i64, path: &Path) -> Result<Option<i64>, StoreError>;

    fn symbols_for_file(&self, file_id: i64) -> Result<Vec<SymbolRecord>, StoreError>;

    fn symbols_by_name(&self, repo_id: i64, name: &str) -> Result<Vec<SymbolRecord>, StoreError>;

    fn symbol_by_qualified_name(
        &self,
        repo_id: i64,
        qualified_name: &str,
    ) -> Result<Option<SymbolRecord>, StoreError>;

    fn exported_by_name(&self, repo_id: i64, name: &str) -> Result<Vec<SymbolRecord>, StoreError>;

    /// Edges with a retained qualified name and no target symbol.
    fn unresolved_dependencies(&self, repo_id: i64) -> Result<Vec<SymbolEdgeRecord>, StoreError>;

    /// Re-bind a previously unresolved edge to a symbol id.
    fn bind_dependency(&self, edge_id: i64, to_symbol_id: i64) -> Result<(), StoreError>;

    /// All symbol edges originating in the repository (tests, consumers).
    fn symbol_edges_for_repository(
        &self,
        repo_id: i64,
    ) -> Result<Vec<SymbolEdgeRecord>, StoreError>;

    /// All file edges of the repository.
    fn file_edges_for_repository(&self, repo_id: i64) -> Result<Vec<FileEdgeRecord>, StoreError>;

    /// Framework entities of the repository.
    fn framework_entities_for_repository(
        &self,
        repo_id: i64,
    ) -> Result<Vec<FrameworkEntityRecord>, StoreError>;

    /// Node and edge counts for the pass summary.
    fn graph_counts(&self, repo_id: i64) -> Result<GraphCounts, StoreError>;
}
