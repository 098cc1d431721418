//! Row types owned by the persistent store
//!
//! Ids are stable integers assigned by the store. Synthetic external-library
//! symbols use reserved negative ids; a negative `to_symbol_id` on an edge
//! row marks its target as living in an external library, and such ids are
//! never rows in (or joined against) the symbols table.

use crate::framework::FrameworkEntityKind;
use crate::parser::{DependencyKind, ImportKind, SymbolKind, Visibility};
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// A repository registered in the store.
#[derive(Debug, Clone)]
pub struct Repository {
    pub id: i64,
    pub name: String,
    pub root_path: PathBuf,
    pub primary_language: Option<String>,
    pub frameworks: Vec<String>,
    pub last_indexed: Option<DateTime<Utc>>,
    pub vcs_hash: Option<String>,
}

/// A file row before insertion.
#[derive(Debug, Clone)]
pub struct NewFile {
    /// Absolute path
    pub path: PathBuf,
    pub language: String,
    pub size: i64,
    /// Unix seconds
    pub last_modified: i64,
    pub content_hash: Option<String>,
    pub is_test: bool,
    pub is_generated: bool,
}

/// A persisted file.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub id: i64,
    pub repository_id: i64,
    pub path: PathBuf,
    pub language: String,
    pub size: i64,
    pub last_modified: i64,
    pub content_hash: Option<String>,
    pub is_test: bool,
    pub is_generated: bool,
}

/// A persisted symbol.
#[derive(Debug, Clone)]
pub struct SymbolRecord {
    pub id: i64,
    pub file_id: i64,
    pub name: String,
    pub kind: SymbolKind,
    pub start_line: usize,
    pub end_line: usize,
    pub is_exported: bool,
    pub visibility: Visibility,
    pub signature: Option<String>,
    pub qualified_name: Option<String>,
}

/// A symbol-graph edge before insertion. `to_symbol_id` is `None` for
/// unresolved-but-retained references; `to_qualified_name` survives cleanup
/// so those can re-bind on a later pass.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSymbolEdge {
    pub from_symbol_id: i64,
    pub to_symbol_id: Option<i64>,
    pub to_qualified_name: Option<String>,
    pub kind: DependencyKind,
    pub line: usize,
    pub parameter_context: Option<String>,
    pub parameter_types: Option<String>,
}

/// A persisted symbol-graph edge.
#[derive(Debug, Clone)]
pub struct SymbolEdgeRecord {
    pub id: i64,
    pub from_symbol_id: i64,
    pub to_symbol_id: Option<i64>,
    pub to_qualified_name: Option<String>,
    pub kind: DependencyKind,
    pub line: usize,
    pub parameter_context: Option<String>,
    pub parameter_types: Option<String>,
}

/// A file-graph edge before insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFileEdge {
    pub from_file_id: i64,
    pub to_file_id: i64,
    pub kind: ImportKind,
    pub line: usize,
}

/// A persisted file-graph edge.
#[derive(Debug, Clone)]
pub struct FileEdgeRecord {
    pub id: i64,
    pub from_file_id: i64,
    pub to_file_id: i64,
    pub kind: ImportKind,
    pub line: usize,
}

/// A framework entity row before insertion.
#[derive(Debug, Clone)]
pub struct NewFrameworkEntity {
    pub file_id: Option<i64>,
    pub symbol_id: Option<i64>,
    pub kind: FrameworkEntityKind,
    pub name: String,
    pub metadata: serde_json::Value,
}

/// A persisted framework entity.
#[derive(Debug, Clone)]
pub struct FrameworkEntityRecord {
    pub id: i64,
    pub repository_id: i64,
    pub file_id: Option<i64>,
    pub symbol_id: Option<i64>,
    pub kind: FrameworkEntityKind,
    pub name: String,
    pub metadata: serde_json::Value,
}

/// Node/edge counts reported in the pass summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphCounts {
    pub file_nodes: usize,
    pub file_edges: usize,
    pub symbol_nodes: usize,
    pub symbol_edges: usize,
}
