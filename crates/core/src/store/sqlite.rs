//! SQLite-backed analysis store
//!
//! Uses a bundled SQLite in WAL mode with foreign keys on. The schema is
//! created by an idempotent batch; structural migrations beyond that are
//! externally managed. Tests open the store in memory.

use super::models::*;
use super::{AnalysisStore, StoreError};
use crate::framework::FrameworkEntityKind;
use crate::parser::{DependencyKind, ImportKind, Symbol, SymbolKind, Visibility};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// SQLite store. The connection is serialized behind a mutex; writes within
/// one call run inside a single transaction.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let conn = Connection::open(path)?;
        Self::initialize(conn)
    }

    /// Open a transient in-memory database (tests, dry runs).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize(conn)
    }

    fn initialize(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA foreign_keys=ON;
        ",
        )?;
        run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Create tables and indexes. Idempotent.
fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS repositories (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            name             TEXT NOT NULL,
            root_path        TEXT NOT NULL UNIQUE,
            primary_language TEXT,
            frameworks       TEXT NOT NULL DEFAULT '[]',
            last_indexed     TEXT,
            vcs_hash         TEXT
        );

        CREATE TABLE IF NOT EXISTS files (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            repository_id   INTEGER NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
            path            TEXT NOT NULL,
            language        TEXT NOT NULL DEFAULT 'unknown',
            size_bytes      INTEGER NOT NULL DEFAULT 0,
            last_modified   INTEGER NOT NULL DEFAULT 0,
            content_hash    TEXT,
            is_test         INTEGER NOT NULL DEFAULT 0,
            is_generated    INTEGER NOT NULL DEFAULT 0,
            UNIQUE(repository_id, path)
        );

        CREATE TABLE IF NOT EXISTS symbols (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            file_id         INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
            name            TEXT NOT NULL,
            kind            TEXT NOT NULL,
            start_line      INTEGER NOT NULL,
            end_line        INTEGER NOT NULL,
            is_exported     INTEGER NOT NULL DEFAULT 0,
            visibility      TEXT NOT NULL DEFAULT 'public',
            signature       TEXT,
            qualified_name  TEXT
        );

        CREATE TABLE IF NOT EXISTS symbol_edges (
            id                 INTEGER PRIMARY KEY AUTOINCREMENT,
            from_symbol_id     INTEGER NOT NULL,
            to_symbol_id       INTEGER,
            to_qualified_name  TEXT,
            kind               TEXT NOT NULL,
            line               INTEGER NOT NULL DEFAULT 0,
            parameter_context  TEXT,
            parameter_types    TEXT,
            UNIQUE(from_symbol_id, to_symbol_id, kind, line)
        );

        CREATE TABLE IF NOT EXISTS file_edges (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            from_file_id    INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
            to_file_id      INTEGER NOT NULL,
            kind            TEXT NOT NULL,
            line            INTEGER NOT NULL DEFAULT 0,
            UNIQUE(from_file_id, to_file_id, kind)
        );

        CREATE TABLE IF NOT EXISTS framework_entities (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            repository_id   INTEGER NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
            file_id         INTEGER REFERENCES files(id) ON DELETE CASCADE,
            symbol_id       INTEGER REFERENCES symbols(id) ON DELETE CASCADE,
            kind            TEXT NOT NULL,
            name            TEXT NOT NULL,
            metadata        TEXT NOT NULL DEFAULT '{}'
        );

        -- Indexes for resolver lookups and cleanup scans
        CREATE INDEX IF NOT EXISTS idx_files_repo ON files(repository_id);
        CREATE INDEX IF NOT EXISTS idx_symbols_file ON symbols(file_id);
        CREATE INDEX IF NOT EXISTS idx_symbols_name ON symbols(name);
        CREATE INDEX IF NOT EXISTS idx_symbols_qualified ON symbols(qualified_name);
        CREATE INDEX IF NOT EXISTS idx_edges_from ON symbol_edges(from_symbol_id);
        CREATE INDEX IF NOT EXISTS idx_edges_to ON symbol_edges(to_symbol_id);
        CREATE INDEX IF NOT EXISTS idx_edges_qualified ON symbol_edges(to_qualified_name);
        CREATE INDEX IF NOT EXISTS idx_file_edges_to ON file_edges(to_file_id);
        CREATE INDEX IF NOT EXISTS idx_entities_file ON framework_entities(file_id);
    ",
    )?;
    Ok(())
}

// ── Row mappers ─────────────────────────────────────────────────────────────

fn row_to_repository(row: &Row) -> rusqlite::Result<Repository> {
    let frameworks_json: String = row.get(4)?;
    let last_indexed: Option<String> = row.get(5)?;
    Ok(Repository {
        id: row.get(0)?,
        name: row.get(1)?,
        root_path: PathBuf::from(row.get::<_, String>(2)?),
        primary_language: row.get(3)?,
        frameworks: serde_json::from_str(&frameworks_json).unwrap_or_default(),
        last_indexed: last_indexed
            .and_then(|t| chrono::DateTime::parse_from_rfc3339(&t).ok())
            .map(|t| t.with_timezone(&Utc)),
        vcs_hash: row.get(6)?,
    })
}

const REPOSITORY_COLUMNS: &str =
    "id, name, root_path, primary_language, frameworks, last_indexed, vcs_hash";

fn row_to_file(row: &Row) -> rusqlite::Result<FileRecord> {
    Ok(FileRecord {
        id: row.get(0)?,
        repository_id: row.get(1)?,
        path: PathBuf::from(row.get::<_, String>(2)?),
        language: row.get(3)?,
        size: row.get(4)?,
        last_modified: row.get(5)?,
        content_hash: row.get(6)?,
        is_test: row.get::<_, i64>(7)? != 0,
        is_generated: row.get::<_, i64>(8)? != 0,
    })
}

const FILE_COLUMNS: &str =
    "id, repository_id, path, language, size_bytes, last_modified, content_hash, is_test, is_generated";

fn row_to_symbol(row: &Row) -> rusqlite::Result<SymbolRecord> {
    let kind: String = row.get(3)?;
    let visibility: String = row.get(7)?;
    Ok(SymbolRecord {
        id: row.get(0)?,
        file_id: row.get(1)?,
        name: row.get(2)?,
        kind: SymbolKind::from_str(&kind).unwrap_or(SymbolKind::Variable),
        start_line: row.get::<_, i64>(4)? as usize,
        end_line: row.get::<_, i64>(5)? as usize,
        is_exported: row.get::<_, i64>(6)? != 0,
        visibility: Visibility::from_str(&visibility).unwrap_or(Visibility::Public),
        signature: row.get(8)?,
        qualified_name: row.get(9)?,
    })
}

const SYMBOL_COLUMNS: &str =
    "id, file_id, name, kind, start_line, end_line, is_exported, visibility, signature, qualified_name";

fn row_to_symbol_edge(row: &Row) -> rusqlite::Result<SymbolEdgeRecord> {
    let kind: String = row.get(4)?;
    Ok(SymbolEdgeRecord {
        id: row.get(0)?,
        from_symbol_id: row.get(1)?,
        to_symbol_id: row.get(2)?,
        to_qualified_name: row.get(3)?,
        kind: DependencyKind::from_str(&kind).unwrap_or(DependencyKind::References),
        line: row.get::<_, i64>(5)? as usize,
        parameter_context: row.get(6)?,
        parameter_types: row.get(7)?,
    })
}

const SYMBOL_EDGE_COLUMNS: &str =
    "id, from_symbol_id, to_symbol_id, to_qualified_name, kind, line, parameter_context, parameter_types";

fn row_to_file_edge(row: &Row) -> rusqlite::Result<FileEdgeRecord> {
    let kind: String = row.get(3)?;
    Ok(FileEdgeRecord {
        id: row.get(0)?,
        from_file_id: row.get(1)?,
        to_file_id: row.get(2)?,
        kind: ImportKind::from_str(&kind).unwrap_or(ImportKind::Named),
        line: row.get::<_, i64>(4)? as usize,
    })
}

fn row_to_entity(row: &Row) -> rusqlite::Result<FrameworkEntityRecord> {
    let kind: String = row.get(4)?;
    let metadata: String = row.get(6)?;
    Ok(FrameworkEntityRecord {
        id: row.get(0)?,
        repository_id: row.get(1)?,
        file_id: row.get(2)?,
        symbol_id: row.get(3)?,
        kind: FrameworkEntityKind::from_str(&kind).unwrap_or(FrameworkEntityKind::Component),
        name: row.get(5)?,
        metadata: serde_json::from_str(&metadata).unwrap_or(serde_json::Value::Null),
    })
}

/// Render an id list for an `IN (...)` clause. Ids are integers, so inline
/// rendering is injection-safe and avoids the placeholder-count dance.
fn id_list(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

impl AnalysisStore for SqliteStore {
    fn ensure_repository(&self, root: &Path, name: &str) -> Result<Repository, StoreError> {
        let conn = self.lock();
        let root_str = root.to_string_lossy().to_string();

        let existing = conn
            .query_row(
                &format!(
                    "SELECT {} FROM repositories WHERE root_path = ?1",
                    REPOSITORY_COLUMNS
                ),
                params![root_str],
                row_to_repository,
            )
            .optional()?;

        if let Some(repo) = existing {
            return Ok(repo);
        }

        conn.execute(
            "INSERT INTO repositories (name, root_path) VALUES (?1, ?2)",
            params![name, root_str],
        )?;
        let id = conn.last_insert_rowid();

        Ok(Repository {
            id,
            name: name.to_string(),
            root_path: root.to_path_buf(),
            primary_language: None,
            frameworks: Vec::new(),
            last_indexed: None,
            vcs_hash: None,
        })
    }

    fn update_repository_meta(
        &self,
        repo_id: i64,
        primary_language: Option<&str>,
        frameworks: &[String],
        vcs_hash: Option<&str>,
    ) -> Result<(), StoreError> {
        let conn = self.lock();
        conn.execute(
            "UPDATE repositories
             SET primary_language = ?1, frameworks = ?2, last_indexed = ?3, vcs_hash = ?4
             WHERE id = ?5",
            params![
                primary_language,
                serde_json::to_string(frameworks)?,
                Utc::now().to_rfc3339(),
                vcs_hash,
                repo_id
            ],
        )?;
        Ok(())
    }

    fn insert_files(&self, repo_id: i64, files: &[NewFile]) -> Result<Vec<FileRecord>, StoreError> {
        if repo_id <= 0 {
            return Err(StoreError::InvalidId(format!("repository id {repo_id}")));
        }
        let conn = self.lock();
        let tx = conn.unchecked_transaction()?;
        let mut records = Vec::with_capacity(files.len());

        {
            let mut stmt = tx.prepare(
                "INSERT INTO files
                 (repository_id, path, language, size_bytes, last_modified, content_hash, is_test, is_generated)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(repository_id, path) DO UPDATE SET
                     language = ?3, size_bytes = ?4, last_modified = ?5,
                     content_hash = ?6, is_test = ?7, is_generated = ?8",
            )?;
            let mut lookup =
                tx.prepare("SELECT id FROM files WHERE repository_id = ?1 AND path = ?2")?;

            for file in files {
                let path_str = file.path.to_string_lossy().to_string();
                stmt.execute(params![
                    repo_id,
                    path_str,
                    file.language,
                    file.size,
                    file.last_modified,
                    file.content_hash,
                    file.is_test as i64,
                    file.is_generated as i64,
                ])?;
                let id: i64 = lookup.query_row(params![repo_id, path_str], |row| row.get(0))?;
                records.push(FileRecord {
                    id,
                    repository_id: repo_id,
                    path: file.path.clone(),
                    language: file.language.clone(),
                    size: file.size,
                    last_modified: file.last_modified,
                    content_hash: file.content_hash.clone(),
                    is_test: file.is_test,
                    is_generated: file.is_generated,
                });
            }
        }

        tx.commit()?;
        Ok(records)
    }

    fn insert_symbols(
        &self,
        file_id: i64,
        symbols: &[Symbol],
    ) -> Result<Vec<SymbolRecord>, StoreError> {
        if file_id <= 0 {
            return Err(StoreError::InvalidId(format!("file id {file_id}")));
        }
        let conn = self.lock();
        let tx = conn.unchecked_transaction()?;
        let mut records = Vec::with_capacity(symbols.len());

        {
            let mut stmt = tx.prepare(
                "INSERT INTO symbols
                 (file_id, name, kind, start_line, end_line, is_exported, visibility, signature, qualified_name)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;

            for symbol in symbols {
                stmt.execute(params![
                    file_id,
                    symbol.name,
                    symbol.kind.as_str(),
                    symbol.start_line as i64,
                    symbol.end_line as i64,
                    symbol.is_exported as i64,
                    symbol.visibility.as_str(),
                    symbol.signature,
                    symbol.qualified_name,
                ])?;
                records.push(SymbolRecord {
                    id: tx.last_insert_rowid(),
                    file_id,
                    name: symbol.name.clone(),
                    kind: symbol.kind,
                    start_line: symbol.start_line,
                    end_line: symbol.end_line,
                    is_exported: symbol.is_exported,
                    visibility: symbol.visibility,
                    signature: symbol.signature.clone(),
                    qualified_name: symbol.qualified_name.clone(),
                });
            }
        }

        tx.commit()?;
        Ok(records)
    }

    fn insert_symbol_edges(&self, edges: &[NewSymbolEdge]) -> Result<usize, StoreError> {
        let conn = self.lock();
        let tx = conn.unchecked_transaction()?;
        let mut inserted = 0usize;

        {
            let mut exists = tx.prepare("SELECT 1 FROM symbols WHERE id = ?1")?;
            let mut insert = tx.prepare(
                "INSERT OR IGNORE INTO symbol_edges
                 (from_symbol_id, to_symbol_id, to_qualified_name, kind, line, parameter_context, parameter_types)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;

            for edge in edges {
                let from_ok = exists
                    .query_row(params![edge.from_symbol_id], |_| Ok(()))
                    .optional()?
                    .is_some();
                let to_ok = match edge.to_symbol_id {
                    None => true,
                    Some(id) if id < 0 => true, // external-library sentinel
                    Some(id) => exists
                        .query_row(params![id], |_| Ok(()))
                        .optional()?
                        .is_some(),
                };
                if !from_ok || !to_ok {
                    debug!(
                        "dropping edge with missing endpoint: {} -> {:?}",
                        edge.from_symbol_id, edge.to_symbol_id
                    );
                    continue;
                }

                inserted += insert.execute(params![
                    edge.from_symbol_id,
                    edge.to_symbol_id,
                    edge.to_qualified_name,
                    edge.kind.as_str(),
                    edge.line as i64,
                    edge.parameter_context,
                    edge.parameter_types,
                ])?;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    fn insert_file_edges(&self, edges: &[NewFileEdge]) -> Result<usize, StoreError> {
        let conn = self.lock();
        let tx = conn.unchecked_transaction()?;
        let mut inserted = 0usize;

        {
            let mut insert = tx.prepare(
                "INSERT OR IGNORE INTO file_edges (from_file_id, to_file_id, kind, line)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for edge in edges {
                inserted += insert.execute(params![
                    edge.from_file_id,
                    edge.to_file_id,
                    edge.kind.as_str(),
                    edge.line as i64,
                ])?;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    fn insert_framework_entities(
        &self,
        repo_id: i64,
        entities: &[NewFrameworkEntity],
    ) -> Result<usize, StoreError> {
        let conn = self.lock();
        let tx = conn.unchecked_transaction()?;
        let mut inserted = 0usize;

        {
            let mut insert = tx.prepare(
                "INSERT INTO framework_entities (repository_id, file_id, symbol_id, kind, name, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for entity in entities {
                inserted += insert.execute(params![
                    repo_id,
                    entity.file_id,
                    entity.symbol_id,
                    entity.kind.as_str(),
                    entity.name,
                    serde_json::to_string(&entity.metadata)?,
                ])?;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    fn cleanup_file_data(&self, file_ids: &[i64]) -> Result<(), StoreError> {
        if file_ids.is_empty() {
            return Ok(());
        }
        let conn = self.lock();
        let tx = conn.unchecked_transaction()?;
        let files = id_list(file_ids);

        let symbol_ids: Vec<i64> = {
            let mut stmt = tx.prepare(&format!(
                "SELECT id FROM symbols WHERE file_id IN ({files})"
            ))?;
            let ids = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<i64>, _>>()?;
            ids
        };
        let symbols = id_list(&symbol_ids);

        if !symbol_ids.is_empty() {
            // Outbound edges die with their callers
            tx.execute(
                &format!("DELETE FROM symbol_edges WHERE from_symbol_id IN ({symbols})"),
                [],
            )?;
            // Inbound edges with live outside callers are re-queued: target
            // cleared, qualified name retained for later re-binding
            tx.execute(
                &format!(
                    "UPDATE symbol_edges SET to_symbol_id = NULL WHERE to_symbol_id IN ({symbols})"
                ),
                [],
            )?;
            // Rows with nothing left to re-bind by are dead weight
            tx.execute(
                "DELETE FROM symbol_edges WHERE to_symbol_id IS NULL AND to_qualified_name IS NULL",
                [],
            )?;
            tx.execute(
                &format!("DELETE FROM framework_entities WHERE symbol_id IN ({symbols})"),
                [],
            )?;
        }

        tx.execute(
            &format!("DELETE FROM framework_entities WHERE file_id IN ({files})"),
            [],
        )?;
        tx.execute(
            &format!(
                "DELETE FROM file_edges WHERE from_file_id IN ({files}) OR to_file_id IN ({files})"
            ),
            [],
        )?;
        tx.execute(&format!("DELETE FROM symbols WHERE file_id IN ({files})"), [])?;
        tx.execute(&format!("DELETE FROM files WHERE id IN ({files})"), [])?;

        tx.commit()?;
        debug!(
            "cleaned up {} files, {} symbols",
            file_ids.len(),
            symbol_ids.len()
        );
        Ok(())
    }

    fn cleanup_repository(&self, repo_id: i64) -> Result<(), StoreError> {
        let file_ids: Vec<i64> = {
            let conn = self.lock();
            let mut stmt = conn.prepare("SELECT id FROM files WHERE repository_id = ?1")?;
            let ids = stmt
                .query_map(params![repo_id], |row| row.get(0))?
                .collect::<Result<Vec<i64>, _>>()?;
            ids
        };
        if file_ids.is_empty() {
            return Ok(());
        }
        self.cleanup_file_data(&file_ids)
    }

    fn files_for_repository(&self, repo_id: i64) -> Result<Vec<FileRecord>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE repository_id = ?1 ORDER BY path"
        ))?;
        let rows = stmt.query_map(params![repo_id], row_to_file)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn file_id_for_path(&self, repo_id: i64, path: &Path) -> Result<Option<i64>, StoreError> {
        let conn = self.lock();
        let id = conn
            .query_row(
                "SELECT id FROM files WHERE repository_id = ?1 AND path = ?2",
                params![repo_id, path.to_string_lossy()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn symbols_for_file(&self, file_id: i64) -> Result<Vec<SymbolRecord>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SYMBOL_COLUMNS} FROM symbols WHERE file_id = ?1 ORDER BY start_line"
        ))?;
        let rows = stmt.query_map(params![file_id], row_to_symbol)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn symbols_by_name(&self, repo_id: i64, name: &str) -> Result<Vec<SymbolRecord>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM symbols s
             JOIN files f ON s.file_id = f.id
             WHERE f.repository_id = ?1 AND s.name = ?2
             ORDER BY f.path, s.start_line",
            qualified_symbol_columns()
        ))?;
        let rows = stmt.query_map(params![repo_id, name], row_to_symbol)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn symbol_by_qualified_name(
        &self,
        repo_id: i64,
        qualified_name: &str,
    ) -> Result<Option<SymbolRecord>, StoreError> {
        let conn = self.lock();
        let record = conn
            .query_row(
                &format!(
                    "SELECT {} FROM symbols s
                     JOIN files f ON s.file_id = f.id
                     WHERE f.repository_id = ?1 AND s.qualified_name = ?2
                     ORDER BY f.path LIMIT 1",
                    qualified_symbol_columns()
                ),
                params![repo_id, qualified_name],
                row_to_symbol,
            )
            .optional()?;
        Ok(record)
    }

    fn exported_by_name(&self, repo_id: i64, name: &str) -> Result<Vec<SymbolRecord>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM symbols s
             JOIN files f ON s.file_id = f.id
             WHERE f.repository_id = ?1 AND s.name = ?2 AND s.is_exported = 1
             ORDER BY f.path, s.start_line",
            qualified_symbol_columns()
        ))?;
        let rows = stmt.query_map(params![repo_id, name], row_to_symbol)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn unresolved_dependencies(&self, repo_id: i64) -> Result<Vec<SymbolEdgeRecord>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM symbol_edges e
             JOIN symbols s ON e.from_symbol_id = s.id
             JOIN files f ON s.file_id = f.id
             WHERE f.repository_id = ?1
               AND e.to_symbol_id IS NULL
               AND e.to_qualified_name IS NOT NULL",
            qualified_edge_columns()
        ))?;
        let rows = stmt.query_map(params![repo_id], row_to_symbol_edge)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn bind_dependency(&self, edge_id: i64, to_symbol_id: i64) -> Result<(), StoreError> {
        let conn = self.lock();
        let changed = conn.execute(
            "UPDATE symbol_edges SET to_symbol_id = ?1 WHERE id = ?2 AND to_symbol_id IS NULL",
            params![to_symbol_id, edge_id],
        )?;
        if changed == 0 {
            warn!("bind_dependency: edge {edge_id} was not unresolved");
        }
        Ok(())
    }

    fn symbol_edges_for_repository(
        &self,
        repo_id: i64,
    ) -> Result<Vec<SymbolEdgeRecord>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM symbol_edges e
             JOIN symbols s ON e.from_symbol_id = s.id
             JOIN files f ON s.file_id = f.id
             WHERE f.repository_id = ?1
             ORDER BY e.from_symbol_id, e.line",
            qualified_edge_columns()
        ))?;
        let rows = stmt.query_map(params![repo_id], row_to_symbol_edge)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn file_edges_for_repository(&self, repo_id: i64) -> Result<Vec<FileEdgeRecord>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT e.id, e.from_file_id, e.to_file_id, e.kind, e.line
             FROM file_edges e
             JOIN files f ON e.from_file_id = f.id
             WHERE f.repository_id = ?1
             ORDER BY e.from_file_id, e.to_file_id",
        )?;
        let rows = stmt.query_map(params![repo_id], row_to_file_edge)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn framework_entities_for_repository(
        &self,
        repo_id: i64,
    ) -> Result<Vec<FrameworkEntityRecord>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, repository_id, file_id, symbol_id, kind, name, metadata
             FROM framework_entities WHERE repository_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![repo_id], row_to_entity)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn graph_counts(&self, repo_id: i64) -> Result<GraphCounts, StoreError> {
        let conn = self.lock();
        let file_nodes: i64 = conn.query_row(
            "SELECT COUNT(*) FROM files WHERE repository_id = ?1",
            params![repo_id],
            |row| row.get(0),
        )?;
        let file_edges: i64 = conn.query_row(
            "SELECT COUNT(*) FROM file_edges e
             JOIN files f ON e.from_file_id = f.id WHERE f.repository_id = ?1",
            params![repo_id],
            |row| row.get(0),
        )?;
        let symbol_nodes: i64 = conn.query_row(
            "SELECT COUNT(*) FROM symbols s
             JOIN files f ON s.file_id = f.id WHERE f.repository_id = ?1",
            params![repo_id],
            |row| row.get(0),
        )?;
        let symbol_edges: i64 = conn.query_row(
            "SELECT COUNT(*) FROM symbol_edges e
             JOIN symbols s ON e.from_symbol_id = s.id
             JOIN files f ON s.file_id = f.id WHERE f.repository_id = ?1",
            params![repo_id],
            |row| row.get(0),
        )?;

        Ok(GraphCounts {
            file_nodes: file_nodes as usize,
            file_edges: file_edges as usize,
            symbol_nodes: symbol_nodes as usize,
            symbol_edges: symbol_edges as usize,
        })
    }
}

fn qualified_symbol_columns() -> String {
    SYMBOL_COLUMNS
        .split(", ")
        .map(|c| format!("s.{c}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn qualified_edge_columns() -> String {
    SYMBOL_EDGE_COLUMNS
        .split(", ")
        .map(|c| format!("e.{c}"))
        .collect::<Vec<_>>()
        .join(", ")
}
