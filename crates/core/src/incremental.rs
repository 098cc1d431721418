//! Incremental analysis planning
//!
//! Decides the per-file re-parse set by comparing discovered files against
//! the rows of the previous pass: modification time first, content hash as
//! the tie-breaker. Direct file-level dependents of changed files are
//! re-parsed too so their file edges (deleted by cleanup) can be rebuilt;
//! symbol edges from files that are not re-parsed re-bind through retained
//! qualified names instead. When too large a fraction of the repository
//! changed, the pass is promoted to a full re-analysis.

use crate::config::AnalysisConfig;
use crate::discovery::WalkedFile;
use crate::store::{AnalysisStore, StoreError};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// How much of the repository a pass will re-analyze.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassMode {
    Full,
    Incremental,
}

/// The work a pass has to do.
#[derive(Debug)]
pub struct IncrementalPlan {
    pub mode: PassMode,
    /// Files to parse this pass
    pub to_parse: Vec<WalkedFile>,
    /// Existing file rows to clean up before re-inserting
    pub cleanup_ids: Vec<i64>,
    /// Files present in the store but gone from the tree
    pub removed_count: usize,
}

/// Compute the plan for this pass.
pub fn plan(
    store: &dyn AnalysisStore,
    repo_id: i64,
    discovered: &[WalkedFile],
    config: &AnalysisConfig,
) -> Result<IncrementalPlan, StoreError> {
    let stored = store.files_for_repository(repo_id)?;

    if stored.is_empty() || config.force_full_analysis {
        return Ok(IncrementalPlan {
            mode: PassMode::Full,
            to_parse: discovered.to_vec(),
            cleanup_ids: Vec::new(),
            removed_count: 0,
        });
    }

    let stored_by_path: HashMap<&PathBuf, _> =
        stored.iter().map(|f| (&f.path, f)).collect();
    let discovered_paths: HashSet<&PathBuf> =
        discovered.iter().map(|f| &f.absolute_path).collect();

    let mut changed_paths: HashSet<PathBuf> = HashSet::new();
    for file in discovered {
        match stored_by_path.get(&file.absolute_path) {
            None => {
                changed_paths.insert(file.absolute_path.clone());
            }
            Some(record) => {
                let mtime = unix_seconds(file.modified);
                if mtime <= record.last_modified {
                    continue;
                }
                // mtime moved; the content hash decides whether it matters
                let unchanged = match (&record.content_hash, hash_file(&file.absolute_path)) {
                    (Some(stored_hash), Some(current)) => stored_hash == &current,
                    _ => false,
                };
                if !unchanged {
                    changed_paths.insert(file.absolute_path.clone());
                }
            }
        }
    }

    let removed: Vec<_> = stored
        .iter()
        .filter(|f| !discovered_paths.contains(&f.path))
        .collect();

    if changed_paths.is_empty() && removed.is_empty() {
        return Ok(IncrementalPlan {
            mode: PassMode::Incremental,
            to_parse: Vec::new(),
            cleanup_ids: Vec::new(),
            removed_count: 0,
        });
    }

    // Backstop: past the threshold an incremental pass costs more than it saves
    let touched = changed_paths.len() + removed.len();
    let fraction = touched as f64 / discovered.len().max(1) as f64;
    if fraction > config.full_reanalysis_threshold {
        info!(
            "{touched} of {} files changed ({:.0}%), promoting to full re-analysis",
            discovered.len(),
            fraction * 100.0
        );
        return Ok(IncrementalPlan {
            mode: PassMode::Full,
            to_parse: discovered.to_vec(),
            cleanup_ids: Vec::new(),
            removed_count: removed.len(),
        });
    }

    // Cleanup deletes file edges touching the changed set in both
    // directions; direct importers must re-parse to rebuild theirs
    let affected_ids: HashSet<i64> = changed_paths
        .iter()
        .filter_map(|p| stored_by_path.get(&p).map(|f| f.id))
        .chain(removed.iter().map(|f| f.id))
        .collect();

    let stored_by_id: HashMap<i64, &PathBuf> = stored.iter().map(|f| (f.id, &f.path)).collect();
    let mut reparse_paths = changed_paths.clone();
    for edge in store.file_edges_for_repository(repo_id)? {
        if affected_ids.contains(&edge.to_file_id) && !affected_ids.contains(&edge.from_file_id) {
            if let Some(path) = stored_by_id.get(&edge.from_file_id) {
                reparse_paths.insert((*path).clone());
            }
        }
    }

    let to_parse: Vec<WalkedFile> = discovered
        .iter()
        .filter(|f| reparse_paths.contains(&f.absolute_path))
        .cloned()
        .collect();

    let cleanup_ids: Vec<i64> = reparse_paths
        .iter()
        .filter_map(|p| stored_by_path.get(&p).map(|f| f.id))
        .chain(removed.iter().map(|f| f.id))
        .collect();

    debug!(
        "incremental plan: {} to parse ({} changed, {} dependents), {} removed",
        to_parse.len(),
        changed_paths.len(),
        to_parse.len().saturating_sub(changed_paths.len()),
        removed.len()
    );

    Ok(IncrementalPlan {
        mode: PassMode::Incremental,
        to_parse,
        cleanup_ids,
        removed_count: removed.len(),
    })
}

/// Re-bind previously unresolved edges whose retained qualified name now
/// matches a live symbol (renames resolving forward, late-arriving files).
pub fn rebind_unresolved(store: &dyn AnalysisStore, repo_id: i64) -> Result<usize, StoreError> {
    let mut rebound = 0usize;

    for edge in store.unresolved_dependencies(repo_id)? {
        let Some(qualified) = &edge.to_qualified_name else {
            continue;
        };
        if let Some(symbol) = store.symbol_by_qualified_name(repo_id, qualified)? {
            store.bind_dependency(edge.id, symbol.id)?;
            rebound += 1;
        }
    }

    if rebound > 0 {
        debug!("re-bound {rebound} previously unresolved dependencies");
    }
    Ok(rebound)
}

pub fn unix_seconds(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// SHA-256 of the file contents, hex-encoded.
pub fn hash_file(path: &std::path::Path) -> Option<String> {
    let contents = std::fs::read(path).ok()?;
    Some(hash_bytes(&contents))
}

pub fn hash_bytes(contents: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
