//! Analysis pass orchestration
//!
//! One pass runs discovery → framework detection → parallel parsing →
//! deterministic merge → per-file store writes → symbol resolution → graph
//! assembly → summary. Parsing fans out on a rayon pool bounded by
//! `max_concurrency`; results are merged in path order so ambiguity
//! tie-breaks are reproducible. A cancellation flag is honored at file and
//! stage boundaries; an aborted pass leaves the previous pass's data intact
//! for everything not yet committed.

use crate::config::AnalysisConfig;
use crate::discovery::{discover_files, WalkedFile};
use crate::framework::{detect_frameworks, tag_entities, CrossStackDecision, FrameworkDetection};
use crate::graph::{FileGraphBuilder, SymbolGraphBuilder, SymbolGraphStats};
use crate::incremental::{self, hash_bytes, unix_seconds, PassMode};
use crate::language::Language;
use crate::parser::{ParseOptions, ParseResult, ParserDispatcher, Severity};
use crate::resolver::autoloader::Psr4Autoloader;
use crate::resolver::paths::ModulePathResolver;
use crate::resolver::{FileContext, SymbolResolver};
use crate::store::{AnalysisStore, GraphCounts, NewFile, NewFrameworkEntity};
use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Terminal state of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStatus {
    Completed,
    Aborted,
}

/// One suppressed per-file problem, surfaced in the summary.
#[derive(Debug, Clone)]
pub struct PassError {
    pub path: PathBuf,
    pub message: String,
}

/// What a pass did, for callers and the CLI.
#[derive(Debug)]
pub struct AnalysisSummary {
    pub status: PassStatus,
    pub mode: PassMode,
    pub files_discovered: usize,
    pub files_processed: usize,
    pub files_skipped: usize,
    pub symbols_extracted: usize,
    pub symbol_edges_created: usize,
    pub file_edges_created: usize,
    pub framework_entities_created: usize,
    pub resolution: SymbolGraphStats,
    pub graph_counts: GraphCounts,
    pub cross_stack: CrossStackDecision,
    pub errors: Vec<PassError>,
    pub duration: Duration,
}

/// Drives one end-to-end analysis pass over a repository root.
pub struct AnalysisPipeline<'a> {
    store: &'a dyn AnalysisStore,
    config: AnalysisConfig,
    dispatcher: ParserDispatcher,
}

impl<'a> AnalysisPipeline<'a> {
    pub fn new(store: &'a dyn AnalysisStore, config: AnalysisConfig) -> Self {
        Self {
            store,
            config,
            dispatcher: ParserDispatcher::new(),
        }
    }

    /// Run a pass without external cancellation.
    pub fn run(&self, root: &Path) -> Result<AnalysisSummary> {
        self.run_with_cancel(root, Arc::new(AtomicBool::new(false)))
    }

    /// Run a pass, checking `cancel` at file and stage boundaries.
    pub fn run_with_cancel(
        &self,
        root: &Path,
        cancel: Arc<AtomicBool>,
    ) -> Result<AnalysisSummary> {
        let started = Instant::now();

        let root = root
            .canonicalize()
            .with_context(|| format!("invalid repository root: {}", root.display()))?;
        let repo_name = root
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("repository")
            .to_string();

        let repo = self
            .store
            .ensure_repository(&root, &repo_name)
            .context("store unreachable")?;

        let detection = detect_frameworks(&root, self.config.cross_stack_enabled);
        let discovered = discover_files(&root, &self.config)?;
        info!("discovered {} candidate files", discovered.len());

        let plan = incremental::plan(self.store, repo.id, &discovered, &self.config)?;

        let mut summary = AnalysisSummary {
            status: PassStatus::Completed,
            mode: plan.mode,
            files_discovered: discovered.len(),
            files_processed: 0,
            files_skipped: 0,
            symbols_extracted: 0,
            symbol_edges_created: 0,
            file_edges_created: 0,
            framework_entities_created: 0,
            resolution: SymbolGraphStats::default(),
            graph_counts: GraphCounts::default(),
            cross_stack: detection.cross_stack.clone(),
            errors: Vec::new(),
            duration: Duration::default(),
        };

        // Nothing is deleted before this point; cancelling here leaves the
        // previous pass's data untouched
        if cancel.load(Ordering::Relaxed) {
            return Ok(self.aborted(summary, started));
        }

        match plan.mode {
            PassMode::Full => {
                self.store.cleanup_repository(repo.id)?;
            }
            PassMode::Incremental => {
                self.store.cleanup_file_data(&plan.cleanup_ids)?;
            }
        }

        // ── Read sources ─────────────────────────────────────────────────────
        let mut inputs: Vec<(PathBuf, Language, String)> = Vec::new();
        let mut walked_by_path: HashMap<PathBuf, (&WalkedFile, String)> = HashMap::new();

        for file in &plan.to_parse {
            if cancel.load(Ordering::Relaxed) {
                return Ok(self.aborted(summary, started));
            }
            match std::fs::read(&file.absolute_path) {
                Ok(bytes) => {
                    let hash = hash_bytes(&bytes);
                    let source = self.decode(&file.absolute_path, bytes, &mut summary.errors);
                    walked_by_path.insert(file.absolute_path.clone(), (file, hash));
                    inputs.push((file.absolute_path.clone(), file.language, source));
                }
                Err(err) => {
                    warn!("unreadable file {}: {err}", file.absolute_path.display());
                    summary.files_skipped += 1;
                    summary.errors.push(PassError {
                        path: file.absolute_path.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }

        // ── Parse (parallel, bounded) ────────────────────────────────────────
        let options = ParseOptions {
            chunking_threshold: self.config.chunking_threshold,
            chunk_overlap_lines: self.config.chunk_overlap_lines,
            parse_timeout: Duration::from_secs(self.config.parse_timeout_secs),
        };

        let results = if self.config.parallel_parsing {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.max_concurrency.max(1))
                .build()
                .context("failed to build parser thread pool")?;
            pool.install(|| self.dispatcher.parse_files(&inputs, &options, true, &cancel))
        } else {
            self.dispatcher.parse_files(&inputs, &options, false, &cancel)
        };

        if cancel.load(Ordering::Relaxed) {
            return Ok(self.aborted(summary, started));
        }

        // ── Persist files and symbols (one batch per file) ───────────────────
        let new_files: Vec<NewFile> = results
            .iter()
            .filter_map(|result| {
                let (walked, hash) = walked_by_path.get(&result.path)?;
                Some(NewFile {
                    path: walked.absolute_path.clone(),
                    language: walked.language.tag().to_string(),
                    size: walked.size as i64,
                    last_modified: unix_seconds(walked.modified),
                    content_hash: Some(hash.clone()),
                    is_test: walked.is_test,
                    is_generated: walked.is_generated,
                })
            })
            .collect();
        let file_records = self.store.insert_files(repo.id, &new_files)?;
        let record_by_path: HashMap<&PathBuf, _> =
            file_records.iter().map(|f| (&f.path, f)).collect();

        let mut contexts: Vec<FileContext> = Vec::new();
        let mut parsed_paths: HashSet<PathBuf> = HashSet::new();

        for result in &results {
            let Some(record) = record_by_path.get(&result.path) else {
                continue;
            };
            parsed_paths.insert(result.path.clone());
            self.collect_diagnostics(result, &mut summary);

            if result.has_fatal_errors() {
                summary.files_skipped += 1;
                continue;
            }

            let symbols = match self.store.insert_symbols(record.id, &result.symbols) {
                Ok(symbols) => symbols,
                Err(err) => {
                    // A failed batch leaves no partial rows; move on
                    warn!("symbol batch failed for {}: {err}", result.path.display());
                    summary.errors.push(PassError {
                        path: result.path.clone(),
                        message: err.to_string(),
                    });
                    summary.files_skipped += 1;
                    continue;
                }
            };

            summary.files_processed += 1;
            summary.symbols_extracted += symbols.len();
            contexts.push(FileContext {
                file: (*record).clone(),
                symbols,
                imports: result.imports.clone(),
                exports: result.exports.clone(),
                dependencies: result.dependencies.clone(),
            });
        }

        // Unchanged files still anchor cross-file resolution: load their
        // symbols from the store with no imports or raw dependencies
        for stored in self.store.files_for_repository(repo.id)? {
            if parsed_paths.contains(&stored.path) {
                continue;
            }
            let symbols = self.store.symbols_for_file(stored.id)?;
            contexts.push(FileContext {
                file: stored,
                symbols,
                imports: Vec::new(),
                exports: Vec::new(),
                dependencies: Vec::new(),
            });
        }

        contexts.sort_by(|a, b| a.file.path.cmp(&b.file.path));

        if cancel.load(Ordering::Relaxed) {
            return Ok(self.aborted(summary, started));
        }

        // ── Resolve and assemble graphs ──────────────────────────────────────
        let path_resolver = ModulePathResolver::new(
            &root,
            contexts.iter().map(|c| c.file.path.clone()),
        );
        let autoloader = Psr4Autoloader::from_composer(&root);

        let file_graph_builder = FileGraphBuilder::new(&path_resolver, &autoloader);
        let file_edges = file_graph_builder.build(&contexts);
        match self.store.insert_file_edges(&file_edges) {
            Ok(count) => summary.file_edges_created = count,
            Err(err) => {
                warn!("file edge batch failed: {err}");
                summary.errors.push(PassError {
                    path: root.clone(),
                    message: err.to_string(),
                });
            }
        }

        let resolver = SymbolResolver::new(&contexts, path_resolver, autoloader);
        let (symbol_edges, stats) = SymbolGraphBuilder::new(&resolver).build();
        summary.resolution = stats;
        match self.store.insert_symbol_edges(&symbol_edges) {
            Ok(count) => summary.symbol_edges_created = count,
            Err(err) => {
                warn!("symbol edge batch failed: {err}");
                summary.errors.push(PassError {
                    path: root.clone(),
                    message: err.to_string(),
                });
            }
        }

        // Re-bind edges whose retained qualified names resolve again
        incremental::rebind_unresolved(self.store, repo.id)?;

        // ── Framework entities ───────────────────────────────────────────────
        summary.framework_entities_created =
            self.persist_entities(repo.id, &results, &contexts, &detection)?;

        let primary_language = primary_language(&discovered);
        self.store.update_repository_meta(
            repo.id,
            primary_language.as_deref(),
            &detection.tags(),
            None,
        )?;

        summary.graph_counts = self.store.graph_counts(repo.id)?;
        summary.duration = started.elapsed();
        info!(
            "pass complete: {} files, {} symbols, {} symbol edges in {:?}",
            summary.files_processed,
            summary.symbols_extracted,
            summary.symbol_edges_created,
            summary.duration
        );
        Ok(summary)
    }

    fn aborted(&self, mut summary: AnalysisSummary, started: Instant) -> AnalysisSummary {
        summary.status = PassStatus::Aborted;
        summary.duration = started.elapsed();
        warn!("analysis pass aborted after {:?}", summary.duration);
        summary
    }

    /// Decode bytes as UTF-8, falling back to the configured encoding.
    fn decode(&self, path: &Path, bytes: Vec<u8>, errors: &mut Vec<PassError>) -> String {
        match String::from_utf8(bytes) {
            Ok(source) => source,
            Err(err) => {
                let bytes = err.into_bytes();
                errors.push(PassError {
                    path: path.to_path_buf(),
                    message: format!(
                        "invalid UTF-8, decoded with {} fallback",
                        self.config.encoding_fallback
                    ),
                });
                match self.config.encoding_fallback.as_str() {
                    "latin-1" => bytes.iter().map(|&b| b as char).collect(),
                    _ => String::from_utf8_lossy(&bytes).into_owned(),
                }
            }
        }
    }

    fn collect_diagnostics(&self, result: &ParseResult, summary: &mut AnalysisSummary) {
        for diagnostic in &result.errors {
            if diagnostic.severity == Severity::Error {
                summary.errors.push(PassError {
                    path: result.path.clone(),
                    message: format!(
                        "{}:{} {}",
                        diagnostic.line, diagnostic.column, diagnostic.message
                    ),
                });
            }
        }
    }

    fn persist_entities(
        &self,
        repo_id: i64,
        results: &[ParseResult],
        contexts: &[FileContext],
        detection: &FrameworkDetection,
    ) -> Result<usize> {
        let context_by_path: HashMap<&PathBuf, &FileContext> =
            contexts.iter().map(|c| (&c.file.path, c)).collect();

        let mut rows: Vec<NewFrameworkEntity> = Vec::new();
        for result in results {
            let Some(ctx) = context_by_path.get(&result.path) else {
                continue;
            };
            for draft in tag_entities(result, &detection.frameworks) {
                let symbol_id = draft
                    .symbol_name
                    .as_deref()
                    .and_then(|name| ctx.symbol_named(name))
                    .map(|s| s.id);
                rows.push(NewFrameworkEntity {
                    file_id: Some(ctx.file.id),
                    symbol_id,
                    kind: draft.kind,
                    name: draft.name,
                    metadata: draft.metadata,
                });
            }
        }

        Ok(self.store.insert_framework_entities(repo_id, &rows)?)
    }
}

/// Most common source language among the discovered files.
fn primary_language(discovered: &[WalkedFile]) -> Option<String> {
    let mut counts: HashMap<&'static str, usize> = HashMap::new();
    for file in discovered {
        if !file.language.is_data_format() {
            *counts.entry(file.language.tag()).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .max_by_key(|&(tag, count)| (count, std::cmp::Reverse(tag)))
        .map(|(tag, _)| tag.to_string())
}
