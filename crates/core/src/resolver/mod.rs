//! Two-phase symbol resolver: raw textual dependencies → graph edges
//!
//! Initialization builds read-only in-memory indexes over the pass's file
//! contexts (symbols-by-name, exported-by-name, qualified names, file paths).
//! Resolution then walks each file's raw dependencies through a deterministic
//! strategy chain: language-specific member/qualified resolution, local
//! scope, import-mediated lookup, single-global-export fallback, and the
//! framework symbol registry. A miss is the normal failure mode and is only
//! logged at debug level.

pub mod autoloader;
pub mod csharp;
pub mod javascript;
pub mod paths;
pub mod php;
pub mod registry;

use crate::language::Language;
use crate::parser::{Export, Import, RawDependency, SymbolKind};
use crate::store::{FileRecord, SymbolRecord};
use autoloader::Psr4Autoloader;
use paths::ModulePathResolver;
use registry::FrameworkSymbolRegistry;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Everything the resolver knows about one file in the current pass.
#[derive(Debug, Clone)]
pub struct FileContext {
    pub file: FileRecord,
    pub symbols: Vec<SymbolRecord>,
    pub imports: Vec<Import>,
    pub exports: Vec<Export>,
    pub dependencies: Vec<RawDependency>,
}

impl FileContext {
    pub fn language(&self) -> Option<Language> {
        Language::from_tag(&self.file.language)
    }

    /// First symbol with the given bare name.
    pub fn symbol_named(&self, name: &str) -> Option<&SymbolRecord> {
        self.symbols.iter().find(|s| s.name == name)
    }

    /// Namespace declared in this file, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.symbols
            .iter()
            .find(|s| s.kind == SymbolKind::Namespace)
            .and_then(|s| s.qualified_name.as_deref())
    }
}

/// Which strategy produced a resolution. Deterministic given the same inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Language-specific member/qualified resolution
    Qualified,
    /// Symbol declared in the same file
    LocalScope,
    /// Matched through an import declaration
    Import,
    /// Exactly one exported symbol with the target name
    SingleExport,
    /// Framework/external-library registry (synthetic negative id)
    Framework,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Qualified => "qualified",
            Strategy::LocalScope => "local_scope",
            Strategy::Import => "import",
            Strategy::SingleExport => "single_export",
            Strategy::Framework => "framework",
        }
    }
}

/// A successful resolution: the target symbol id plus bookkeeping.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub symbol_id: i64,
    pub to_qualified_name: Option<String>,
    pub strategy: Strategy,
}

impl Resolution {
    fn of(symbol: &SymbolRecord, strategy: Strategy) -> Self {
        Self {
            symbol_id: symbol.id,
            to_qualified_name: symbol.qualified_name.clone(),
            strategy,
        }
    }
}

/// Outcome of a language-specific strategy. `Unresolved` is a veto: the
/// common fallbacks must not run (e.g. a typed receiver that failed to bind).
pub(crate) enum LanguageOutcome {
    Resolved(Resolution),
    Unresolved,
    Continue,
}

/// Final outcome for one raw dependency. `Vetoed` means a language strategy
/// conclusively rejected the target; the assembler's single-candidate
/// fallback applies only to `Miss`.
#[derive(Debug, Clone)]
pub enum ResolutionOutcome {
    Resolved(Resolution),
    Vetoed,
    Miss,
}

impl ResolutionOutcome {
    pub fn resolution(&self) -> Option<&Resolution> {
        match self {
            ResolutionOutcome::Resolved(r) => Some(r),
            _ => None,
        }
    }
}

/// Per-pass symbol resolver. Indexes are built once and read-only thereafter.
pub struct SymbolResolver<'a> {
    contexts: &'a [FileContext],
    by_name: HashMap<&'a str, Vec<(usize, usize)>>,
    exported_by_name: HashMap<&'a str, Vec<(usize, usize)>>,
    by_qualified: HashMap<&'a str, (usize, usize)>,
    ctx_by_file_id: HashMap<i64, usize>,
    ctx_by_path: HashMap<&'a Path, usize>,
    paths: ModulePathResolver,
    autoloader: Psr4Autoloader,
    registry: FrameworkSymbolRegistry,
}

impl<'a> SymbolResolver<'a> {
    /// Build indexes over contexts. Contexts must be ordered by file path so
    /// ambiguity tie-breaks are reproducible.
    pub fn new(
        contexts: &'a [FileContext],
        paths: ModulePathResolver,
        autoloader: Psr4Autoloader,
    ) -> Self {
        let mut by_name: HashMap<&str, Vec<(usize, usize)>> = HashMap::new();
        let mut exported_by_name: HashMap<&str, Vec<(usize, usize)>> = HashMap::new();
        let mut by_qualified: HashMap<&str, (usize, usize)> = HashMap::new();
        let mut ctx_by_file_id = HashMap::new();
        let mut ctx_by_path = HashMap::new();

        for (ci, ctx) in contexts.iter().enumerate() {
            ctx_by_file_id.insert(ctx.file.id, ci);
            ctx_by_path.insert(ctx.file.path.as_path(), ci);
            for (si, symbol) in ctx.symbols.iter().enumerate() {
                by_name.entry(symbol.name.as_str()).or_default().push((ci, si));
                if symbol.is_exported {
                    exported_by_name
                        .entry(symbol.name.as_str())
                        .or_default()
                        .push((ci, si));
                }
                if let Some(qualified) = symbol.qualified_name.as_deref() {
                    // First writer wins: contexts arrive in path order
                    by_qualified.entry(qualified).or_insert((ci, si));
                }
            }
        }

        Self {
            contexts,
            by_name,
            exported_by_name,
            by_qualified,
            ctx_by_file_id,
            ctx_by_path,
            paths,
            autoloader,
            registry: FrameworkSymbolRegistry::new(),
        }
    }

    // ── Index accessors ─────────────────────────────────────────────────────

    fn symbol(&self, key: (usize, usize)) -> &SymbolRecord {
        &self.contexts[key.0].symbols[key.1]
    }

    pub fn symbols_named(&self, name: &str) -> Vec<&SymbolRecord> {
        self.by_name
            .get(name)
            .map(|keys| keys.iter().map(|&k| self.symbol(k)).collect())
            .unwrap_or_default()
    }

    pub fn exported_named(&self, name: &str) -> Vec<&SymbolRecord> {
        self.exported_by_name
            .get(name)
            .map(|keys| keys.iter().map(|&k| self.symbol(k)).collect())
            .unwrap_or_default()
    }

    pub fn lookup_qualified(&self, qualified: &str) -> Option<&SymbolRecord> {
        self.by_qualified.get(qualified).map(|&k| self.symbol(k))
    }

    pub fn context_for_file_id(&self, file_id: i64) -> Option<&FileContext> {
        self.ctx_by_file_id.get(&file_id).map(|&ci| &self.contexts[ci])
    }

    pub fn context_for_path(&self, path: &Path) -> Option<&FileContext> {
        self.ctx_by_path.get(path).map(|&ci| &self.contexts[ci])
    }

    pub fn contexts(&self) -> &[FileContext] {
        self.contexts
    }

    pub fn path_resolver(&self) -> &ModulePathResolver {
        &self.paths
    }

    pub(crate) fn autoloader(&self) -> &Psr4Autoloader {
        &self.autoloader
    }

    // ── Resolution ──────────────────────────────────────────────────────────

    /// Map a raw dependency's anchor to a symbol id in its own file.
    pub fn from_symbol_id(&self, ctx: &FileContext, dep: &RawDependency) -> Option<i64> {
        // Exact qualified match first, then bare name, then last segment
        if let Some(symbol) = ctx
            .symbols
            .iter()
            .find(|s| s.qualified_name.as_deref() == Some(dep.from_symbol.as_str()))
        {
            return Some(symbol.id);
        }
        if let Some(symbol) = ctx.symbol_named(&dep.from_symbol) {
            return Some(symbol.id);
        }
        let last = dep.from_symbol.rsplit(['\\', '.', ':']).next()?;
        ctx.symbol_named(last).map(|s| s.id)
    }

    /// Resolve every raw dependency of one file. Per-file temporary state
    /// (the C# field-type map) lives only for the duration of this call.
    pub fn resolve_file(&self, ctx: &FileContext) -> Vec<ResolutionOutcome> {
        let field_types = match ctx.language() {
            Some(Language::CSharp) => csharp::build_field_type_map(ctx),
            _ => HashMap::new(),
        };

        ctx.dependencies
            .iter()
            .map(|dep| self.resolve_with_state(ctx, dep, &field_types))
            .collect()
    }

    /// Resolve one raw dependency. Convenient for tests; `resolve_file` is
    /// the production entry point.
    pub fn resolve(&self, ctx: &FileContext, dep: &RawDependency) -> Option<Resolution> {
        let field_types = match ctx.language() {
            Some(Language::CSharp) => csharp::build_field_type_map(ctx),
            _ => HashMap::new(),
        };
        match self.resolve_with_state(ctx, dep, &field_types) {
            ResolutionOutcome::Resolved(resolution) => Some(resolution),
            _ => None,
        }
    }

    fn resolve_with_state(
        &self,
        ctx: &FileContext,
        dep: &RawDependency,
        field_types: &HashMap<String, String>,
    ) -> ResolutionOutcome {
        let outcome = match ctx.language() {
            Some(Language::Php) => php::resolve(self, ctx, dep),
            Some(Language::CSharp) => csharp::resolve(self, ctx, dep, field_types),
            Some(Language::JavaScript) | Some(Language::TypeScript) | Some(Language::Vue) => {
                javascript::resolve(self, ctx, dep)
            }
            _ => LanguageOutcome::Continue,
        };

        match outcome {
            LanguageOutcome::Resolved(resolution) => ResolutionOutcome::Resolved(resolution),
            LanguageOutcome::Unresolved => {
                debug!(
                    "unresolved (vetoed): {} -> {} in {}",
                    dep.from_symbol,
                    dep.target,
                    ctx.file.path.display()
                );
                ResolutionOutcome::Vetoed
            }
            LanguageOutcome::Continue => match self.resolve_common(ctx, dep) {
                Some(resolution) => ResolutionOutcome::Resolved(resolution),
                None => {
                    debug!(
                        "unresolved: {} -> {} in {}",
                        dep.from_symbol,
                        dep.target,
                        ctx.file.path.display()
                    );
                    ResolutionOutcome::Miss
                }
            },
        }
    }

    /// Common fallback chain for plain (undotted) targets.
    fn resolve_common(&self, ctx: &FileContext, dep: &RawDependency) -> Option<Resolution> {
        let target = dep.target.as_str();
        if target.contains('.') || target.contains("::") {
            return None;
        }

        // 2. Local scope
        if let Some(symbol) = ctx
            .symbols
            .iter()
            .find(|s| s.name == target && s.kind != SymbolKind::Namespace)
        {
            return Some(Resolution::of(symbol, Strategy::LocalScope));
        }

        // 3. Import-mediated
        if let Some(resolution) = self.resolve_via_imports(ctx, target) {
            return Some(resolution);
        }

        // 4. Single global export
        let exported = self.exported_named(target);
        if exported.len() == 1 {
            return Some(Resolution::of(exported[0], Strategy::SingleExport));
        }

        // 5. Framework/external registry, hinted by the import source
        self.resolve_via_registry(ctx, target)
    }

    fn resolve_via_imports(&self, ctx: &FileContext, target: &str) -> Option<Resolution> {
        let import = ctx
            .imports
            .iter()
            .find(|i| i.imported_names.iter().any(|n| n == target))?;

        // A path resolver disambiguates between multiple exporters
        if self.paths.looks_resolvable(&import.source) {
            match self.paths.resolve(&import.source, &ctx.file.path) {
                Some(resolved_path) => {
                    let target_ctx = self.context_for_path(&resolved_path)?;
                    let symbol = target_ctx
                        .symbols
                        .iter()
                        .find(|s| s.name == target && s.is_exported)
                        .or_else(|| target_ctx.symbol_named(target))?;
                    return Some(Resolution::of(symbol, Strategy::Import));
                }
                None => {
                    // Path-shaped specifier that resolves nowhere in-repo:
                    // accepting an arbitrary exporter would fabricate edges
                    let exporters = self.exported_named(target);
                    if exporters.len() == 1 {
                        return Some(Resolution::of(exporters[0], Strategy::Import));
                    }
                    if exporters.len() > 1 {
                        warn!(
                            "ambiguous import of '{}' in {}: {} exporters, no path resolution",
                            target,
                            ctx.file.path.display(),
                            exporters.len()
                        );
                    }
                    return None;
                }
            }
        }

        let exporters = self.exported_named(target);
        match exporters.len() {
            0 => None,
            1 => Some(Resolution::of(exporters[0], Strategy::Import)),
            _ => {
                // Deterministic: contexts are ordered by path, so the first
                // exporter is stable across runs
                warn!(
                    "ambiguous import of '{}' in {}: taking first of {} exporters",
                    target,
                    ctx.file.path.display(),
                    exporters.len()
                );
                Some(Resolution::of(exporters[0], Strategy::Import))
            }
        }
    }

    fn resolve_via_registry(&self, ctx: &FileContext, target: &str) -> Option<Resolution> {
        // External-library context: a non-path import that binds the target
        let source_hint = ctx
            .imports
            .iter()
            .find(|i| {
                i.imported_names.iter().any(|n| n == target)
                    && !self.paths.looks_resolvable(&i.source)
            })
            .map(|i| i.source.as_str());

        let entry = match (source_hint, ctx.language()) {
            (Some(source), _) => self.registry.lookup(target, source)?,
            // PHP helpers carry no import; try the framework hints in order
            (None, Some(Language::Php)) => self
                .registry
                .lookup(target, "laravel")
                .or_else(|| self.registry.lookup(target, "php"))?,
            _ => return None,
        };

        Some(Resolution {
            symbol_id: entry.synthetic_id(),
            to_qualified_name: None,
            strategy: Strategy::Framework,
        })
    }
}
