//! Language parsers producing the intermediate symbol/dependency form
//!
//! Each parser converts `(path, source)` into a [`ParseResult`]: declared
//! symbols, raw textual dependencies, imports, exports, and diagnostics.
//! Parsers are stateless and never consult the store; turning raw
//! dependencies into graph edges is the resolver's job.

pub mod csharp;
pub mod godot;
pub mod php;
pub mod typescript;
pub mod vue;

use crate::framework::FrameworkEntityDraft;
use crate::language::Language;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Error types for parsing operations
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Tree-sitter error: {0}")]
    TreeSitter(String),
}

/// The kind of declared entity a symbol represents. Closed set; parsers for
/// new languages map onto it rather than inventing strings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Interface,
    Trait,
    Enum,
    Property,
    Variable,
    Constant,
    Namespace,
    Component,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
            SymbolKind::Trait => "trait",
            SymbolKind::Enum => "enum",
            SymbolKind::Property => "property",
            SymbolKind::Variable => "variable",
            SymbolKind::Constant => "constant",
            SymbolKind::Namespace => "namespace",
            SymbolKind::Component => "component",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "function" => Some(SymbolKind::Function),
            "method" => Some(SymbolKind::Method),
            "class" => Some(SymbolKind::Class),
            "interface" => Some(SymbolKind::Interface),
            "trait" => Some(SymbolKind::Trait),
            "enum" => Some(SymbolKind::Enum),
            "property" => Some(SymbolKind::Property),
            "variable" => Some(SymbolKind::Variable),
            "constant" => Some(SymbolKind::Constant),
            "namespace" => Some(SymbolKind::Namespace),
            "component" => Some(SymbolKind::Component),
            _ => None,
        }
    }
}

/// The relationship a raw dependency asserts between two symbols.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    Calls,
    References,
    Inherits,
    Implements,
    Imports,
}

impl DependencyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyKind::Calls => "calls",
            DependencyKind::References => "references",
            DependencyKind::Inherits => "inherits",
            DependencyKind::Implements => "implements",
            DependencyKind::Imports => "imports",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "calls" => Some(DependencyKind::Calls),
            "references" => Some(DependencyKind::References),
            "inherits" => Some(DependencyKind::Inherits),
            "implements" => Some(DependencyKind::Implements),
            "imports" => Some(DependencyKind::Imports),
            _ => None,
        }
    }
}

/// How an import binds names from its source module.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ImportKind {
    Named,
    Default,
    Namespace,
    SideEffect,
}

impl ImportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportKind::Named => "named",
            ImportKind::Default => "default",
            ImportKind::Namespace => "namespace",
            ImportKind::SideEffect => "side_effect",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "named" => Some(ImportKind::Named),
            "default" => Some(ImportKind::Default),
            "namespace" => Some(ImportKind::Namespace),
            "side_effect" => Some(ImportKind::SideEffect),
            _ => None,
        }
    }
}

/// Declared visibility; languages without modifiers default to public.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "public" => Some(Visibility::Public),
            "protected" => Some(Visibility::Protected),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }
}

/// Diagnostic severity; an `Error` suppresses persistence of the file's symbols.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A named, declared entity anchored to a line range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// 1-based
    pub start_line: usize,
    /// 1-based, inclusive
    pub end_line: usize,
    pub is_exported: bool,
    pub visibility: Visibility,
    pub signature: Option<String>,
    /// Globally addressable name when the language has one
    /// (`Ns\Cls::method` in PHP, `Ns.Cls.Method` in C#).
    pub qualified_name: Option<String>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, start_line: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            start_line,
            end_line: start_line,
            is_exported: false,
            visibility: Visibility::Public,
            signature: None,
            qualified_name: None,
        }
    }
}

/// An import statement as the parser observed it; no path resolution here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Import {
    /// Raw specifier as written (`./utils`, `App\Models\User`, `System.IO`)
    pub source: String,
    pub kind: ImportKind,
    pub imported_names: Vec<String>,
    pub line: usize,
}

/// A name this file makes visible to other files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Export {
    pub name: String,
    pub line: usize,
    pub kind: ExportKind,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExportKind {
    Named,
    Default,
    ReExport,
}

/// A parser's unresolved textual record of a reference from one symbol to
/// another name. The resolver turns these into edges or drops them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawDependency {
    /// Name of the enclosing symbol (qualified where the language allows)
    pub from_symbol: String,
    /// Textual target, possibly dotted or `Class::method`
    pub target: String,
    pub kind: DependencyKind,
    pub line: usize,
    /// Receiver class when the parser could locally type an instance call
    pub resolved_class: Option<String>,
    /// Receiver expression for instance calls (`$file`, `this`)
    pub calling_object: Option<String>,
    /// Extra binding context, e.g. `field_call_<fieldName>` for C#
    pub qualified_context: Option<String>,
    /// Free-form context consumed by downstream layers (e.g. HTTP method + URL)
    pub parameter_context: Option<String>,
    /// Literal argument types where syntactically visible
    pub parameter_types: Vec<String>,
    /// Distinguishes multiple calls to the same target on one line
    pub call_instance_id: Option<String>,
}

impl RawDependency {
    pub fn new(
        from_symbol: impl Into<String>,
        target: impl Into<String>,
        kind: DependencyKind,
        line: usize,
    ) -> Self {
        Self {
            from_symbol: from_symbol.into(),
            target: target.into(),
            kind,
            line,
            resolved_class: None,
            calling_object: None,
            qualified_context: None,
            parameter_context: None,
            parameter_types: Vec::new(),
            call_instance_id: None,
        }
    }

    /// True when this dependency is anchored to `name`, matching either the
    /// full anchor or its last `\`/`.`-separated segment.
    pub fn from_symbol_matches(&self, name: &str) -> bool {
        if self.from_symbol == name {
            return true;
        }
        self.from_symbol
            .rsplit(['\\', '.'])
            .next()
            .is_some_and(|last| last == name)
    }
}

/// A syntax/timeout/encoding problem found while parsing one file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParseDiagnostic {
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub severity: Severity,
}

impl ParseDiagnostic {
    pub fn error(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
            severity: Severity::Error,
        }
    }

    pub fn warning(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
            severity: Severity::Warning,
        }
    }
}

/// Everything a parser produced for one file.
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    pub path: PathBuf,
    pub language: Option<Language>,
    pub symbols: Vec<Symbol>,
    pub dependencies: Vec<RawDependency>,
    pub imports: Vec<Import>,
    pub exports: Vec<Export>,
    pub errors: Vec<ParseDiagnostic>,
    /// Entities emitted by data parsers (Godot scenes, autoloads)
    pub framework_entities: Vec<FrameworkEntityDraft>,
}

impl ParseResult {
    pub fn new(path: &Path, language: Language) -> Self {
        Self {
            path: path.to_path_buf(),
            language: Some(language),
            ..Default::default()
        }
    }

    /// Any error-severity diagnostic suppresses persistence of symbols.
    pub fn has_fatal_errors(&self) -> bool {
        self.errors.iter().any(|e| e.severity == Severity::Error)
    }
}

/// Per-call options handed to parsers.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub chunking_threshold: usize,
    pub chunk_overlap_lines: usize,
    pub parse_timeout: Duration,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            chunking_threshold: 512 * 1024,
            chunk_overlap_lines: 50,
            parse_timeout: Duration::from_secs(30),
        }
    }
}

/// Trait for language-specific parsers
///
/// Implementations must be deterministic and free of shared mutable state so
/// the dispatcher can fan files out across threads.
pub trait LanguageParser: Send + Sync {
    /// Languages this parser accepts
    fn languages(&self) -> &[Language];

    /// Parse source text into the intermediate form. Syntax errors are
    /// reported through `ParseResult::errors`, never by failing the call;
    /// `Err` is reserved for infrastructure faults (grammar load).
    fn parse(
        &self,
        path: &Path,
        source: &str,
        options: &ParseOptions,
    ) -> Result<ParseResult, ParseError>;
}

/// Dispatcher that routes files to the appropriate language parser
pub struct ParserDispatcher {
    parsers: Vec<Box<dyn LanguageParser>>,
}

impl ParserDispatcher {
    /// Create a new parser dispatcher with default parsers
    pub fn new() -> Self {
        Self {
            parsers: vec![
                Box::new(typescript::TypeScriptParser::new()),
                Box::new(vue::VueParser::new()),
                Box::new(php::PhpParser::new()),
                Box::new(csharp::CSharpParser::new()),
                Box::new(godot::GodotParser::new()),
            ],
        }
    }

    /// Create a dispatcher with custom parsers
    pub fn with_parsers(parsers: Vec<Box<dyn LanguageParser>>) -> Self {
        Self { parsers }
    }

    /// Find a parser for the given language
    pub fn find_parser(&self, language: Language) -> Option<&dyn LanguageParser> {
        self.parsers
            .iter()
            .find(|parser| parser.languages().contains(&language))
            .map(|boxed| &**boxed)
    }

    /// Parse one file, chunking oversized input.
    ///
    /// Chunked parses must produce the same symbol identities (name + start
    /// line) as a whole-file parse; overlap only prevents declarations from
    /// being cut at a boundary.
    pub fn parse_file(
        &self,
        path: &Path,
        language: Language,
        source: &str,
        options: &ParseOptions,
    ) -> Result<ParseResult, ParseError> {
        let parser = self
            .find_parser(language)
            .ok_or_else(|| ParseError::UnsupportedLanguage(language.tag().to_string()))?;

        if source.len() <= options.chunking_threshold || language.is_data_format() {
            return parser.parse(path, source, options);
        }

        let chunks = split_into_chunks(source, options.chunking_threshold, options.chunk_overlap_lines);
        let mut merged = ParseResult::new(path, language);

        for chunk in chunks {
            let mut result = parser.parse(path, &chunk.text, options)?;
            offset_lines(&mut result, chunk.start_line);
            merge_chunk(&mut merged, result);
        }

        merged.symbols.sort_by_key(|s| s.start_line);
        Ok(merged)
    }

    /// Parse many files, optionally in parallel, returning results ordered by
    /// path so downstream tie-breaks are reproducible.
    pub fn parse_files(
        &self,
        files: &[(PathBuf, Language, String)],
        options: &ParseOptions,
        parallel: bool,
        cancel: &Arc<AtomicBool>,
    ) -> Vec<ParseResult> {
        let parse_one = |(path, language, source): &(PathBuf, Language, String)| -> Option<ParseResult> {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            let started = std::time::Instant::now();
            let mut result = match self.parse_file(path, *language, source, options) {
                Ok(r) => r,
                Err(e) => {
                    let mut r = ParseResult::new(path, *language);
                    r.errors.push(ParseDiagnostic::error(e.to_string(), 0, 0));
                    r
                }
            };
            if started.elapsed() > options.parse_timeout {
                warn!("parse of {} exceeded timeout", path.display());
                result.errors.push(ParseDiagnostic::error(
                    format!("parse exceeded {:?} timeout", options.parse_timeout),
                    0,
                    0,
                ));
            }
            Some(result)
        };

        let mut results: Vec<ParseResult> = if parallel {
            files.par_iter().filter_map(parse_one).collect()
        } else {
            files.iter().filter_map(parse_one).collect()
        };

        results.sort_by(|a, b| a.path.cmp(&b.path));
        results
    }
}

impl Default for ParserDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

// ── Chunking ────────────────────────────────────────────────────────────────

struct Chunk {
    /// 0-based line offset of the chunk within the whole file
    start_line: usize,
    text: String,
}

/// Split source at line boundaries into chunks of roughly `threshold` bytes,
/// with `overlap` trailing lines repeated at the head of the next chunk.
fn split_into_chunks(source: &str, threshold: usize, overlap: usize) -> Vec<Chunk> {
    let lines: Vec<&str> = source.lines().collect();
    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < lines.len() {
        let mut size = 0usize;
        let mut end = start;
        while end < lines.len() && (size <= threshold || end == start) {
            size += lines[end].len() + 1;
            end += 1;
        }

        let text = lines[start..end].join("\n");
        chunks.push(Chunk {
            start_line: start,
            text,
        });

        if end >= lines.len() {
            break;
        }
        start = end.saturating_sub(overlap).max(start + 1);
    }

    chunks
}

fn offset_lines(result: &mut ParseResult, offset: usize) {
    for s in &mut result.symbols {
        s.start_line += offset;
        s.end_line += offset;
    }
    for d in &mut result.dependencies {
        d.line += offset;
    }
    for i in &mut result.imports {
        i.line += offset;
    }
    for e in &mut result.exports {
        e.line += offset;
    }
    for e in &mut result.errors {
        e.line += offset;
    }
}

/// Merge a chunk's output, deduplicating entities that fell in the overlap
/// region by their identity (name + line).
fn merge_chunk(merged: &mut ParseResult, chunk: ParseResult) {
    for symbol in chunk.symbols {
        if !merged
            .symbols
            .iter()
            .any(|s| s.name == symbol.name && s.start_line == symbol.start_line)
        {
            merged.symbols.push(symbol);
        }
    }
    for dep in chunk.dependencies {
        if !merged.dependencies.iter().any(|d| {
            d.target == dep.target && d.line == dep.line && d.from_symbol == dep.from_symbol
        }) {
            merged.dependencies.push(dep);
        }
    }
    for import in chunk.imports {
        if !merged
            .imports
            .iter()
            .any(|i| i.source == import.source && i.line == import.line)
        {
            merged.imports.push(import);
        }
    }
    for export in chunk.exports {
        if !merged
            .exports
            .iter()
            .any(|e| e.name == export.name && e.line == export.line)
        {
            merged.exports.push(export);
        }
    }
    merged.errors.extend(chunk.errors);
    merged.framework_entities.extend(chunk.framework_entities);
}

// ── Shared tree-sitter helpers ──────────────────────────────────────────────

pub(crate) fn node_text(node: &tree_sitter::Node, source: &str) -> Option<String> {
    node.utf8_text(source.as_bytes())
        .ok()
        .map(|s| s.to_string())
}

pub(crate) fn node_name(node: &tree_sitter::Node, source: &str) -> Option<String> {
    node.child_by_field_name("name")
        .and_then(|n| node_text(&n, source))
}

pub(crate) fn find_child_by_kind<'a>(
    node: &tree_sitter::Node<'a>,
    kind: &str,
) -> Option<tree_sitter::Node<'a>> {
    let mut cursor = node.walk();
    let result = node.children(&mut cursor).find(|c| c.kind() == kind);
    result
}

/// Collect ERROR/MISSING nodes from a parse tree as diagnostics.
pub(crate) fn collect_syntax_errors(
    tree: &tree_sitter::Tree,
    diagnostics: &mut Vec<ParseDiagnostic>,
) {
    if !tree.root_node().has_error() {
        return;
    }
    let mut cursor = tree.root_node().walk();
    collect_error_nodes(&mut cursor, diagnostics);
}

fn collect_error_nodes(cursor: &mut tree_sitter::TreeCursor, diagnostics: &mut Vec<ParseDiagnostic>) {
    let node = cursor.node();
    if node.is_error() || node.is_missing() {
        let pos = node.start_position();
        diagnostics.push(ParseDiagnostic {
            message: if node.is_missing() {
                format!("missing {}", node.kind())
            } else {
                "syntax error".to_string()
            },
            line: pos.row + 1,
            column: pos.column + 1,
            severity: Severity::Warning,
        });
        return;
    }
    if !node.has_error() {
        return;
    }
    if cursor.goto_first_child() {
        loop {
            collect_error_nodes(cursor, diagnostics);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
        cursor.goto_parent();
    }
}
