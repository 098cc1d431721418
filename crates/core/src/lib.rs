//! Compass Core - Repository Dependency-Graph Analysis Engine
//!
//! This crate provides the analysis pipeline behind Compass:
//! - File discovery with ignore rules and language classification
//! - Per-language syntactic parsing (JS/TS, Vue, PHP, C#, Godot data files)
//!   into an intermediate symbol/dependency form
//! - A two-phase symbol resolver turning textual references into graph edges
//! - File and symbol graph assembly persisted to a relational store
//! - Incremental re-analysis driven by modification times and content hashes

pub mod config;
pub mod discovery;
pub mod framework;
pub mod graph;
pub mod incremental;
pub mod language;
pub mod parser;
pub mod pipeline;
pub mod resolver;
pub mod store;

pub use config::AnalysisConfig;
pub use discovery::{discover_files, WalkedFile};
pub use framework::{
    detect_frameworks, CrossStackDecision, Framework, FrameworkDetection, FrameworkEntityKind,
};
pub use graph::{FileGraph, FileGraphBuilder, SymbolGraphBuilder, SymbolGraphStats};
pub use incremental::{IncrementalPlan, PassMode};
pub use language::Language;
pub use parser::{
    DependencyKind, ImportKind, LanguageParser, ParseError, ParseResult, ParserDispatcher,
    RawDependency, Severity, Symbol, SymbolKind, Visibility,
};
pub use pipeline::{AnalysisPipeline, AnalysisSummary, PassStatus};
pub use resolver::{FileContext, Resolution, ResolutionOutcome, Strategy, SymbolResolver};
pub use store::{AnalysisStore, SqliteStore, StoreError};

/// Compass version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
