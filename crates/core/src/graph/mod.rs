//! Graph assembly: file-level and symbol-level edge materialization
//!
//! The assemblers turn captured imports and resolver output into
//! deduplicated edge rows ready for the store, and expose pure read-only
//! queries (cycles, depth) over the file graph for downstream tools.

pub mod file_graph;
pub mod symbol_graph;

pub use file_graph::{FileGraph, FileGraphBuilder};
pub use symbol_graph::{SymbolGraphBuilder, SymbolGraphStats};
