//! File dependency graph assembly and queries
//!
//! Materializes file→file edges from captured imports: JS/TS/Vue specifiers
//! resolve through path probing, PHP use statements through the PSR-4
//! autoloader. Unresolved specifiers and external modules produce no edge.
//! Deduplication key: `(from_file, to_file, kind)`.

use crate::language::Language;
use crate::resolver::autoloader::Psr4Autoloader;
use crate::resolver::paths::ModulePathResolver;
use crate::resolver::FileContext;
use crate::store::{FileRecord, NewFileEdge};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use tracing::debug;

/// Builds file-graph edge rows from per-file import records.
pub struct FileGraphBuilder<'a> {
    paths: &'a ModulePathResolver,
    autoloader: &'a Psr4Autoloader,
}

impl<'a> FileGraphBuilder<'a> {
    pub fn new(paths: &'a ModulePathResolver, autoloader: &'a Psr4Autoloader) -> Self {
        Self { paths, autoloader }
    }

    /// Resolve every import of every context to an in-repo file edge.
    pub fn build(&self, contexts: &[FileContext]) -> Vec<NewFileEdge> {
        let file_ids: HashMap<PathBuf, i64> = contexts
            .iter()
            .map(|ctx| (ctx.file.path.clone(), ctx.file.id))
            .collect();

        let mut seen = HashSet::new();
        let mut edges = Vec::new();

        for ctx in contexts {
            for import in &ctx.imports {
                let Some(target_path) = self.resolve_import(ctx, &import.source) else {
                    continue;
                };
                let Some(&to_file_id) = file_ids.get(&target_path) else {
                    continue;
                };
                if to_file_id == ctx.file.id {
                    continue;
                }

                if seen.insert((ctx.file.id, to_file_id, import.kind)) {
                    edges.push(NewFileEdge {
                        from_file_id: ctx.file.id,
                        to_file_id,
                        kind: import.kind,
                        line: import.line,
                    });
                } else {
                    debug!(
                        "duplicate file edge collapsed: {} -> {}",
                        ctx.file.path.display(),
                        target_path.display()
                    );
                }
            }
        }

        edges
    }

    fn resolve_import(&self, ctx: &FileContext, specifier: &str) -> Option<PathBuf> {
        match ctx.language() {
            Some(Language::Php) => {
                // `use App\Models\User` resolves through the autoloader
                self.autoloader.resolve(specifier)
            }
            Some(Language::CSharp) => {
                // Namespace usings do not name files
                None
            }
            _ => {
                if !self.paths.looks_resolvable(specifier) {
                    return None; // built-in or external module
                }
                self.paths.resolve(specifier, &ctx.file.path)
            }
        }
    }
}

/// Read-only file graph over persisted edges. Queries are pure functions of
/// the edge set; nothing here touches the store's write path.
pub struct FileGraph {
    graph: DiGraph<i64, ()>,
    nodes: HashMap<i64, NodeIndex>,
}

impl FileGraph {
    pub fn new(files: &[FileRecord], edges: &[(i64, i64)]) -> Self {
        let mut graph = DiGraph::new();
        let mut nodes = HashMap::new();

        for file in files {
            let idx = graph.add_node(file.id);
            nodes.insert(file.id, idx);
        }
        for (from, to) in edges {
            if let (Some(&a), Some(&b)) = (nodes.get(from), nodes.get(to)) {
                graph.add_edge(a, b, ());
            }
        }

        Self { graph, nodes }
    }

    /// Import cycles: strongly connected components with more than one file,
    /// plus direct self-loops.
    pub fn cycles(&self) -> Vec<Vec<i64>> {
        petgraph::algo::tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|&n| self.graph.find_edge(n, n).is_some())
            })
            .map(|component| component.into_iter().map(|idx| self.graph[idx]).collect())
            .collect()
    }

    /// BFS depth of every file reachable from `from`, following imports.
    pub fn depth_from(&self, from: i64) -> HashMap<i64, usize> {
        let mut depths = HashMap::new();
        let Some(&start) = self.nodes.get(&from) else {
            return depths;
        };

        let mut queue = VecDeque::new();
        depths.insert(from, 0);
        queue.push_back(start);

        while let Some(node) = queue.pop_front() {
            let depth = depths[&self.graph[node]];
            for edge in self.graph.edges(node) {
                let target_id = self.graph[edge.target()];
                if let std::collections::hash_map::Entry::Vacant(entry) = depths.entry(target_id) {
                    entry.insert(depth + 1);
                    queue.push_back(edge.target());
                }
            }
        }

        depths
    }

    /// Files that import `file` directly.
    pub fn direct_importers(&self, file: i64) -> Vec<i64> {
        let Some(&idx) = self.nodes.get(&file) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, petgraph::Direction::Incoming)
            .map(|edge| self.graph[edge.source()])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(id: i64) -> FileRecord {
        FileRecord {
            id,
            repository_id: 1,
            path: PathBuf::from(format!("/repo/f{id}.ts")),
            language: "typescript".to_string(),
            size: 0,
            last_modified: 0,
            content_hash: None,
            is_test: false,
            is_generated: false,
        }
    }

    #[test]
    fn test_cycle_detection() {
        let files = vec![file(1), file(2), file(3)];
        let graph = FileGraph::new(&files, &[(1, 2), (2, 1), (2, 3)]);
        let cycles = graph.cycles();
        assert_eq!(cycles.len(), 1);
        let mut cycle = cycles[0].clone();
        cycle.sort();
        assert_eq!(cycle, vec![1, 2]);
    }

    #[test]
    fn test_depth_query() {
        let files = vec![file(1), file(2), file(3)];
        let graph = FileGraph::new(&files, &[(1, 2), (2, 3)]);
        let depths = graph.depth_from(1);
        assert_eq!(depths.get(&1), Some(&0));
        assert_eq!(depths.get(&2), Some(&1));
        assert_eq!(depths.get(&3), Some(&2));
    }

    #[test]
    fn test_direct_importers() {
        let files = vec![file(1), file(2), file(3)];
        let graph = FileGraph::new(&files, &[(1, 3), (2, 3)]);
        let mut importers = graph.direct_importers(3);
        importers.sort();
        assert_eq!(importers, vec![1, 2]);
    }
}
