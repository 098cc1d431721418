//! Symbol dependency graph assembly
//!
//! Walks every file context's raw dependencies through the resolver and
//! materializes edge rows. A resolver miss with exactly one name-index
//! candidate is admitted as a low-priority edge for `calls` dependencies
//! (logged); a resolver veto admits nothing. Deduplication key includes the
//! line so distinct call sites survive: `(from, to, kind, line)`. Self-edges
//! are kept only for `calls`.

use crate::parser::DependencyKind;
use crate::resolver::{ResolutionOutcome, SymbolResolver};
use crate::store::NewSymbolEdge;
use std::collections::HashSet;
use tracing::debug;

/// Counters reported in the pass summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SymbolGraphStats {
    pub resolved: usize,
    pub fallback: usize,
    pub vetoed: usize,
    pub unresolved: usize,
    /// Dependencies whose anchor did not map to a symbol
    pub unanchored: usize,
}

/// Assembles symbol-graph edge rows from resolver output.
pub struct SymbolGraphBuilder<'a, 'b> {
    resolver: &'a SymbolResolver<'b>,
}

impl<'a, 'b> SymbolGraphBuilder<'a, 'b> {
    pub fn new(resolver: &'a SymbolResolver<'b>) -> Self {
        Self { resolver }
    }

    pub fn build(&self) -> (Vec<NewSymbolEdge>, SymbolGraphStats) {
        let mut edges = Vec::new();
        let mut stats = SymbolGraphStats::default();
        let mut seen: HashSet<(i64, i64, DependencyKind, usize)> = HashSet::new();

        for ctx in self.resolver.contexts() {
            let outcomes = self.resolver.resolve_file(ctx);

            for (dep, outcome) in ctx.dependencies.iter().zip(outcomes) {
                let Some(from_id) = self.resolver.from_symbol_id(ctx, dep) else {
                    stats.unanchored += 1;
                    debug!(
                        "no anchor symbol for '{}' in {}",
                        dep.from_symbol,
                        ctx.file.path.display()
                    );
                    continue;
                };

                let resolution = match outcome {
                    ResolutionOutcome::Resolved(resolution) => {
                        stats.resolved += 1;
                        Some((resolution.symbol_id, resolution.to_qualified_name))
                    }
                    ResolutionOutcome::Vetoed => {
                        stats.vetoed += 1;
                        None
                    }
                    ResolutionOutcome::Miss => {
                        // Low-priority fallback: a unique name-index candidate
                        // for a call is better evidence than nothing
                        let fallback = self.single_candidate_fallback(dep);
                        if fallback.is_none() {
                            stats.unresolved += 1;
                        } else {
                            stats.fallback += 1;
                        }
                        fallback
                    }
                };

                let Some((to_id, to_qualified_name)) = resolution else {
                    continue;
                };

                // Self-edges only make sense for recursion
                if to_id == from_id && dep.kind != DependencyKind::Calls {
                    continue;
                }

                if !seen.insert((from_id, to_id, dep.kind, dep.line)) {
                    continue;
                }

                edges.push(NewSymbolEdge {
                    from_symbol_id: from_id,
                    to_symbol_id: Some(to_id),
                    to_qualified_name,
                    kind: dep.kind,
                    line: dep.line,
                    parameter_context: dep.parameter_context.clone(),
                    parameter_types: if dep.parameter_types.is_empty() {
                        None
                    } else {
                        Some(dep.parameter_types.join(","))
                    },
                });
            }
        }

        (edges, stats)
    }

    fn single_candidate_fallback(
        &self,
        dep: &crate::parser::RawDependency,
    ) -> Option<(i64, Option<String>)> {
        if dep.kind != DependencyKind::Calls {
            return None;
        }
        if dep.target.contains('.') || dep.target.contains("::") {
            return None;
        }

        let candidates = self.resolver.symbols_named(&dep.target);
        if candidates.len() != 1 {
            return None;
        }

        let symbol = candidates[0];
        debug!(
            "single-candidate fallback: {} -> {} (id {})",
            dep.from_symbol, dep.target, symbol.id
        );
        Some((symbol.id, symbol.qualified_name.clone()))
    }
}
