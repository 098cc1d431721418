//! JavaScript/TypeScript resolution strategy: dotted member targets through
//! imports, store factories, and local objects
//!
//! Dotted targets try, in order: a direct import of the receiver (resolved to
//! its file by path probing), the reactive-store factory convention
//! (`useXxxStore` imported → `xxxStore.method` lands in the store's
//! declaration file), then an object declared locally. Plain targets defer to
//! the common fallback chain.

use super::{FileContext, LanguageOutcome, Resolution, Strategy, SymbolResolver};
use crate::parser::{RawDependency, SymbolKind};
use crate::store::SymbolRecord;

pub(crate) fn resolve(
    resolver: &SymbolResolver,
    ctx: &FileContext,
    dep: &RawDependency,
) -> LanguageOutcome {
    // Template-level API calls carry HTTP context for higher layers and are
    // not symbol references
    if dep.parameter_context.is_some() {
        return LanguageOutcome::Unresolved;
    }

    let Some((receiver, method)) = dep.target.split_once('.') else {
        return LanguageOutcome::Continue;
    };
    if method.contains('.') {
        // Chained receivers are not resolvable without type information
        return LanguageOutcome::Unresolved;
    }

    // (i) Direct import of the receiver
    if let Some(import) = ctx
        .imports
        .iter()
        .find(|i| i.imported_names.iter().any(|n| n == receiver))
    {
        if resolver.path_resolver().looks_resolvable(&import.source) {
            if let Some(path) = resolver.path_resolver().resolve(&import.source, &ctx.file.path) {
                if let Some(target_ctx) = resolver.context_for_path(&path) {
                    if let Some(symbol) = find_member(target_ctx, receiver, method) {
                        return LanguageOutcome::Resolved(Resolution {
                            symbol_id: symbol.id,
                            to_qualified_name: symbol.qualified_name.clone(),
                            strategy: Strategy::Import,
                        });
                    }
                }
            }
            // The receiver is known but the member is not: guessing would
            // fabricate an edge
            return LanguageOutcome::Unresolved;
        }

        // External-library receiver: consult the registry under the library's name
        if let Some(entry) = resolver.registry.lookup(method, &import.source) {
            return LanguageOutcome::Resolved(Resolution {
                symbol_id: entry.synthetic_id(),
                to_qualified_name: None,
                strategy: Strategy::Framework,
            });
        }
        return LanguageOutcome::Unresolved;
    }

    // (ii) Store-factory pattern
    if let Some(resolution) = resolve_store_factory(resolver, ctx, receiver, method) {
        return LanguageOutcome::Resolved(resolution);
    }

    // (iii) Object declared locally with a member of that name
    if ctx.symbol_named(receiver).is_some() {
        if let Some(symbol) = find_member(ctx, receiver, method) {
            return LanguageOutcome::Resolved(Resolution {
                symbol_id: symbol.id,
                to_qualified_name: symbol.qualified_name.clone(),
                strategy: Strategy::LocalScope,
            });
        }
    }

    LanguageOutcome::Unresolved
}

/// `areasStore.getAreas()` with `useAreasStore` imported: locate the store's
/// declaration file by import path or by the `xxxStore.*` / `stores/xxx.*`
/// filename convention, then find the method there.
fn resolve_store_factory(
    resolver: &SymbolResolver,
    ctx: &FileContext,
    receiver: &str,
    method: &str,
) -> Option<Resolution> {
    if !receiver.ends_with("Store") && !receiver.ends_with("store") {
        return None;
    }

    let factory = factory_name(receiver);
    let import = ctx
        .imports
        .iter()
        .find(|i| i.imported_names.iter().any(|n| n == &factory))?;

    let store_ctx = resolver
        .path_resolver()
        .resolve(&import.source, &ctx.file.path)
        .and_then(|path| resolver.context_for_path(&path))
        .or_else(|| find_store_file(resolver, receiver))?;

    let symbol = store_ctx
        .symbols
        .iter()
        .find(|s| matches!(s.kind, SymbolKind::Method | SymbolKind::Function) && s.name == method)?;

    Some(Resolution {
        symbol_id: symbol.id,
        to_qualified_name: symbol.qualified_name.clone(),
        strategy: Strategy::Import,
    })
}

/// `areasStore` → `useAreasStore`
fn factory_name(receiver: &str) -> String {
    let mut chars = receiver.chars();
    match chars.next() {
        Some(first) => format!("use{}{}", first.to_uppercase(), chars.as_str()),
        None => String::new(),
    }
}

/// Locate a store declaration file: `areasStore.*` anywhere, or
/// `stores/areas.*`.
fn find_store_file<'a>(
    resolver: &'a SymbolResolver,
    receiver: &str,
) -> Option<&'a FileContext> {
    let base = receiver
        .strip_suffix("Store")
        .or_else(|| receiver.strip_suffix("store"))
        .unwrap_or(receiver);

    resolver.contexts().iter().find(|candidate| {
        let Some(stem) = candidate.file.path.file_stem().and_then(|s| s.to_str()) else {
            return false;
        };
        if stem == receiver {
            return true;
        }
        let in_stores_dir = candidate
            .file
            .path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            == Some("stores");
        in_stores_dir && stem.eq_ignore_ascii_case(base)
    })
}

/// A member of `owner` declared in `ctx`: prefer the qualified
/// `owner.member` symbol, fall back to any function-like symbol of that name.
fn find_member<'a>(
    ctx: &'a FileContext,
    owner: &str,
    member: &str,
) -> Option<&'a SymbolRecord> {
    let qualified = format!("{}.{}", owner, member);
    ctx.symbols
        .iter()
        .find(|s| s.qualified_name.as_deref() == Some(qualified.as_str()))
        .or_else(|| {
            ctx.symbols.iter().find(|s| {
                matches!(s.kind, SymbolKind::Method | SymbolKind::Function) && s.name == member
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_name() {
        assert_eq!(factory_name("areasStore"), "useAreasStore");
        assert_eq!(factory_name("cartStore"), "useCartStore");
    }
}
