//! C# resolution strategy: field-type binding and class-member lookup
//!
//! A per-file field-type map is computed from field/property signatures and
//! discarded when the file's dependencies are done. `field_call_<f>` contexts
//! bind the receiver through that map; dotted targets with a field-like
//! (leading underscore) receiver get the same substitution. Class-method
//! matching accepts a qualified-name suffix or line-range containment within
//! a class of that name; interface-to-implementation expansion is
//! deliberately not applied, so the parser's class name is used verbatim.

use super::{FileContext, LanguageOutcome, Resolution, Strategy, SymbolResolver};
use crate::parser::{RawDependency, SymbolKind};
use std::collections::HashMap;

/// Build `field name → type name` from a file's field/property symbols.
///
/// Signatures look like `IHandManager _handManager` or, when the parser saw a
/// concrete initializer, `IHandManager _handManager = new HandManager()`; the
/// initializer type wins because it is a parser-supplied local fact, not an
/// inference.
pub(crate) fn build_field_type_map(ctx: &FileContext) -> HashMap<String, String> {
    let mut map = HashMap::new();

    for symbol in &ctx.symbols {
        if symbol.kind != SymbolKind::Property {
            continue;
        }
        let Some(signature) = &symbol.signature else {
            continue;
        };

        let type_name = if let Some((_, init)) = signature.split_once("= new ") {
            init.split('(').next().unwrap_or(init).trim().to_string()
        } else {
            match signature.split_whitespace().next() {
                Some(ty) => ty.to_string(),
                None => continue,
            }
        };

        let type_name = strip_generics(&type_name);
        if type_name.is_empty() {
            continue;
        }
        map.insert(symbol.name.clone(), type_name);
    }

    map
}

pub(crate) fn resolve(
    resolver: &SymbolResolver,
    ctx: &FileContext,
    dep: &RawDependency,
    field_types: &HashMap<String, String>,
) -> LanguageOutcome {
    // Field-call context from the parser: bind through the type map
    if let Some(context) = &dep.qualified_context {
        if let Some(field) = context.strip_prefix("field_call_") {
            let Some(class) = field_types.get(field) else {
                return LanguageOutcome::Unresolved;
            };
            let method = method_part(&dep.target);
            return match find_class_method(resolver, class, method) {
                Some(resolution) => LanguageOutcome::Resolved(resolution),
                None => LanguageOutcome::Unresolved,
            };
        }
    }

    // Dotted target: `Receiver.Method`
    if let Some((receiver, method)) = dep.target.rsplit_once('.') {
        let receiver = receiver.rsplit('.').next().unwrap_or(receiver);

        // Field-like receiver: try field-type substitution before giving up
        if receiver.starts_with('_') {
            return match field_types
                .get(receiver)
                .and_then(|class| find_class_method(resolver, class, method))
            {
                Some(resolution) => LanguageOutcome::Resolved(resolution),
                None => LanguageOutcome::Unresolved,
            };
        }

        return match find_class_method(resolver, receiver, method) {
            Some(resolution) => LanguageOutcome::Resolved(resolution),
            None => LanguageOutcome::Continue,
        };
    }

    // Bare call inside a class body: the parser anchored the receiver class
    if let Some(class) = &dep.resolved_class {
        if let Some(resolution) = find_class_method(resolver, class, &dep.target) {
            return LanguageOutcome::Resolved(resolution);
        }
        return LanguageOutcome::Continue;
    }

    let _ = ctx;
    LanguageOutcome::Continue
}

/// Find the method of a class: accept a candidate whose qualified name ends
/// with `Class.Method`, or one lying within the line range of a
/// class/interface symbol of that name in the candidate's own file.
fn find_class_method(
    resolver: &SymbolResolver,
    class: &str,
    method: &str,
) -> Option<Resolution> {
    let class = strip_generics(class);
    let suffix = format!("{}.{}", class, method);

    for symbol in resolver.symbols_named(method) {
        if !matches!(symbol.kind, SymbolKind::Method | SymbolKind::Function) {
            continue;
        }

        if let Some(qualified) = &symbol.qualified_name {
            if qualified == &suffix || qualified.ends_with(&format!(".{}", suffix)) {
                return Some(Resolution {
                    symbol_id: symbol.id,
                    to_qualified_name: symbol.qualified_name.clone(),
                    strategy: Strategy::Qualified,
                });
            }
        }

        let Some(owner_ctx) = resolver.context_for_file_id(symbol.file_id) else {
            continue;
        };
        let contained = owner_ctx.symbols.iter().any(|candidate| {
            matches!(candidate.kind, SymbolKind::Class | SymbolKind::Interface)
                && candidate.name == class
                && candidate.start_line <= symbol.start_line
                && symbol.start_line <= candidate.end_line
        });
        if contained {
            return Some(Resolution {
                symbol_id: symbol.id,
                to_qualified_name: symbol.qualified_name.clone(),
                strategy: Strategy::Qualified,
            });
        }
    }

    None
}

/// `_handManager.SetHandPositions` → `SetHandPositions`; bare names pass through.
fn method_part(target: &str) -> &str {
    target.rsplit('.').next().unwrap_or(target)
}

fn strip_generics(ty: &str) -> String {
    ty.split('<').next().unwrap_or(ty).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FileRecord, SymbolRecord};
    use crate::parser::Visibility;
    use std::path::PathBuf;

    fn property(name: &str, signature: &str) -> SymbolRecord {
        SymbolRecord {
            id: 1,
            file_id: 1,
            name: name.to_string(),
            kind: SymbolKind::Property,
            start_line: 3,
            end_line: 3,
            is_exported: false,
            visibility: Visibility::Private,
            signature: Some(signature.to_string()),
            qualified_name: None,
        }
    }

    fn context_with(symbols: Vec<SymbolRecord>) -> FileContext {
        FileContext {
            file: FileRecord {
                id: 1,
                repository_id: 1,
                path: PathBuf::from("/repo/CardManager.cs"),
                language: "csharp".to_string(),
                size: 0,
                last_modified: 0,
                content_hash: None,
                is_test: false,
                is_generated: false,
            },
            symbols,
            imports: Vec::new(),
            exports: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    #[test]
    fn test_field_map_uses_declared_type() {
        let ctx = context_with(vec![property("_handManager", "IHandManager _handManager")]);
        let map = build_field_type_map(&ctx);
        assert_eq!(map.get("_handManager").map(String::as_str), Some("IHandManager"));
    }

    #[test]
    fn test_field_map_prefers_initializer_type() {
        let ctx = context_with(vec![property(
            "_handManager",
            "IHandManager _handManager = new HandManager()",
        )]);
        let map = build_field_type_map(&ctx);
        assert_eq!(map.get("_handManager").map(String::as_str), Some("HandManager"));
    }

    #[test]
    fn test_field_map_strips_generics() {
        let ctx = context_with(vec![property("_cards", "List<Card> _cards")]);
        let map = build_field_type_map(&ctx);
        assert_eq!(map.get("_cards").map(String::as_str), Some("List"));
    }
}
