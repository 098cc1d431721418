//! PHP resolution strategy: use-statement scoping, qualified-name lookup,
//! and the PSR-4 autoloader fallback
//!
//! `Class::method` targets resolve the class through the file's `use`
//! statements (alias → FQN, last-segment match, then bare name under the
//! current namespace), then look up `FQN::method`. Instance calls carrying a
//! parser-typed receiver (`resolved_class`) run the same procedure and
//! never fall back on a miss: `$file->store()` must not match an unrelated
//! controller's `store`. Known framework classes short-circuit to unresolved.

use super::{FileContext, LanguageOutcome, Resolution, Strategy, SymbolResolver};
use crate::parser::{DependencyKind, RawDependency, SymbolKind};

/// Laravel / common framework classes whose methods live outside the repo.
const FRAMEWORK_CLASSES: &[&str] = &[
    "Request",
    "UploadedFile",
    "Model",
    "Collection",
    "Builder",
    "Str",
    "Arr",
    "Carbon",
    "DB",
    "Auth",
    "Log",
    "Route",
    "Validator",
    "Hash",
    "Storage",
    "Session",
    "Cache",
    "Gate",
    "Event",
    "Queue",
    "Mail",
    "Notification",
    "Response",
    "JsonResponse",
    "Schema",
    "Blueprint",
];

/// PHP built-ins that never resolve in-repo.
const BUILTIN_CLASSES: &[&str] = &[
    "DateTime",
    "DateTimeImmutable",
    "DateInterval",
    "DateTimeZone",
    "Exception",
    "RuntimeException",
    "InvalidArgumentException",
    "LogicException",
    "ArrayObject",
    "ArrayIterator",
    "stdClass",
    "Closure",
    "Throwable",
    "PDO",
    "PDOStatement",
    "SplQueue",
    "SplStack",
];

const FRAMEWORK_NAMESPACE_PREFIXES: &[&str] = &["Illuminate\\", "Symfony\\", "Carbon\\", "Psr\\"];

pub(crate) fn resolve(
    resolver: &SymbolResolver,
    ctx: &FileContext,
    dep: &RawDependency,
) -> LanguageOutcome {
    // Instance call with a locally typed receiver: the typed procedure is
    // authoritative and a miss yields unresolved, never a name-match guess.
    // Known testing/validation/request methods inherited from framework base
    // classes bind to synthetic registry symbols instead of vanishing.
    if let Some(resolved_class) = &dep.resolved_class {
        if is_framework_class(resolved_class) {
            return LanguageOutcome::Unresolved;
        }
        return match resolve_class_method(resolver, ctx, resolved_class, &dep.target) {
            Some(resolution) => LanguageOutcome::Resolved(resolution),
            None => match registry_method(resolver, &dep.target) {
                Some(resolution) => LanguageOutcome::Resolved(resolution),
                None => LanguageOutcome::Unresolved,
            },
        };
    }

    // Static call: `Class::method`
    if let Some((class_part, method)) = dep.target.split_once("::") {
        if class_part == "parent" {
            // Needs the inheritance chain; out of scope for this layer
            return LanguageOutcome::Unresolved;
        }
        if is_framework_class(class_part) {
            return LanguageOutcome::Unresolved;
        }
        return match resolve_class_method(resolver, ctx, class_part, method) {
            Some(resolution) => LanguageOutcome::Resolved(resolution),
            None => LanguageOutcome::Unresolved,
        };
    }

    // Instance call whose receiver could not be typed locally
    if dep.calling_object.is_some() {
        return match registry_method(resolver, &dep.target) {
            Some(resolution) => LanguageOutcome::Resolved(resolution),
            None => LanguageOutcome::Unresolved,
        };
    }

    // Class references: `new Foo`, extends, implements, trait use
    if matches!(
        dep.kind,
        DependencyKind::References | DependencyKind::Inherits | DependencyKind::Implements
    ) {
        if is_framework_class(&dep.target) {
            return LanguageOutcome::Unresolved;
        }
        for fqn in class_candidates(ctx, &dep.target) {
            if let Some(symbol) = resolver.lookup_qualified(&fqn) {
                if matches!(
                    symbol.kind,
                    SymbolKind::Class | SymbolKind::Interface | SymbolKind::Trait | SymbolKind::Enum
                ) {
                    return LanguageOutcome::Resolved(Resolution {
                        symbol_id: symbol.id,
                        to_qualified_name: symbol.qualified_name.clone(),
                        strategy: Strategy::Qualified,
                    });
                }
            }
        }
        return LanguageOutcome::Continue;
    }

    // Plain function call: common fallbacks handle local/import/global
    LanguageOutcome::Continue
}

/// Resolve `(class, method)`: qualified index first, then the autoloader
/// mapping to a file searched for the method.
fn resolve_class_method(
    resolver: &SymbolResolver,
    ctx: &FileContext,
    class: &str,
    method: &str,
) -> Option<Resolution> {
    let candidates = class_candidates(ctx, class);

    for fqn in &candidates {
        if let Some(symbol) = resolver.lookup_qualified(&format!("{}::{}", fqn, method)) {
            return Some(Resolution {
                symbol_id: symbol.id,
                to_qualified_name: symbol.qualified_name.clone(),
                strategy: Strategy::Qualified,
            });
        }
    }

    for fqn in &candidates {
        let Some(path) = resolver.autoloader().resolve(fqn) else {
            continue;
        };
        let Some(target_ctx) = resolver.context_for_path(&path) else {
            continue;
        };
        if let Some(symbol) = target_ctx
            .symbols
            .iter()
            .find(|s| s.kind == SymbolKind::Method && s.name == method)
        {
            return Some(Resolution {
                symbol_id: symbol.id,
                to_qualified_name: symbol.qualified_name.clone(),
                strategy: Strategy::Qualified,
            });
        }
    }

    None
}

/// Known framework method under the PHP-specific registry hints (PHPUnit
/// assertions, Laravel validation/request helpers). Plain-function entries
/// are deliberately not consulted here; `count`-like names on an instance
/// receiver are not the built-in functions.
fn registry_method(resolver: &SymbolResolver, method: &str) -> Option<Resolution> {
    ["phpunit", "laravel"]
        .into_iter()
        .find_map(|hint| resolver.registry.lookup(method, hint))
        .filter(|entry| entry.kind == SymbolKind::Method)
        .map(|entry| Resolution {
            symbol_id: entry.synthetic_id(),
            to_qualified_name: None,
            strategy: Strategy::Framework,
        })
}

/// Candidate FQNs for a class name, in resolution priority order.
fn class_candidates(ctx: &FileContext, class: &str) -> Vec<String> {
    let class = class.trim_start_matches('\\');
    if class.contains('\\') {
        return vec![class.to_string()];
    }

    let mut candidates = Vec::new();

    // Alias or imported-name match on use statements
    for import in &ctx.imports {
        if import.imported_names.iter().any(|n| n == class) {
            candidates.push(import.source.clone());
        }
    }

    // Last-segment match on use statements
    for import in &ctx.imports {
        if import.source.rsplit('\\').next() == Some(class)
            && !candidates.contains(&import.source)
        {
            candidates.push(import.source.clone());
        }
    }

    // Bare name under the current namespace
    if let Some(namespace) = ctx.namespace() {
        candidates.push(format!("{}\\{}", namespace, class));
    }

    candidates.push(class.to_string());
    candidates
}

/// Framework and built-in classes are recognized by last segment or prefix.
fn is_framework_class(class: &str) -> bool {
    let class = class.trim_start_matches('\\');
    if FRAMEWORK_NAMESPACE_PREFIXES
        .iter()
        .any(|prefix| class.starts_with(prefix))
    {
        return true;
    }
    let last = class.rsplit('\\').next().unwrap_or(class);
    FRAMEWORK_CLASSES.contains(&last) || BUILTIN_CLASSES.contains(&last)
}
