//! PHP language parser using Tree-sitter
//!
//! Emits namespaces, use imports (with aliases and group use), classes,
//! interfaces, traits, enums, methods, properties, and functions. Calls are
//! recorded as static (`A::b`) or instance (`$x->b` with `calling_object`,
//! plus `resolved_class` where the receiver can be typed locally).

use super::{
    collect_syntax_errors, find_child_by_kind, node_name, node_text, DependencyKind, Export,
    ExportKind, Import, ImportKind, LanguageParser, ParseError, ParseOptions, ParseResult,
    RawDependency, Symbol, SymbolKind, Visibility,
};
use crate::language::Language;
use std::collections::HashMap;
use std::path::Path;
use tree_sitter::{Parser, Tree, TreeCursor};

/// Extraction context bundling mutable state passed through extraction methods
struct ExtractCtx<'a> {
    source: &'a str,
    result: &'a mut ParseResult,
    current_namespace: Option<String>,
}

impl ExtractCtx<'_> {
    /// Qualify a top-level name under the current namespace.
    fn qualify(&self, name: &str) -> String {
        match &self.current_namespace {
            Some(ns) => format!("{}\\{}", ns, name),
            None => name.to_string(),
        }
    }
}

/// PHP language parser
pub struct PhpParser {
    language: tree_sitter::Language,
}

impl Default for PhpParser {
    fn default() -> Self {
        Self {
            language: tree_sitter_php::LANGUAGE_PHP_ONLY.into(),
        }
    }
}

impl PhpParser {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse_tree(&self, source: &str) -> Result<Tree, ParseError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| ParseError::TreeSitter(e.to_string()))?;
        parser
            .parse(source, None)
            .ok_or_else(|| ParseError::TreeSitter("failed to parse PHP source".to_string()))
    }

    fn extract(&self, tree: &Tree, source: &str, result: &mut ParseResult) {
        let root_node = tree.root_node();
        let mut cursor = root_node.walk();

        let mut ctx = ExtractCtx {
            source,
            result,
            current_namespace: None,
        };

        // First pass: declarations
        self.extract_top_level_children(&root_node, &mut cursor, &mut ctx);

        // Second pass: calls inside bodies
        let namespace = ctx.current_namespace.clone();
        let mut call_cursor = root_node.walk();
        let mut walker = CallWalker {
            source,
            result: ctx.result,
            namespace,
        };
        walker.walk(&mut call_cursor, None, None);
    }

    fn extract_top_level_children<'a>(
        &self,
        parent: &tree_sitter::Node<'a>,
        cursor: &mut TreeCursor<'a>,
        ctx: &mut ExtractCtx,
    ) {
        for child in parent.children(cursor) {
            match child.kind() {
                "php_tag" | "text_interpolation" => continue,
                "namespace_definition" => {
                    self.extract_namespace(&child, ctx);
                }
                "namespace_use_declaration" => {
                    extract_use_imports(&child, ctx);
                }
                "class_declaration" => {
                    self.extract_class_like(&child, ctx, SymbolKind::Class);
                }
                "interface_declaration" => {
                    self.extract_class_like(&child, ctx, SymbolKind::Interface);
                }
                "trait_declaration" => {
                    self.extract_class_like(&child, ctx, SymbolKind::Trait);
                }
                "enum_declaration" => {
                    self.extract_class_like(&child, ctx, SymbolKind::Enum);
                }
                "function_definition" => {
                    self.extract_function(&child, ctx);
                }
                "const_declaration" => {
                    extract_consts(&child, ctx, None);
                }
                _ => {}
            }
        }
    }

    fn extract_namespace(&self, node: &tree_sitter::Node, ctx: &mut ExtractCtx) {
        let ns_name = extract_namespace_name(node, ctx.source);
        if !ns_name.is_empty() {
            let mut symbol = Symbol::new(&ns_name, SymbolKind::Namespace, node.start_position().row + 1);
            symbol.qualified_name = Some(ns_name.clone());
            symbol.end_line = node.end_position().row + 1;
            ctx.result.symbols.push(symbol);
            ctx.current_namespace = Some(ns_name);
        }

        // Braced namespace: extract children from the body
        if let Some(body) = node.child_by_field_name("body") {
            let mut body_cursor = body.walk();
            self.extract_top_level_children(&body, &mut body_cursor, ctx);
        }
    }

    fn extract_class_like(&self, node: &tree_sitter::Node, ctx: &mut ExtractCtx, kind: SymbolKind) {
        let name = match node_name(node, ctx.source) {
            Some(n) => n,
            None => return,
        };

        let qualified = ctx.qualify(&name);
        let start_line = node.start_position().row + 1;

        // Base class from base_clause
        if let Some(base) = find_child_by_kind(node, "base_clause") {
            for base_name in class_names_in(&base, ctx.source) {
                ctx.result.dependencies.push(RawDependency::new(
                    qualified.clone(),
                    base_name,
                    DependencyKind::Inherits,
                    start_line,
                ));
            }
        }

        // Interfaces from class_interface_clause
        if let Some(iface_clause) = find_child_by_kind(node, "class_interface_clause") {
            for iface_name in class_names_in(&iface_clause, ctx.source) {
                ctx.result.dependencies.push(RawDependency::new(
                    qualified.clone(),
                    iface_name,
                    DependencyKind::Implements,
                    start_line,
                ));
            }
        }

        let mut symbol = Symbol::new(&name, kind, start_line);
        symbol.end_line = node.end_position().row + 1;
        symbol.is_exported = true;
        symbol.qualified_name = Some(qualified.clone());
        ctx.result.symbols.push(symbol);

        ctx.result.exports.push(Export {
            name: name.clone(),
            line: start_line,
            kind: ExportKind::Named,
        });

        let body = find_child_by_kind(node, "declaration_list")
            .or_else(|| find_child_by_kind(node, "enum_declaration_list"));
        if let Some(body) = body {
            self.extract_body_members(&body, ctx, &qualified);
        }
    }

    fn extract_body_members(&self, body: &tree_sitter::Node, ctx: &mut ExtractCtx, class_qualified: &str) {
        let mut body_cursor = body.walk();
        for child in body.children(&mut body_cursor) {
            match child.kind() {
                "method_declaration" => {
                    self.extract_method(&child, ctx, class_qualified);
                }
                "property_declaration" => {
                    extract_property(&child, ctx, class_qualified);
                }
                "const_declaration" => {
                    extract_consts(&child, ctx, Some(class_qualified));
                }
                "use_declaration" => {
                    // Trait use inside class body: `use HasUuid, Timestampable;`
                    extract_trait_use(&child, ctx, class_qualified);
                }
                "enum_case" => {
                    if let Some(case_name) = node_name(&child, ctx.source) {
                        let mut symbol = Symbol::new(
                            &case_name,
                            SymbolKind::Constant,
                            child.start_position().row + 1,
                        );
                        symbol.qualified_name =
                            Some(format!("{}::{}", class_qualified, case_name));
                        ctx.result.symbols.push(symbol);
                    }
                }
                _ => {}
            }
        }
    }

    fn extract_method(&self, node: &tree_sitter::Node, ctx: &mut ExtractCtx, class_qualified: &str) {
        let name = match node_name(node, ctx.source) {
            Some(n) => n,
            None => return,
        };

        let mut symbol = Symbol::new(&name, SymbolKind::Method, node.start_position().row + 1);
        symbol.end_line = node.end_position().row + 1;
        symbol.visibility = extract_visibility(node, ctx.source);
        symbol.qualified_name = Some(format!("{}::{}", class_qualified, name));
        symbol.signature = declaration_signature(node, ctx.source);
        ctx.result.symbols.push(symbol);
    }

    fn extract_function(&self, node: &tree_sitter::Node, ctx: &mut ExtractCtx) {
        let name = match node_name(node, ctx.source) {
            Some(n) => n,
            None => return,
        };

        let start_line = node.start_position().row + 1;
        let mut symbol = Symbol::new(&name, SymbolKind::Function, start_line);
        symbol.end_line = node.end_position().row + 1;
        symbol.is_exported = true;
        symbol.qualified_name = Some(ctx.qualify(&name));
        symbol.signature = declaration_signature(node, ctx.source);
        ctx.result.symbols.push(symbol);

        ctx.result.exports.push(Export {
            name,
            line: start_line,
            kind: ExportKind::Named,
        });
    }
}

impl LanguageParser for PhpParser {
    fn languages(&self) -> &[Language] {
        &[Language::Php]
    }

    fn parse(
        &self,
        path: &Path,
        source: &str,
        _options: &ParseOptions,
    ) -> Result<ParseResult, ParseError> {
        let tree = self.parse_tree(source)?;
        let mut result = ParseResult::new(path, Language::Php);
        collect_syntax_errors(&tree, &mut result.errors);
        self.extract(&tree, source, &mut result);
        result.symbols.sort_by_key(|s| s.start_line);
        Ok(result)
    }
}

// ── Use imports ─────────────────────────────────────────────────────────────

fn extract_use_imports(node: &tree_sitter::Node, ctx: &mut ExtractCtx) {
    // namespace_use_declaration can be:
    // 1. `use App\Models\User;` (single import)
    // 2. `use App\Models\User as Account;` (aliased)
    // 3. `use App\{Foo, Bar};` (grouped)
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "namespace_use_clause" {
            extract_single_use_clause(&child, ctx, None);
        } else if child.kind() == "namespace_use_group" {
            let prefix = find_child_by_kind(node, "namespace_name")
                .and_then(|n| node_text(&n, ctx.source))
                .unwrap_or_default();

            let mut group_cursor = child.walk();
            for group_child in child.children(&mut group_cursor) {
                if group_child.kind() == "namespace_use_clause" {
                    extract_single_use_clause(&group_child, ctx, Some(&prefix));
                }
            }
        }
    }
}

fn extract_single_use_clause(node: &tree_sitter::Node, ctx: &mut ExtractCtx, prefix: Option<&str>) {
    let qual_name = match find_child_by_kind(node, "qualified_name")
        .or_else(|| find_child_by_kind(node, "namespace_name"))
        .or_else(|| find_child_by_kind(node, "name"))
    {
        Some(n) => n,
        None => return,
    };

    let raw_path = match node_text(&qual_name, ctx.source) {
        Some(t) => t,
        None => return,
    };
    let raw_path = raw_path.trim_start_matches('\\');

    let full_path = match prefix {
        Some(p) if !p.is_empty() => format!("{}\\{}", p.trim_start_matches('\\'), raw_path),
        _ => raw_path.to_string(),
    };

    // `use Foo\Bar as Baz` binds the alias, not the last segment
    let alias = find_child_by_kind(node, "namespace_aliasing_clause")
        .and_then(|ac| find_child_by_kind(&ac, "name"))
        .and_then(|n| node_text(&n, ctx.source));

    let imported_name = alias.unwrap_or_else(|| {
        full_path
            .rsplit('\\')
            .next()
            .unwrap_or(&full_path)
            .to_string()
    });

    ctx.result.imports.push(Import {
        source: full_path,
        kind: ImportKind::Named,
        imported_names: vec![imported_name],
        line: node.start_position().row + 1,
    });
}

// ── Members ─────────────────────────────────────────────────────────────────

fn extract_property(node: &tree_sitter::Node, ctx: &mut ExtractCtx, class_qualified: &str) {
    let var_type = extract_property_type(node, ctx.source);
    let visibility = extract_visibility(node, ctx.source);

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() != "property_element" {
            continue;
        }
        let Some(var_name_node) = find_child_by_kind(&child, "variable_name") else {
            continue;
        };
        let Some(raw_name) = node_text(&var_name_node, ctx.source) else {
            continue;
        };
        let name = raw_name.trim_start_matches('$').to_string();

        let mut symbol = Symbol::new(&name, SymbolKind::Property, node.start_position().row + 1);
        symbol.end_line = node.end_position().row + 1;
        symbol.visibility = visibility;
        symbol.qualified_name = Some(format!("{}::${}", class_qualified, name));
        symbol.signature = var_type
            .as_ref()
            .map(|t| format!("{} ${}", t, name));
        ctx.result.symbols.push(symbol);
    }
}

fn extract_consts(node: &tree_sitter::Node, ctx: &mut ExtractCtx, class_qualified: Option<&str>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() != "const_element" {
            continue;
        }
        let Some(name_node) = find_child_by_kind(&child, "name") else {
            continue;
        };
        let Some(name) = node_text(&name_node, ctx.source) else {
            continue;
        };

        let start_line = child.start_position().row + 1;
        let mut symbol = Symbol::new(&name, SymbolKind::Constant, start_line);
        symbol.qualified_name = Some(match class_qualified {
            Some(cls) => format!("{}::{}", cls, name),
            None => ctx.qualify(&name),
        });
        if class_qualified.is_none() {
            symbol.is_exported = true;
            ctx.result.exports.push(Export {
                name: name.clone(),
                line: start_line,
                kind: ExportKind::Named,
            });
        }
        ctx.result.symbols.push(symbol);
    }
}

fn extract_trait_use(node: &tree_sitter::Node, ctx: &mut ExtractCtx, class_qualified: &str) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "name" || child.kind() == "qualified_name" {
            if let Some(trait_name) = node_text(&child, ctx.source) {
                ctx.result.dependencies.push(RawDependency::new(
                    class_qualified,
                    trait_name.trim_start_matches('\\'),
                    DependencyKind::References,
                    node.start_position().row + 1,
                ));
            }
        }
    }
}

// ── Call extraction (second pass) ───────────────────────────────────────────

/// Walks the tree tracking the enclosing class/method plus locally inferable
/// receiver types, and records raw call dependencies.
struct CallWalker<'a> {
    source: &'a str,
    result: &'a mut ParseResult,
    namespace: Option<String>,
}

/// Scope facts for the function body currently being walked.
#[derive(Clone, Default)]
struct BodyScope {
    /// `$var` → class name, from `new` assignments and typed parameters
    local_types: HashMap<String, String>,
    /// property name → declared type, from the enclosing class
    property_types: HashMap<String, String>,
}

impl<'a> CallWalker<'a> {
    fn walk(
        &mut self,
        cursor: &mut TreeCursor,
        current_class: Option<&ClassScope>,
        current_anchor: Option<&Anchor>,
    ) {
        let node = cursor.node();

        match node.kind() {
            "class_declaration" | "trait_declaration" | "enum_declaration"
            | "interface_declaration" => {
                if let Some(name) = node_name(&node, self.source) {
                    let qualified = match &self.namespace {
                        Some(ns) => format!("{}\\{}", ns, name),
                        None => name.clone(),
                    };
                    let scope = ClassScope {
                        qualified,
                        property_types: collect_property_types(&node, self.source),
                    };
                    self.walk_children(cursor, Some(&scope), current_anchor);
                    return;
                }
            }
            "method_declaration" | "function_definition" => {
                if let Some(name) = node_name(&node, self.source) {
                    let anchor_name = match current_class {
                        Some(cls) => format!("{}::{}", cls.qualified, name),
                        None => match &self.namespace {
                            Some(ns) => format!("{}\\{}", ns, name),
                            None => name.clone(),
                        },
                    };
                    let scope = BodyScope {
                        local_types: collect_local_types(&node, self.source),
                        property_types: current_class
                            .map(|c| c.property_types.clone())
                            .unwrap_or_default(),
                    };
                    let anchor = Anchor {
                        name: anchor_name,
                        scope,
                    };
                    self.walk_children(cursor, current_class, Some(&anchor));
                    return;
                }
            }
            "function_call_expression" => {
                if let Some(anchor) = current_anchor {
                    self.record_function_call(&node, anchor);
                }
            }
            "scoped_call_expression" => {
                if let Some(anchor) = current_anchor {
                    self.record_scoped_call(&node, anchor, current_class);
                }
            }
            "member_call_expression" => {
                if let Some(anchor) = current_anchor {
                    self.record_member_call(&node, anchor, current_class);
                }
            }
            "object_creation_expression" => {
                if let Some(anchor) = current_anchor {
                    self.record_instantiation(&node, anchor);
                }
            }
            _ => {}
        }

        self.walk_children(cursor, current_class, current_anchor);
    }

    fn walk_children(
        &mut self,
        cursor: &mut TreeCursor,
        current_class: Option<&ClassScope>,
        current_anchor: Option<&Anchor>,
    ) {
        if cursor.goto_first_child() {
            loop {
                self.walk(cursor, current_class, current_anchor);
                if !cursor.goto_next_sibling() {
                    break;
                }
            }
            cursor.goto_parent();
        }
    }

    fn record_function_call(&mut self, node: &tree_sitter::Node, anchor: &Anchor) {
        let Some(func) = node.child_by_field_name("function") else {
            return;
        };
        // Only direct name calls; `$fn()` and `(...)()` are dynamic
        if !matches!(func.kind(), "name" | "qualified_name") {
            return;
        }
        let Some(target) = node_text(&func, self.source) else {
            return;
        };

        let mut dep = RawDependency::new(
            anchor.name.clone(),
            target.trim_start_matches('\\'),
            DependencyKind::Calls,
            node.start_position().row + 1,
        );
        dep.parameter_types = literal_argument_types(node, self.source);
        self.result.dependencies.push(dep);
    }

    fn record_scoped_call(
        &mut self,
        node: &tree_sitter::Node,
        anchor: &Anchor,
        current_class: Option<&ClassScope>,
    ) {
        let (Some(scope), Some(name)) = (
            node.child_by_field_name("scope"),
            node.child_by_field_name("name"),
        ) else {
            return;
        };
        let (Some(scope_text), Some(name_text)) = (
            node_text(&scope, self.source),
            node_text(&name, self.source),
        ) else {
            return;
        };

        let class = match scope_text.as_str() {
            "self" | "static" => match current_class {
                Some(cls) => cls.qualified.clone(),
                None => return,
            },
            // `parent::` needs the inheritance chain; leave the textual name
            _ => scope_text.trim_start_matches('\\').to_string(),
        };

        let mut dep = RawDependency::new(
            anchor.name.clone(),
            format!("{}::{}", class, name_text),
            DependencyKind::Calls,
            node.start_position().row + 1,
        );
        dep.parameter_types = literal_argument_types(node, self.source);
        self.result.dependencies.push(dep);
    }

    fn record_member_call(
        &mut self,
        node: &tree_sitter::Node,
        anchor: &Anchor,
        current_class: Option<&ClassScope>,
    ) {
        let (Some(object), Some(name)) = (
            node.child_by_field_name("object"),
            node.child_by_field_name("name"),
        ) else {
            return;
        };
        let Some(method) = node_text(&name, self.source) else {
            return;
        };

        let mut dep = RawDependency::new(
            anchor.name.clone(),
            method,
            DependencyKind::Calls,
            node.start_position().row + 1,
        );
        dep.parameter_types = literal_argument_types(node, self.source);

        match object.kind() {
            "variable_name" => {
                let var = node_text(&object, self.source).unwrap_or_default();
                dep.calling_object = Some(var.clone());
                if var == "$this" {
                    if let Some(cls) = current_class {
                        dep.resolved_class = Some(cls.qualified.clone());
                    }
                } else if let Some(ty) = anchor.scope.local_types.get(&var) {
                    dep.resolved_class = Some(ty.clone());
                }
            }
            "member_access_expression" => {
                // `$this->prop->method()`: type the receiver from the
                // property declaration when available
                let text = node_text(&object, self.source).unwrap_or_default();
                dep.calling_object = Some(text.clone());
                if let Some(prop) = text.strip_prefix("$this->") {
                    if let Some(ty) = anchor.scope.property_types.get(prop) {
                        dep.resolved_class = Some(ty.clone());
                    }
                }
            }
            _ => {
                // Chained or computed receiver: record the call unanchored
                dep.calling_object = node_text(&object, self.source);
            }
        }

        self.result.dependencies.push(dep);
    }

    fn record_instantiation(&mut self, node: &tree_sitter::Node, anchor: &Anchor) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if matches!(child.kind(), "name" | "qualified_name") {
                if let Some(class_name) = node_text(&child, self.source) {
                    self.result.dependencies.push(RawDependency::new(
                        anchor.name.clone(),
                        class_name.trim_start_matches('\\'),
                        DependencyKind::References,
                        node.start_position().row + 1,
                    ));
                }
                break;
            }
        }
    }
}

struct ClassScope {
    qualified: String,
    property_types: HashMap<String, String>,
}

struct Anchor {
    name: String,
    scope: BodyScope,
}

/// Collect `property name → declared type` from a class-like declaration.
fn collect_property_types(node: &tree_sitter::Node, source: &str) -> HashMap<String, String> {
    let mut types = HashMap::new();
    let Some(body) = find_child_by_kind(node, "declaration_list") else {
        return types;
    };

    let mut cursor = body.walk();
    for child in body.children(&mut cursor) {
        match child.kind() {
            "property_declaration" => {
                let Some(ty) = extract_property_type(&child, source) else {
                    continue;
                };
                let class_name = bare_class_type(&ty);
                let mut pc = child.walk();
                for elem in child.children(&mut pc) {
                    if elem.kind() == "property_element" {
                        if let Some(var) = find_child_by_kind(&elem, "variable_name")
                            .and_then(|v| node_text(&v, source))
                        {
                            types.insert(
                                var.trim_start_matches('$').to_string(),
                                class_name.clone(),
                            );
                        }
                    }
                }
            }
            "method_declaration" => {
                // Constructor property promotion types promoted fields
                if node_name(&child, source).as_deref() == Some("__construct") {
                    if let Some(params) = find_child_by_kind(&child, "formal_parameters") {
                        let mut pc = params.walk();
                        for param in params.children(&mut pc) {
                            if param.kind() != "property_promotion_parameter" {
                                continue;
                            }
                            let ty = param
                                .child_by_field_name("type")
                                .and_then(|t| node_text(&t, source));
                            let name = param
                                .child_by_field_name("name")
                                .and_then(|n| node_text(&n, source));
                            if let (Some(ty), Some(name)) = (ty, name) {
                                types.insert(
                                    name.trim_start_matches('$').to_string(),
                                    bare_class_type(&ty),
                                );
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    types
}

/// Collect `$var → class` facts visible inside one function body: typed
/// parameters and `$var = new Foo(...)` assignments.
fn collect_local_types(node: &tree_sitter::Node, source: &str) -> HashMap<String, String> {
    let mut types = HashMap::new();

    if let Some(params) = find_child_by_kind(node, "formal_parameters") {
        let mut cursor = params.walk();
        for param in params.children(&mut cursor) {
            if !matches!(param.kind(), "simple_parameter" | "property_promotion_parameter") {
                continue;
            }
            let ty = param
                .child_by_field_name("type")
                .and_then(|t| node_text(&t, source));
            let name = param
                .child_by_field_name("name")
                .and_then(|n| node_text(&n, source));
            if let (Some(ty), Some(name)) = (ty, name) {
                let bare = bare_class_type(&ty);
                if !bare.is_empty() {
                    types.insert(name, bare);
                }
            }
        }
    }

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        collect_new_assignments(&mut cursor, source, &mut types);
    }

    types
}

fn collect_new_assignments(
    cursor: &mut TreeCursor,
    source: &str,
    types: &mut HashMap<String, String>,
) {
    let node = cursor.node();

    if node.kind() == "assignment_expression" {
        if let (Some(left), Some(right)) = (
            node.child_by_field_name("left"),
            node.child_by_field_name("right"),
        ) {
            if left.kind() == "variable_name" && right.kind() == "object_creation_expression" {
                let var = node_text(&left, source);
                let mut rc = right.walk();
                let class = right
                    .children(&mut rc)
                    .find(|c| matches!(c.kind(), "name" | "qualified_name"))
                    .and_then(|c| node_text(&c, source));
                if let (Some(var), Some(class)) = (var, class) {
                    types.insert(var, class.trim_start_matches('\\').to_string());
                }
            }
        }
    }

    // Do not descend into nested closures; their scope is separate
    if matches!(node.kind(), "anonymous_function_creation_expression") {
        return;
    }

    if cursor.goto_first_child() {
        loop {
            collect_new_assignments(cursor, source, types);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
        cursor.goto_parent();
    }
}

// ── Free helper functions ───────────────────────────────────────────────────

/// Extract namespace name from namespace_definition, keeping backslashes.
fn extract_namespace_name(node: &tree_sitter::Node, source: &str) -> String {
    node.child_by_field_name("name")
        .and_then(|n| node_text(&n, source))
        .or_else(|| find_child_by_kind(node, "namespace_name").and_then(|n| node_text(&n, source)))
        .unwrap_or_default()
}

/// Collect class names from a base/interface clause.
fn class_names_in(node: &tree_sitter::Node, source: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "name" || child.kind() == "qualified_name" {
            if let Some(text) = node_text(&child, source) {
                names.push(text.trim_start_matches('\\').to_string());
            }
        }
    }
    names
}

fn extract_visibility(node: &tree_sitter::Node, source: &str) -> Visibility {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "visibility_modifier" {
            return match node_text(&child, source).as_deref() {
                Some("private") => Visibility::Private,
                Some("protected") => Visibility::Protected,
                _ => Visibility::Public,
            };
        }
    }
    Visibility::Public
}

/// Extract property type from property_declaration
fn extract_property_type(node: &tree_sitter::Node, source: &str) -> Option<String> {
    node.child_by_field_name("type")
        .and_then(|t| node_text(&t, source))
        .or_else(|| {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                match child.kind() {
                    "primitive_type" | "named_type" | "optional_type" | "union_type"
                    | "nullable_type" => {
                        return node_text(&child, source);
                    }
                    "property_element" => break,
                    _ => {}
                }
            }
            None
        })
}

/// Strip nullability and leading backslash so `?\App\Foo` types as `App\Foo`.
/// Union and primitive types yield an empty string (not class-typed).
fn bare_class_type(ty: &str) -> String {
    let ty = ty.trim().trim_start_matches('?').trim_start_matches('\\');
    if ty.contains('|') || ty.contains('&') {
        return String::new();
    }
    let first = ty.chars().next().unwrap_or(' ');
    if !first.is_ascii_uppercase() {
        return String::new();
    }
    ty.to_string()
}

/// First line of a declaration, up to the body brace.
fn declaration_signature(node: &tree_sitter::Node, source: &str) -> Option<String> {
    let text = node_text(node, source)?;
    let head = text.split('{').next().unwrap_or(&text).trim();
    let head = head.lines().collect::<Vec<_>>().join(" ");
    Some(head.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Literal argument types where syntactically obvious (strings, numbers, arrays).
fn literal_argument_types(call: &tree_sitter::Node, _source: &str) -> Vec<String> {
    let Some(args) = call.child_by_field_name("arguments") else {
        return Vec::new();
    };
    let mut types = Vec::new();
    let mut cursor = args.walk();
    for child in args.children(&mut cursor) {
        if child.kind() != "argument" {
            continue;
        }
        let ty = match child.named_child(0).map(|c| c.kind()) {
            Some("string" | "encapsed_string") => "string",
            Some("integer") => "int",
            Some("float") => "float",
            Some("array_creation_expression") => "array",
            Some("object_creation_expression") => "object",
            _ => "mixed",
        };
        types.push(ty.to_string());
    }
    types
}
