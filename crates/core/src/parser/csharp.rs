//! C# language parser using Tree-sitter
//!
//! Emits namespaces, classes, structs, interfaces, methods, and fields and
//! properties with their declared type signature. Calls are recorded as
//! dotted `Obj.Method` when the receiver is syntactically visible; calls
//! through a field additionally carry `qualified_context = "field_call_<f>"`
//! so the resolver can bind the receiver through the field-type map.

use super::{
    collect_syntax_errors, find_child_by_kind, node_text, DependencyKind, Export, ExportKind,
    Import, ImportKind, LanguageParser, ParseError, ParseOptions, ParseResult, RawDependency,
    Symbol, SymbolKind, Visibility,
};
use crate::language::Language;
use std::collections::HashSet;
use std::path::Path;
use tree_sitter::{Parser, Tree, TreeCursor};

/// Extraction context bundling mutable state passed through extraction methods
struct ExtractCtx<'a> {
    source: &'a str,
    result: &'a mut ParseResult,
}

/// C# language parser
pub struct CSharpParser {
    language: tree_sitter::Language,
}

impl Default for CSharpParser {
    fn default() -> Self {
        Self {
            language: tree_sitter_c_sharp::LANGUAGE.into(),
        }
    }
}

impl CSharpParser {
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
            .ok_or_else(|| ParseError::TreeSitter("failed to parse C# source".to_string()))
    }

    fn extract(&self, tree: &Tree, source: &str, result: &mut ParseResult) {
        let root_node = tree.root_node();
        let mut ctx = ExtractCtx { source, result };

        // First pass: declarations
        self.process_declarations(&root_node, &mut ctx, None);

        // Second pass: invocation expressions
        let file_namespace = file_scoped_namespace(&root_node, source);
        let mut call_cursor = root_node.walk();
        let mut walker = CallWalker {
            source,
            result: ctx.result,
            file_namespace,
        };
        walker.walk(&mut call_cursor, None, None);
    }

    /// Process declarations at the top level or inside a namespace body. A
    /// file-scoped namespace (`namespace X;`) has no body; it scopes every
    /// sibling that follows it.
    fn process_declarations(
        &self,
        node: &tree_sitter::Node,
        ctx: &mut ExtractCtx,
        namespace: Option<&str>,
    ) {
        let mut file_scoped: Option<String> = None;

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            let effective = file_scoped
                .clone()
                .or_else(|| namespace.map(|s| s.to_string()));
            let namespace = effective.as_deref();
            match child.kind() {
                "using_directive" => {
                    extract_using(&child, ctx);
                }
                "file_scoped_namespace_declaration" => {
                    if let Some(name) = self.extract_namespace(&child, ctx, namespace) {
                        file_scoped = Some(name);
                    }
                }
                "namespace_declaration" => {
                    if let Some(qualified) = self.extract_namespace(&child, ctx, namespace) {
                        if let Some(body) = child.child_by_field_name("body") {
                            self.process_declarations(&body, ctx, Some(&qualified));
                        }
                    }
                }
                "class_declaration" | "struct_declaration" | "record_declaration"
                | "record_struct_declaration" => {
                    self.extract_class(&child, ctx, namespace, SymbolKind::Class);
                }
                "interface_declaration" => {
                    self.extract_class(&child, ctx, namespace, SymbolKind::Interface);
                }
                "enum_declaration" => {
                    self.extract_enum(&child, ctx, namespace);
                }
                "global_statement" => {}
                _ => {}
            }
        }
    }

    fn extract_namespace(
        &self,
        node: &tree_sitter::Node,
        ctx: &mut ExtractCtx,
        outer: Option<&str>,
    ) -> Option<String> {
        let name = node
            .child_by_field_name("name")
            .map(|n| extract_qualified_name(&n, ctx.source))?;

        let qualified = match outer {
            Some(o) => format!("{}.{}", o, name),
            None => name.clone(),
        };

        let mut symbol = Symbol::new(&name, SymbolKind::Namespace, node.start_position().row + 1);
        symbol.end_line = node.end_position().row + 1;
        symbol.qualified_name = Some(qualified.clone());
        ctx.result.symbols.push(symbol);

        Some(qualified)
    }

    fn extract_class(
        &self,
        node: &tree_sitter::Node,
        ctx: &mut ExtractCtx,
        namespace: Option<&str>,
        kind: SymbolKind,
    ) {
        let Some(name) = node_field_text(node, "name", ctx.source) else {
            return;
        };

        let qualified = qualify(namespace, &name);
        let start_line = node.start_position().row + 1;
        let is_public = has_modifier(node, ctx.source, "public");

        // Base types: I-prefixed names are interfaces by convention
        if let Some(base_list) = find_child_by_kind(node, "base_list") {
            for base in base_types(&base_list, ctx.source) {
                let dep_kind = if looks_like_interface(&base) {
                    DependencyKind::Implements
                } else {
                    DependencyKind::Inherits
                };
                ctx.result.dependencies.push(RawDependency::new(
                    qualified.clone(),
                    base,
                    dep_kind,
                    start_line,
                ));
            }
        }

        let mut symbol = Symbol::new(&name, kind, start_line);
        symbol.end_line = node.end_position().row + 1;
        symbol.is_exported = is_public;
        symbol.visibility = declared_visibility(node, ctx.source);
        symbol.qualified_name = Some(qualified.clone());
        ctx.result.symbols.push(symbol);

        if is_public {
            ctx.result.exports.push(Export {
                name: name.clone(),
                line: start_line,
                kind: ExportKind::Named,
            });
        }

        if let Some(body) = node.child_by_field_name("body") {
            self.extract_body_members(&body, ctx, &qualified, namespace);
        }
    }

    fn extract_body_members(
        &self,
        body: &tree_sitter::Node,
        ctx: &mut ExtractCtx,
        class_qualified: &str,
        namespace: Option<&str>,
    ) {
        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            match child.kind() {
                "method_declaration" | "constructor_declaration" => {
                    self.extract_method(&child, ctx, class_qualified);
                }
                "field_declaration" => {
                    extract_field(&child, ctx, class_qualified);
                }
                "property_declaration" => {
                    extract_auto_property(&child, ctx, class_qualified);
                }
                "class_declaration" | "struct_declaration" | "record_declaration" => {
                    // Nested type: qualify under the outer class
                    let outer = Some(class_qualified);
                    self.extract_class(&child, ctx, outer, SymbolKind::Class);
                }
                "interface_declaration" => {
                    self.extract_class(&child, ctx, Some(class_qualified), SymbolKind::Interface);
                }
                "enum_declaration" => {
                    self.extract_enum(&child, ctx, namespace);
                }
                _ => {}
            }
        }
    }

    fn extract_method(&self, node: &tree_sitter::Node, ctx: &mut ExtractCtx, class_qualified: &str) {
        let Some(name) = node_field_text(node, "name", ctx.source) else {
            return;
        };

        let mut symbol = Symbol::new(&name, SymbolKind::Method, node.start_position().row + 1);
        symbol.end_line = node.end_position().row + 1;
        symbol.visibility = declared_visibility(node, ctx.source);
        symbol.qualified_name = Some(format!("{}.{}", class_qualified, name));
        symbol.signature = method_signature(node, ctx.source);
        ctx.result.symbols.push(symbol);
    }

    fn extract_enum(&self, node: &tree_sitter::Node, ctx: &mut ExtractCtx, namespace: Option<&str>) {
        let Some(name) = node_field_text(node, "name", ctx.source) else {
            return;
        };

        let mut symbol = Symbol::new(&name, SymbolKind::Enum, node.start_position().row + 1);
        symbol.end_line = node.end_position().row + 1;
        symbol.is_exported = has_modifier(node, ctx.source, "public");
        symbol.qualified_name = Some(qualify(namespace, &name));
        ctx.result.symbols.push(symbol);
    }
}

impl LanguageParser for CSharpParser {
    fn languages(&self) -> &[Language] {
        &[Language::CSharp]
    }

    fn parse(
        &self,
        path: &Path,
        source: &str,
        _options: &ParseOptions,
    ) -> Result<ParseResult, ParseError> {
        let tree = self.parse_tree(source)?;
        let mut result = ParseResult::new(path, Language::CSharp);
        collect_syntax_errors(&tree, &mut result.errors);
        self.extract(&tree, source, &mut result);
        result.symbols.sort_by_key(|s| s.start_line);
        Ok(result)
    }
}

// ── Fields and properties ───────────────────────────────────────────────────

/// Extract a field declaration. The signature records the declared type and,
/// when an initializer constructs a concrete type, that type too; the
/// resolver reads both when building the field-type map.
fn extract_field(node: &tree_sitter::Node, ctx: &mut ExtractCtx, class_qualified: &str) {
    let Some(var_decl) = find_child_by_kind(node, "variable_declaration") else {
        return;
    };
    let Some(ty) = node_field_text(&var_decl, "type", ctx.source) else {
        return;
    };
    let visibility = declared_visibility(node, ctx.source);

    let mut cursor = var_decl.walk();
    for child in var_decl.children(&mut cursor) {
        if child.kind() != "variable_declarator" {
            continue;
        }
        let Some(name) = declarator_name(&child, ctx.source) else {
            continue;
        };

        let mut signature = format!("{} {}", ty, name);
        if let Some(initializer_type) = initializer_concrete_type(&child, ctx.source) {
            signature.push_str(&format!(" = new {}()", initializer_type));
        }

        let mut symbol = Symbol::new(&name, SymbolKind::Property, node.start_position().row + 1);
        symbol.end_line = node.end_position().row + 1;
        symbol.visibility = visibility;
        symbol.qualified_name = Some(format!("{}.{}", class_qualified, name));
        symbol.signature = Some(signature);
        ctx.result.symbols.push(symbol);
    }
}

fn extract_auto_property(node: &tree_sitter::Node, ctx: &mut ExtractCtx, class_qualified: &str) {
    let (Some(ty), Some(name)) = (
        node_field_text(node, "type", ctx.source),
        node_field_text(node, "name", ctx.source),
    ) else {
        return;
    };

    let mut symbol = Symbol::new(&name, SymbolKind::Property, node.start_position().row + 1);
    symbol.end_line = node.end_position().row + 1;
    symbol.visibility = declared_visibility(node, ctx.source);
    symbol.qualified_name = Some(format!("{}.{}", class_qualified, name));
    symbol.signature = Some(format!("{} {}", ty, name));
    ctx.result.symbols.push(symbol);
}

/// Field name: the `name` field when the grammar exposes it, else the first
/// identifier child.
fn declarator_name(declarator: &tree_sitter::Node, source: &str) -> Option<String> {
    if let Some(name) = node_field_text(declarator, "name", source) {
        return Some(name);
    }
    let mut cursor = declarator.walk();
    let result = declarator
        .children(&mut cursor)
        .find(|c| c.kind() == "identifier")
        .and_then(|c| node_text(&c, source));
    result
}

/// Concrete type from a `= new TypeName(...)` initializer, if present. The
/// creation expression sits under an equals_value_clause in the declarator.
fn initializer_concrete_type(declarator: &tree_sitter::Node, source: &str) -> Option<String> {
    let mut cursor = declarator.walk();
    for child in declarator.children(&mut cursor) {
        let creation = if child.kind() == "object_creation_expression" {
            Some(child)
        } else {
            find_child_by_kind(&child, "object_creation_expression")
        };
        if let Some(creation) = creation {
            return node_field_text(&creation, "type", source).map(|t| strip_generics(&t));
        }
    }
    None
}

// ── Using directives ────────────────────────────────────────────────────────

fn extract_using(node: &tree_sitter::Node, ctx: &mut ExtractCtx) {
    let mut full_path = String::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if matches!(child.kind(), "qualified_name" | "identifier") {
            full_path = extract_qualified_name(&child, ctx.source);
        }
    }

    if full_path.is_empty() {
        return;
    }

    let imported_name = full_path
        .rsplit('.')
        .next()
        .unwrap_or(&full_path)
        .to_string();

    ctx.result.imports.push(Import {
        source: full_path,
        kind: ImportKind::Namespace,
        imported_names: vec![imported_name],
        line: node.start_position().row + 1,
    });
}

// ── Call extraction (second pass) ───────────────────────────────────────────

struct CallWalker<'a> {
    source: &'a str,
    result: &'a mut ParseResult,
    file_namespace: Option<String>,
}

struct ClassScope {
    name: String,
    qualified: String,
    field_names: HashSet<String>,
}

impl<'a> CallWalker<'a> {
    fn walk(
        &mut self,
        cursor: &mut TreeCursor,
        current_class: Option<&ClassScope>,
        current_anchor: Option<&str>,
    ) {
        let node = cursor.node();

        match node.kind() {
            "class_declaration" | "struct_declaration" | "record_declaration"
            | "interface_declaration" => {
                if let Some(name) = node_field_text(&node, "name", self.source) {
                    let qualified = enclosing_qualified_name(
                        cursor,
                        &name,
                        self.source,
                        self.file_namespace.as_deref(),
                    );
                    let scope = ClassScope {
                        field_names: collect_field_names(&node, self.source),
                        name,
                        qualified,
                    };
                    self.walk_children(cursor, Some(&scope), current_anchor);
                    return;
                }
            }
            "method_declaration" | "constructor_declaration" => {
                if let Some(name) = node_field_text(&node, "name", self.source) {
                    let anchor = match current_class {
                        Some(cls) => format!("{}.{}", cls.qualified, name),
                        None => name,
                    };
                    self.walk_children(cursor, current_class, Some(&anchor));
                    return;
                }
            }
            "invocation_expression" => {
                if let Some(anchor) = current_anchor {
                    self.record_invocation(&node, anchor, current_class);
                }
            }
            "object_creation_expression" => {
                if let Some(anchor) = current_anchor {
                    if let Some(ty) = node_field_text(&node, "type", self.source) {
                        self.result.dependencies.push(RawDependency::new(
                            anchor,
                            strip_generics(&ty),
                            DependencyKind::References,
                            node.start_position().row + 1,
                        ));
                    }
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
        current_anchor: Option<&str>,
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

    fn record_invocation(
        &mut self,
        node: &tree_sitter::Node,
        anchor: &str,
        current_class: Option<&ClassScope>,
    ) {
        let Some(function) = node.child_by_field_name("function") else {
            return;
        };
        let line = node.start_position().row + 1;

        match function.kind() {
            "identifier" => {
                // Bare call: a method on the enclosing class or a local function
                let Some(name) = node_text(&function, self.source) else {
                    return;
                };
                let mut dep = RawDependency::new(anchor, name, DependencyKind::Calls, line);
                if let Some(cls) = current_class {
                    dep.resolved_class = Some(cls.name.clone());
                }
                self.result.dependencies.push(dep);
            }
            "member_access_expression" => {
                let (Some(receiver), Some(method)) = (
                    function.child_by_field_name("expression"),
                    function
                        .child_by_field_name("name")
                        .and_then(|n| node_text(&n, self.source)),
                ) else {
                    return;
                };
                let Some(receiver_text) = node_text(&receiver, self.source) else {
                    return;
                };

                if receiver_text == "this" {
                    let mut dep = RawDependency::new(anchor, method, DependencyKind::Calls, line);
                    dep.calling_object = Some("this".to_string());
                    if let Some(cls) = current_class {
                        dep.resolved_class = Some(cls.name.clone());
                    }
                    self.result.dependencies.push(dep);
                    return;
                }

                let target = format!("{}.{}", receiver_text, method);
                let mut dep = RawDependency::new(anchor, target, DependencyKind::Calls, line);
                dep.calling_object = Some(receiver_text.clone());

                // Receiver is a field of the enclosing class: attach the
                // field-call context the resolver binds through the type map
                if receiver.kind() == "identifier" {
                    let is_field = current_class
                        .map(|cls| cls.field_names.contains(&receiver_text))
                        .unwrap_or(false);
                    if is_field || receiver_text.starts_with('_') {
                        dep.qualified_context = Some(format!("field_call_{}", receiver_text));
                    }
                }

                self.result.dependencies.push(dep);
            }
            _ => {}
        }
    }
}

/// Field and property names declared directly on a class body.
fn collect_field_names(class_node: &tree_sitter::Node, source: &str) -> HashSet<String> {
    let mut names = HashSet::new();
    let Some(body) = class_node.child_by_field_name("body") else {
        return names;
    };

    let mut cursor = body.walk();
    for child in body.children(&mut cursor) {
        match child.kind() {
            "field_declaration" => {
                if let Some(var_decl) = find_child_by_kind(&child, "variable_declaration") {
                    let mut vc = var_decl.walk();
                    for declarator in var_decl.children(&mut vc) {
                        if declarator.kind() == "variable_declarator" {
                            if let Some(name) = node_field_text(&declarator, "name", source) {
                                names.insert(name);
                            }
                        }
                    }
                }
            }
            "property_declaration" => {
                if let Some(name) = node_field_text(&child, "name", source) {
                    names.insert(name);
                }
            }
            _ => {}
        }
    }

    names
}

// ── Free helper functions ───────────────────────────────────────────────────

fn node_field_text(node: &tree_sitter::Node, field: &str, source: &str) -> Option<String> {
    node.child_by_field_name(field)?
        .utf8_text(source.as_bytes())
        .ok()
        .map(|s| s.to_string())
}

fn qualify(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) => format!("{}.{}", ns, name),
        None => name.to_string(),
    }
}

/// Extract a fully qualified name from a qualified_name node
fn extract_qualified_name(node: &tree_sitter::Node, source: &str) -> String {
    match node.kind() {
        "qualified_name" => {
            let mut parts = Vec::new();
            if let Some(qualifier) = node.child_by_field_name("qualifier") {
                parts.push(extract_qualified_name(&qualifier, source));
            }
            if let Some(name) = node.child_by_field_name("name") {
                if let Ok(text) = name.utf8_text(source.as_bytes()) {
                    parts.push(text.to_string());
                }
            }
            parts.join(".")
        }
        _ => node.utf8_text(source.as_bytes()).unwrap_or("").to_string(),
    }
}

/// First file-scoped namespace declared at the top level, if any.
fn file_scoped_namespace(root: &tree_sitter::Node, source: &str) -> Option<String> {
    let mut cursor = root.walk();
    let result = root
        .children(&mut cursor)
        .find(|c| c.kind() == "file_scoped_namespace_declaration")
        .and_then(|n| n.child_by_field_name("name"))
        .map(|n| extract_qualified_name(&n, source));
    result
}

/// Walk up from a class declaration to build its namespace-qualified name.
/// A file-scoped namespace is not an ancestor, so it is supplied separately.
fn enclosing_qualified_name(
    cursor: &TreeCursor,
    class_name: &str,
    source: &str,
    file_namespace: Option<&str>,
) -> String {
    let mut parts = vec![class_name.to_string()];
    let mut saw_namespace = false;
    let mut temp = cursor.clone();
    while temp.goto_parent() {
        let parent = temp.node();
        match parent.kind() {
            "namespace_declaration" => {
                if let Some(ns) = parent
                    .child_by_field_name("name")
                    .map(|n| extract_qualified_name(&n, source))
                {
                    parts.insert(0, ns);
                    saw_namespace = true;
                }
            }
            "class_declaration" | "struct_declaration" | "record_declaration" => {
                if let Some(outer) = node_field_text(&parent, "name", source) {
                    if outer != class_name {
                        parts.insert(0, outer);
                    }
                }
            }
            _ => {}
        }
    }
    if !saw_namespace {
        if let Some(ns) = file_namespace {
            parts.insert(0, ns.to_string());
        }
    }
    parts.join(".")
}

/// Types named in a base_list (`: BaseClass, IInterface`), generics stripped.
fn base_types(node: &tree_sitter::Node, source: &str) -> Vec<String> {
    let mut types = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.is_named() {
            if let Some(text) = node_text(&child, source) {
                let trimmed = strip_generics(text.trim());
                if !trimmed.is_empty() {
                    types.push(trimmed);
                }
            }
        }
    }
    types
}

fn strip_generics(ty: &str) -> String {
    ty.split('<').next().unwrap_or(ty).trim().to_string()
}

/// `IFoo` convention: capital I followed by another capital.
fn looks_like_interface(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next() == Some('I') && chars.next().is_some_and(|c| c.is_ascii_uppercase())
}

fn has_modifier(node: &tree_sitter::Node, source: &str, modifier: &str) -> bool {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "modifier" {
            if node_text(&child, source).as_deref() == Some(modifier) {
                return true;
            }
        }
    }
    false
}

fn declared_visibility(node: &tree_sitter::Node, source: &str) -> Visibility {
    if has_modifier(node, source, "private") {
        Visibility::Private
    } else if has_modifier(node, source, "protected") {
        Visibility::Protected
    } else {
        Visibility::Public
    }
}

/// Return type + name + parameter list, single-line.
fn method_signature(node: &tree_sitter::Node, source: &str) -> Option<String> {
    let return_type = node_field_text(node, "returns", source)
        .or_else(|| node_field_text(node, "type", source));
    let name = node_field_text(node, "name", source)?;
    let params = node_field_text(node, "parameters", source).unwrap_or_else(|| "()".to_string());
    let params = params.split_whitespace().collect::<Vec<_>>().join(" ");

    Some(match return_type {
        Some(rt) => format!("{} {}{}", rt, name, params),
        None => format!("{}{}", name, params),
    })
}
