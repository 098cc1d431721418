//! TypeScript/JavaScript language parser using Tree-sitter
//!
//! Emits functions, classes with their methods, interfaces, enums, and
//! top-level variables, distinguishes named/default/namespace/side-effect
//! imports, and records member-expression call targets as dotted names
//! (`store.getAreas`). Object-literal methods are extracted as symbols so
//! store factories and helper objects resolve across files.

use super::{
    collect_syntax_errors, find_child_by_kind, node_text, DependencyKind, Export, ExportKind,
    Import, ImportKind, LanguageParser, ParseError, ParseOptions, ParseResult, RawDependency,
    Symbol, SymbolKind, Visibility,
};
use crate::language::Language;
use std::path::Path;
use tree_sitter::{Parser, Tree, TreeCursor};

/// Anchor for module-level statements; rewritten by the Vue parser to the
/// component symbol and otherwise dropped at resolution.
pub const MODULE_ANCHOR: &str = "<module>";

/// TypeScript language parser (also handles JavaScript and JSX/TSX)
pub struct TypeScriptParser {
    typescript: tree_sitter::Language,
    tsx: tree_sitter::Language,
}

impl Default for TypeScriptParser {
    fn default() -> Self {
        Self {
            typescript: tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            tsx: tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

struct ExtractCtx<'a> {
    source: &'a str,
    result: &'a mut ParseResult,
}

impl TypeScriptParser {
    pub fn new() -> Self {
        Self::default()
    }

    fn grammar_for(&self, path: &Path) -> &tree_sitter::Language {
        match path.extension().and_then(|e| e.to_str()) {
            Some("tsx") | Some("jsx") => &self.tsx,
            _ => &self.typescript,
        }
    }

    fn parse_tree(&self, path: &Path, source: &str) -> Result<Tree, ParseError> {
        let mut parser = Parser::new();
        parser
            .set_language(self.grammar_for(path))
            .map_err(|e| ParseError::TreeSitter(e.to_string()))?;
        parser
            .parse(source, None)
            .ok_or_else(|| ParseError::TreeSitter("failed to parse TypeScript source".to_string()))
    }

    /// Parse already-loaded source for a sibling parser (the Vue SFC parser
    /// delegates its script block here).
    pub fn parse_source(
        &self,
        path: &Path,
        source: &str,
        language: Language,
    ) -> Result<ParseResult, ParseError> {
        let tree = self.parse_tree(path, source)?;
        let mut result = ParseResult::new(path, language);
        collect_syntax_errors(&tree, &mut result.errors);

        let root_node = tree.root_node();
        let mut ctx = ExtractCtx {
            source,
            result: &mut result,
        };

        let mut cursor = root_node.walk();
        for child in root_node.children(&mut cursor) {
            extract_top_level(&child, &mut ctx, false);
        }

        let mut call_cursor = root_node.walk();
        let mut walker = CallWalker {
            source,
            result: &mut result,
        };
        walker.walk(&mut call_cursor, MODULE_ANCHOR);

        result.symbols.sort_by_key(|s| s.start_line);
        Ok(result)
    }
}

impl LanguageParser for TypeScriptParser {
    fn languages(&self) -> &[Language] {
        &[Language::TypeScript, Language::JavaScript]
    }

    fn parse(
        &self,
        path: &Path,
        source: &str,
        _options: &ParseOptions,
    ) -> Result<ParseResult, ParseError> {
        let language = Language::from_path(path).unwrap_or(Language::TypeScript);
        self.parse_source(path, source, language)
    }
}

// ── Declarations (first pass) ───────────────────────────────────────────────

fn extract_top_level(node: &tree_sitter::Node, ctx: &mut ExtractCtx, exported: bool) {
    match node.kind() {
        "import_statement" => extract_import(node, ctx),
        "export_statement" => extract_export(node, ctx),
        "function_declaration" | "generator_function_declaration" => {
            extract_function(node, ctx, exported);
        }
        "class_declaration" | "abstract_class_declaration" => {
            extract_class(node, ctx, exported);
        }
        "interface_declaration" => extract_interface(node, ctx, exported),
        "type_alias_declaration" => extract_type_alias(node, ctx, exported),
        "enum_declaration" => extract_enum(node, ctx, exported),
        "lexical_declaration" | "variable_declaration" => {
            extract_variable_declaration(node, ctx, exported);
        }
        _ => {}
    }
}

fn extract_import(node: &tree_sitter::Node, ctx: &mut ExtractCtx) {
    let Some(source_node) = node.child_by_field_name("source") else {
        return;
    };
    let Some(source) = string_content(&source_node, ctx.source) else {
        return;
    };
    let line = node.start_position().row + 1;

    let Some(clause) = find_child_by_kind(node, "import_clause") else {
        // `import './styles.css'`
        ctx.result.imports.push(Import {
            source,
            kind: ImportKind::SideEffect,
            imported_names: Vec::new(),
            line,
        });
        return;
    };

    let mut named = Vec::new();
    let mut default_name = None;
    let mut namespace_name = None;

    let mut cursor = clause.walk();
    for child in clause.children(&mut cursor) {
        match child.kind() {
            "identifier" => {
                default_name = node_text(&child, ctx.source);
            }
            "named_imports" => {
                let mut nc = child.walk();
                for spec in child.children(&mut nc) {
                    if spec.kind() == "import_specifier" {
                        // `{ a as b }` binds b locally
                        let bound = spec
                            .child_by_field_name("alias")
                            .or_else(|| spec.child_by_field_name("name"))
                            .and_then(|n| node_text(&n, ctx.source));
                        if let Some(name) = bound {
                            named.push(name);
                        }
                    }
                }
            }
            "namespace_import" => {
                let mut nc = child.walk();
                namespace_name = child
                    .children(&mut nc)
                    .find(|c| c.kind() == "identifier")
                    .and_then(|c| node_text(&c, ctx.source));
            }
            _ => {}
        }
    }

    if let Some(name) = default_name {
        ctx.result.imports.push(Import {
            source: source.clone(),
            kind: ImportKind::Default,
            imported_names: vec![name],
            line,
        });
    }
    if let Some(name) = namespace_name {
        ctx.result.imports.push(Import {
            source: source.clone(),
            kind: ImportKind::Namespace,
            imported_names: vec![name],
            line,
        });
    }
    if !named.is_empty() {
        ctx.result.imports.push(Import {
            source,
            kind: ImportKind::Named,
            imported_names: named,
            line,
        });
    }
}

fn extract_export(node: &tree_sitter::Node, ctx: &mut ExtractCtx) {
    let line = node.start_position().row + 1;

    // `export { a, b } from './x'` and `export { a, b }`
    if let Some(clause) = find_child_by_kind(node, "export_clause") {
        let is_reexport = node.child_by_field_name("source").is_some();
        let mut cursor = clause.walk();
        for spec in clause.children(&mut cursor) {
            if spec.kind() == "export_specifier" {
                let exported_name = spec
                    .child_by_field_name("alias")
                    .or_else(|| spec.child_by_field_name("name"))
                    .and_then(|n| node_text(&n, ctx.source));
                if let Some(name) = exported_name {
                    ctx.result.exports.push(Export {
                        name,
                        line,
                        kind: if is_reexport {
                            ExportKind::ReExport
                        } else {
                            ExportKind::Named
                        },
                    });
                }
            }
        }
        // Re-exports also record the import side so the file graph sees them
        if is_reexport {
            if let Some(source) = node
                .child_by_field_name("source")
                .and_then(|s| string_content(&s, ctx.source))
            {
                ctx.result.imports.push(Import {
                    source,
                    kind: ImportKind::Named,
                    imported_names: Vec::new(),
                    line,
                });
            }
        }
        return;
    }

    // `export default <expr>` without a declaration child
    let has_default = {
        let mut cursor = node.walk();
        let result = node
            .children(&mut cursor)
            .any(|c| !c.is_named() && node_text(&c, ctx.source).as_deref() == Some("default"));
        result
    };

    if let Some(declaration) = node.child_by_field_name("declaration") {
        let before = ctx.result.symbols.len();
        extract_top_level(&declaration, ctx, true);
        // Default-exported declarations also surface under "default"
        if has_default {
            if let Some(symbol) = ctx.result.symbols.get(before) {
                ctx.result.exports.push(Export {
                    name: symbol.name.clone(),
                    line,
                    kind: ExportKind::Default,
                });
            }
        }
        return;
    }

    if has_default {
        ctx.result.exports.push(Export {
            name: "default".to_string(),
            line,
            kind: ExportKind::Default,
        });
    }
}

fn extract_function(node: &tree_sitter::Node, ctx: &mut ExtractCtx, exported: bool) {
    let Some(name) = node_text_field(node, "name", ctx.source) else {
        return;
    };

    let mut symbol = Symbol::new(&name, SymbolKind::Function, node.start_position().row + 1);
    symbol.end_line = node.end_position().row + 1;
    symbol.is_exported = exported;
    symbol.signature = signature_of(node, ctx.source);
    ctx.result.symbols.push(symbol);

    if exported {
        ctx.result.exports.push(Export {
            name,
            line: node.start_position().row + 1,
            kind: ExportKind::Named,
        });
    }
}

fn extract_class(node: &tree_sitter::Node, ctx: &mut ExtractCtx, exported: bool) {
    let Some(name) = node_text_field(node, "name", ctx.source) else {
        return;
    };
    let start_line = node.start_position().row + 1;

    // extends / implements
    if let Some(heritage) = find_child_by_kind(node, "class_heritage") {
        let mut cursor = heritage.walk();
        for clause in heritage.children(&mut cursor) {
            match clause.kind() {
                "extends_clause" => {
                    let mut cc = clause.walk();
                    for base in clause.children(&mut cc) {
                        if matches!(base.kind(), "identifier" | "member_expression") {
                            if let Some(base_name) = node_text(&base, ctx.source) {
                                ctx.result.dependencies.push(RawDependency::new(
                                    name.clone(),
                                    base_name,
                                    DependencyKind::Inherits,
                                    start_line,
                                ));
                            }
                        }
                    }
                }
                "implements_clause" => {
                    let mut cc = clause.walk();
                    for iface in clause.children(&mut cc) {
                        if matches!(iface.kind(), "type_identifier" | "generic_type") {
                            if let Some(iface_name) = node_text(&iface, ctx.source) {
                                let iface_name =
                                    iface_name.split('<').next().unwrap_or(&iface_name);
                                ctx.result.dependencies.push(RawDependency::new(
                                    name.clone(),
                                    iface_name,
                                    DependencyKind::Implements,
                                    start_line,
                                ));
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }

    let mut symbol = Symbol::new(&name, SymbolKind::Class, start_line);
    symbol.end_line = node.end_position().row + 1;
    symbol.is_exported = exported;
    ctx.result.symbols.push(symbol);

    if exported {
        ctx.result.exports.push(Export {
            name: name.clone(),
            line: start_line,
            kind: ExportKind::Named,
        });
    }

    // Methods
    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            if member.kind() == "method_definition" {
                if let Some(method_name) = node_text_field(&member, "name", ctx.source) {
                    let mut method =
                        Symbol::new(&method_name, SymbolKind::Method, member.start_position().row + 1);
                    method.end_line = member.end_position().row + 1;
                    method.qualified_name = Some(format!("{}.{}", name, method_name));
                    method.signature = signature_of(&member, ctx.source);
                    method.visibility = member_visibility(&member, ctx.source);
                    ctx.result.symbols.push(method);
                }
            }
        }
    }
}

fn extract_interface(node: &tree_sitter::Node, ctx: &mut ExtractCtx, exported: bool) {
    let Some(name) = node_text_field(node, "name", ctx.source) else {
        return;
    };

    let mut symbol = Symbol::new(&name, SymbolKind::Interface, node.start_position().row + 1);
    symbol.end_line = node.end_position().row + 1;
    symbol.is_exported = exported;
    ctx.result.symbols.push(symbol);

    if exported {
        ctx.result.exports.push(Export {
            name,
            line: node.start_position().row + 1,
            kind: ExportKind::Named,
        });
    }
}

fn extract_type_alias(node: &tree_sitter::Node, ctx: &mut ExtractCtx, exported: bool) {
    let Some(name) = node_text_field(node, "name", ctx.source) else {
        return;
    };

    let mut symbol = Symbol::new(&name, SymbolKind::Variable, node.start_position().row + 1);
    symbol.end_line = node.end_position().row + 1;
    symbol.is_exported = exported;
    ctx.result.symbols.push(symbol);

    if exported {
        ctx.result.exports.push(Export {
            name,
            line: node.start_position().row + 1,
            kind: ExportKind::Named,
        });
    }
}

fn extract_enum(node: &tree_sitter::Node, ctx: &mut ExtractCtx, exported: bool) {
    let Some(name) = node_text_field(node, "name", ctx.source) else {
        return;
    };

    let mut symbol = Symbol::new(&name, SymbolKind::Enum, node.start_position().row + 1);
    symbol.end_line = node.end_position().row + 1;
    symbol.is_exported = exported;
    ctx.result.symbols.push(symbol);

    if exported {
        ctx.result.exports.push(Export {
            name,
            line: node.start_position().row + 1,
            kind: ExportKind::Named,
        });
    }
}

fn extract_variable_declaration(node: &tree_sitter::Node, ctx: &mut ExtractCtx, exported: bool) {
    let is_const = {
        let mut cursor = node.walk();
        let result = node
            .children(&mut cursor)
            .any(|c| !c.is_named() && node_text(&c, ctx.source).as_deref() == Some("const"));
        result
    };

    let mut cursor = node.walk();
    for declarator in node.children(&mut cursor) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        let Some(name) = node_text_field(&declarator, "name", ctx.source) else {
            continue;
        };
        let start_line = declarator.start_position().row + 1;
        let value = declarator.child_by_field_name("value");

        let kind = match value.as_ref().map(|v| v.kind()) {
            Some("arrow_function" | "function_expression" | "generator_function") => {
                SymbolKind::Function
            }
            _ if is_const => SymbolKind::Constant,
            _ => SymbolKind::Variable,
        };

        let mut symbol = Symbol::new(&name, kind, start_line);
        symbol.end_line = declarator.end_position().row + 1;
        symbol.is_exported = exported;
        ctx.result.symbols.push(symbol);

        if exported {
            ctx.result.exports.push(Export {
                name: name.clone(),
                line: start_line,
                kind: ExportKind::Named,
            });
        }

        // Methods declared on object-literal values (helper objects, store
        // definitions) become symbols so cross-file dotted calls can land
        if let Some(value) = value {
            extract_object_methods(&value, ctx, &name, 0);
        }
    }
}

/// Recursively extract function-valued properties from object literals,
/// qualifying them under the owning variable's name. Depth-limited; store
/// factories nest actions one level down.
fn extract_object_methods(
    value: &tree_sitter::Node,
    ctx: &mut ExtractCtx,
    owner: &str,
    depth: usize,
) {
    if depth > 3 {
        return;
    }

    match value.kind() {
        "object" => {
            let mut cursor = value.walk();
            for pair in value.children(&mut cursor) {
                match pair.kind() {
                    "pair" => {
                        let Some(key) = pair
                            .child_by_field_name("key")
                            .and_then(|k| node_text(&k, ctx.source))
                        else {
                            continue;
                        };
                        let key = key.trim_matches(|c| c == '"' || c == '\'').to_string();
                        let Some(val) = pair.child_by_field_name("value") else {
                            continue;
                        };
                        if matches!(val.kind(), "arrow_function" | "function_expression") {
                            push_object_method(ctx, owner, &key, &pair);
                        } else {
                            extract_object_methods(&val, ctx, owner, depth + 1);
                        }
                    }
                    "method_definition" => {
                        if let Some(key) = node_text_field(&pair, "name", ctx.source) {
                            push_object_method(ctx, owner, &key, &pair);
                        }
                    }
                    _ => {}
                }
            }
        }
        "call_expression" => {
            // defineStore('x', { ... }) and friends: descend into arguments
            if let Some(args) = value.child_by_field_name("arguments") {
                let mut cursor = args.walk();
                for arg in args.children(&mut cursor) {
                    if arg.kind() == "object" {
                        extract_object_methods(&arg, ctx, owner, depth + 1);
                    }
                }
            }
        }
        _ => {}
    }
}

fn push_object_method(ctx: &mut ExtractCtx, owner: &str, name: &str, node: &tree_sitter::Node) {
    let mut method = Symbol::new(name, SymbolKind::Method, node.start_position().row + 1);
    method.end_line = node.end_position().row + 1;
    method.qualified_name = Some(format!("{}.{}", owner, name));
    ctx.result.symbols.push(method);
}

// ── Calls (second pass) ─────────────────────────────────────────────────────

struct CallWalker<'a> {
    source: &'a str,
    result: &'a mut ParseResult,
}

impl<'a> CallWalker<'a> {
    fn walk(&mut self, cursor: &mut TreeCursor, anchor: &str) {
        let node = cursor.node();

        let new_anchor: Option<String> = match node.kind() {
            "function_declaration" | "generator_function_declaration" | "method_definition" => {
                node_text_field(&node, "name", self.source)
            }
            "variable_declarator" => {
                let is_function_value = node
                    .child_by_field_name("value")
                    .map(|v| matches!(v.kind(), "arrow_function" | "function_expression"))
                    .unwrap_or(false);
                if is_function_value {
                    node_text_field(&node, "name", self.source)
                } else {
                    None
                }
            }
            "pair" => {
                let is_function_value = node
                    .child_by_field_name("value")
                    .map(|v| matches!(v.kind(), "arrow_function" | "function_expression"))
                    .unwrap_or(false);
                if is_function_value {
                    node.child_by_field_name("key")
                        .and_then(|k| node_text(&k, self.source))
                        .map(|k| k.trim_matches(|c| c == '"' || c == '\'').to_string())
                } else {
                    None
                }
            }
            _ => None,
        };
        let anchor_for_children = new_anchor.as_deref().unwrap_or(anchor);

        match node.kind() {
            "call_expression" => {
                self.record_call(&node, anchor_for_children);
            }
            "new_expression" => {
                if let Some(ctor) = node
                    .child_by_field_name("constructor")
                    .and_then(|c| node_text(&c, self.source))
                {
                    self.result.dependencies.push(RawDependency::new(
                        anchor_for_children,
                        ctor,
                        DependencyKind::References,
                        node.start_position().row + 1,
                    ));
                }
            }
            _ => {}
        }

        if cursor.goto_first_child() {
            loop {
                self.walk(cursor, anchor_for_children);
                if !cursor.goto_next_sibling() {
                    break;
                }
            }
            cursor.goto_parent();
        }
    }

    fn record_call(&mut self, node: &tree_sitter::Node, anchor: &str) {
        let Some(function) = node.child_by_field_name("function") else {
            return;
        };
        let line = node.start_position().row + 1;

        match function.kind() {
            "identifier" => {
                let Some(name) = node_text(&function, self.source) else {
                    return;
                };
                self.result
                    .dependencies
                    .push(RawDependency::new(anchor, name, DependencyKind::Calls, line));
            }
            "member_expression" => {
                let (Some(object), Some(property)) = (
                    function.child_by_field_name("object"),
                    function
                        .child_by_field_name("property")
                        .and_then(|p| node_text(&p, self.source)),
                ) else {
                    return;
                };
                // Only single-identifier receivers produce dotted targets;
                // chained expressions are not resolvable without types
                if object.kind() == "identifier" {
                    let Some(receiver) = node_text(&object, self.source) else {
                        return;
                    };
                    let mut dep = RawDependency::new(
                        anchor,
                        format!("{}.{}", receiver, property),
                        DependencyKind::Calls,
                        line,
                    );
                    dep.calling_object = Some(receiver);
                    self.result.dependencies.push(dep);
                } else if object.kind() == "this" {
                    let mut dep =
                        RawDependency::new(anchor, property, DependencyKind::Calls, line);
                    dep.calling_object = Some("this".to_string());
                    self.result.dependencies.push(dep);
                }
            }
            _ => {}
        }
    }
}

// ── Free helper functions ───────────────────────────────────────────────────

fn node_text_field(node: &tree_sitter::Node, field: &str, source: &str) -> Option<String> {
    node.child_by_field_name(field)
        .and_then(|n| node_text(&n, source))
}

/// Unquoted content of a string literal node.
fn string_content(node: &tree_sitter::Node, source: &str) -> Option<String> {
    let text = node_text(node, source)?;
    Some(
        text.trim_matches(|c| c == '"' || c == '\'' || c == '`')
            .to_string(),
    )
}

fn signature_of(node: &tree_sitter::Node, source: &str) -> Option<String> {
    let text = node_text(node, source)?;
    let head = text.split('{').next().unwrap_or(&text).trim();
    Some(head.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn member_visibility(node: &tree_sitter::Node, source: &str) -> Visibility {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "accessibility_modifier" {
            return match node_text(&child, source).as_deref() {
                Some("private") => Visibility::Private,
                Some("protected") => Visibility::Protected,
                _ => Visibility::Public,
            };
        }
    }
    Visibility::Public
}
