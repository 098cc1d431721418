//! Tests for TypeScript/JavaScript symbol, import/export, and call extraction.

use compass_core::parser::typescript::TypeScriptParser;
use compass_core::parser::{
    DependencyKind, ExportKind, ImportKind, LanguageParser, ParseOptions, SymbolKind,
};
use std::path::PathBuf;

fn parse(source: &str) -> compass_core::parser::ParseResult {
    let parser = TypeScriptParser::new();
    parser
        .parse(
            &PathBuf::from("/repo/src/app.ts"),
            source,
            &ParseOptions::default(),
        )
        .unwrap()
}

// ── Imports ────────────────────────────────────────────────────────────────

#[test]
fn test_named_import() {
    let result = parse("import { helper, format } from './util';\n");

    assert_eq!(result.imports.len(), 1);
    let import = &result.imports[0];
    assert_eq!(import.kind, ImportKind::Named);
    assert_eq!(import.source, "./util");
    assert_eq!(
        import.imported_names,
        vec!["helper".to_string(), "format".to_string()]
    );
}

#[test]
fn test_default_import() {
    let result = parse("import axios from 'axios';\n");

    assert_eq!(result.imports[0].kind, ImportKind::Default);
    assert_eq!(result.imports[0].imported_names, vec!["axios".to_string()]);
}

#[test]
fn test_namespace_import() {
    let result = parse("import * as utils from './utils';\n");

    assert_eq!(result.imports[0].kind, ImportKind::Namespace);
    assert_eq!(result.imports[0].imported_names, vec!["utils".to_string()]);
}

#[test]
fn test_side_effect_import() {
    let result = parse("import './styles.css';\n");

    assert_eq!(result.imports[0].kind, ImportKind::SideEffect);
    assert!(result.imports[0].imported_names.is_empty());
}

#[test]
fn test_aliased_named_import_binds_alias() {
    let result = parse("import { helper as h } from './util';\n");

    assert_eq!(result.imports[0].imported_names, vec!["h".to_string()]);
}

// ── Exports ────────────────────────────────────────────────────────────────

#[test]
fn test_exported_function() {
    let result = parse("export function greet(name: string): string { return name; }\n");

    let symbol = result.symbols.iter().find(|s| s.name == "greet").unwrap();
    assert_eq!(symbol.kind, SymbolKind::Function);
    assert!(symbol.is_exported);
    assert!(result
        .exports
        .iter()
        .any(|e| e.name == "greet" && e.kind == ExportKind::Named));
}

#[test]
fn test_export_clause_and_reexport() {
    let result = parse("const a = 1;\nexport { a };\nexport { b } from './other';\n");

    assert!(result
        .exports
        .iter()
        .any(|e| e.name == "a" && e.kind == ExportKind::Named));
    assert!(result
        .exports
        .iter()
        .any(|e| e.name == "b" && e.kind == ExportKind::ReExport));
}

#[test]
fn test_default_export_of_declaration() {
    let result = parse("export default function main() {}\n");

    assert!(result.symbols.iter().any(|s| s.name == "main"));
    assert!(result.exports.iter().any(|e| e.kind == ExportKind::Default));
}

// ── Declarations ───────────────────────────────────────────────────────────

#[test]
fn test_class_with_methods() {
    let result = parse(
        "export class Cart {\n  add(item: Item) {}\n  private total(): number { return 0; }\n}\n",
    );

    let class = result
        .symbols
        .iter()
        .find(|s| s.kind == SymbolKind::Class)
        .unwrap();
    assert_eq!(class.name, "Cart");

    let add = result.symbols.iter().find(|s| s.name == "add").unwrap();
    assert_eq!(add.kind, SymbolKind::Method);
    assert_eq!(add.qualified_name.as_deref(), Some("Cart.add"));
}

#[test]
fn test_arrow_function_const_is_function() {
    let result = parse("export const fetchUsers = async () => {};\n");

    let symbol = result.symbols.iter().find(|s| s.name == "fetchUsers").unwrap();
    assert_eq!(symbol.kind, SymbolKind::Function);
}

#[test]
fn test_class_heritage_dependencies() {
    let result = parse("class Admin extends User implements Auditable {}\n");

    assert!(result
        .dependencies
        .iter()
        .any(|d| d.kind == DependencyKind::Inherits && d.target == "User"));
    assert!(result
        .dependencies
        .iter()
        .any(|d| d.kind == DependencyKind::Implements && d.target == "Auditable"));
}

#[test]
fn test_object_literal_methods_become_symbols() {
    let result = parse(
        "export const helper = {\n  format(value: string) { return value; },\n  parse: (raw: string) => raw,\n};\n",
    );

    let format = result.symbols.iter().find(|s| s.name == "format").unwrap();
    assert_eq!(format.kind, SymbolKind::Method);
    assert_eq!(format.qualified_name.as_deref(), Some("helper.format"));

    let parse_sym = result.symbols.iter().find(|s| s.name == "parse").unwrap();
    assert_eq!(parse_sym.qualified_name.as_deref(), Some("helper.parse"));
}

#[test]
fn test_store_factory_actions_become_symbols() {
    let result = parse(
        "export const useAreasStore = defineStore('areas', {\n  actions: {\n    getAreas() { return []; },\n  },\n});\n",
    );

    let action = result.symbols.iter().find(|s| s.name == "getAreas").unwrap();
    assert_eq!(action.kind, SymbolKind::Method);
    assert_eq!(
        action.qualified_name.as_deref(),
        Some("useAreasStore.getAreas")
    );
}

// ── Calls ──────────────────────────────────────────────────────────────────

#[test]
fn test_plain_call_inside_function() {
    let result = parse("function run() { helper(); }\n");

    let call = result
        .dependencies
        .iter()
        .find(|d| d.kind == DependencyKind::Calls)
        .unwrap();
    assert_eq!(call.target, "helper");
    assert_eq!(call.from_symbol, "run");
}

#[test]
fn test_member_call_records_dotted_target() {
    let result = parse("function load() { store.getAreas(); }\n");

    let call = result
        .dependencies
        .iter()
        .find(|d| d.target == "store.getAreas")
        .expect("dotted call target");
    assert_eq!(call.calling_object.as_deref(), Some("store"));
}

#[test]
fn test_new_expression_records_reference() {
    let result = parse("function build() { return new Cart(); }\n");

    assert!(result
        .dependencies
        .iter()
        .any(|d| d.kind == DependencyKind::References && d.target == "Cart"));
}

#[test]
fn test_calls_anchored_to_arrow_function_const() {
    let result = parse("const load = () => { helper(); };\n");

    let call = result
        .dependencies
        .iter()
        .find(|d| d.target == "helper")
        .unwrap();
    assert_eq!(call.from_symbol, "load");
}
