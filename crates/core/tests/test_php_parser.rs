//! Tests for PHP symbol, import, and raw-dependency extraction.

use compass_core::parser::{
    DependencyKind, ImportKind, LanguageParser, ParseOptions, SymbolKind, Visibility,
};
use compass_core::parser::php::PhpParser;
use std::path::PathBuf;

fn parse(source: &str) -> compass_core::parser::ParseResult {
    let parser = PhpParser::new();
    parser
        .parse(
            &PathBuf::from("/repo/app/Services/FileService.php"),
            source,
            &ParseOptions::default(),
        )
        .unwrap()
}

// ── Declarations ───────────────────────────────────────────────────────────

#[test]
fn test_namespace_and_class_qualified_names() {
    let result = parse(
        "<?php\nnamespace App\\Services;\n\nclass FileService\n{\n    public function store() {}\n}\n",
    );

    let namespace = result
        .symbols
        .iter()
        .find(|s| s.kind == SymbolKind::Namespace)
        .expect("namespace symbol");
    assert_eq!(namespace.name, "App\\Services");

    let class = result
        .symbols
        .iter()
        .find(|s| s.kind == SymbolKind::Class)
        .expect("class symbol");
    assert_eq!(class.name, "FileService");
    assert_eq!(
        class.qualified_name.as_deref(),
        Some("App\\Services\\FileService")
    );
    assert!(class.is_exported);

    let method = result
        .symbols
        .iter()
        .find(|s| s.kind == SymbolKind::Method)
        .expect("method symbol");
    assert_eq!(method.name, "store");
    assert_eq!(
        method.qualified_name.as_deref(),
        Some("App\\Services\\FileService::store")
    );
}

#[test]
fn test_method_visibility() {
    let result = parse(
        "<?php\nclass C {\n    public function a() {}\n    protected function b() {}\n    private function c() {}\n}\n",
    );

    let vis: Vec<Visibility> = result
        .symbols
        .iter()
        .filter(|s| s.kind == SymbolKind::Method)
        .map(|s| s.visibility)
        .collect();
    assert_eq!(
        vis,
        vec![Visibility::Public, Visibility::Protected, Visibility::Private]
    );
}

#[test]
fn test_property_types_recorded_in_signature() {
    let result = parse(
        "<?php\nclass C {\n    private FileRepository $files;\n}\n",
    );

    let prop = result
        .symbols
        .iter()
        .find(|s| s.kind == SymbolKind::Property)
        .expect("property symbol");
    assert_eq!(prop.name, "files");
    assert_eq!(prop.signature.as_deref(), Some("FileRepository $files"));
}

#[test]
fn test_inherits_and_implements_dependencies() {
    let result = parse(
        "<?php\nnamespace App\\Models;\nclass User extends Model implements Searchable {}\n",
    );

    let inherits: Vec<_> = result
        .dependencies
        .iter()
        .filter(|d| d.kind == DependencyKind::Inherits)
        .collect();
    assert_eq!(inherits.len(), 1);
    assert_eq!(inherits[0].target, "Model");
    assert_eq!(inherits[0].from_symbol, "App\\Models\\User");

    let implements: Vec<_> = result
        .dependencies
        .iter()
        .filter(|d| d.kind == DependencyKind::Implements)
        .collect();
    assert_eq!(implements.len(), 1);
    assert_eq!(implements[0].target, "Searchable");
}

// ── Use imports ────────────────────────────────────────────────────────────

#[test]
fn test_use_statement_binds_last_segment() {
    let result = parse("<?php\nuse App\\Models\\User;\n");

    assert_eq!(result.imports.len(), 1);
    let import = &result.imports[0];
    assert_eq!(import.source, "App\\Models\\User");
    assert_eq!(import.kind, ImportKind::Named);
    assert_eq!(import.imported_names, vec!["User".to_string()]);
}

#[test]
fn test_use_alias_binds_alias() {
    let result = parse("<?php\nuse App\\Models\\User as Account;\n");

    assert_eq!(result.imports[0].imported_names, vec!["Account".to_string()]);
    assert_eq!(result.imports[0].source, "App\\Models\\User");
}

#[test]
fn test_group_use_expands_prefix() {
    let result = parse("<?php\nuse App\\Models\\{User, Order};\n");

    assert_eq!(result.imports.len(), 2);
    let sources: Vec<&str> = result.imports.iter().map(|i| i.source.as_str()).collect();
    assert!(sources.contains(&"App\\Models\\User"));
    assert!(sources.contains(&"App\\Models\\Order"));
}

// ── Calls ──────────────────────────────────────────────────────────────────

#[test]
fn test_static_call_target() {
    let result = parse(
        "<?php\nnamespace App\\Services;\nclass Foo {\n    public function run() {\n        Bar::baz();\n    }\n}\n",
    );

    let call = result
        .dependencies
        .iter()
        .find(|d| d.kind == DependencyKind::Calls)
        .expect("call dependency");
    assert_eq!(call.target, "Bar::baz");
    assert_eq!(call.from_symbol, "App\\Services\\Foo::run");
}

#[test]
fn test_instance_call_with_new_typed_local() {
    let result = parse(
        "<?php\nclass C {\n    public function run() {\n        $svc = new FileService();\n        $svc->store();\n    }\n}\n",
    );

    let call = result
        .dependencies
        .iter()
        .find(|d| d.target == "store")
        .expect("instance call");
    assert_eq!(call.calling_object.as_deref(), Some("$svc"));
    assert_eq!(call.resolved_class.as_deref(), Some("FileService"));
}

#[test]
fn test_instance_call_with_typed_parameter() {
    let result = parse(
        "<?php\nclass C {\n    public function handle(FileService $svc) {\n        $svc->store();\n    }\n}\n",
    );

    let call = result
        .dependencies
        .iter()
        .find(|d| d.target == "store")
        .expect("instance call");
    assert_eq!(call.resolved_class.as_deref(), Some("FileService"));
}

#[test]
fn test_this_call_resolves_to_enclosing_class() {
    let result = parse(
        "<?php\nnamespace App;\nclass C {\n    public function a() {\n        $this->b();\n    }\n    public function b() {}\n}\n",
    );

    let call = result
        .dependencies
        .iter()
        .find(|d| d.target == "b")
        .expect("this call");
    assert_eq!(call.calling_object.as_deref(), Some("$this"));
    assert_eq!(call.resolved_class.as_deref(), Some("App\\C"));
}

#[test]
fn test_untyped_receiver_has_no_resolved_class() {
    let result = parse(
        "<?php\nclass C {\n    public function run($thing) {\n        $thing->go();\n    }\n}\n",
    );

    let call = result
        .dependencies
        .iter()
        .find(|d| d.target == "go")
        .expect("instance call");
    assert_eq!(call.calling_object.as_deref(), Some("$thing"));
    assert_eq!(call.resolved_class, None);
}

#[test]
fn test_typed_property_call_through_this() {
    let result = parse(
        "<?php\nclass C {\n    private FileRepository $files;\n    public function run() {\n        $this->files->all();\n    }\n}\n",
    );

    let call = result
        .dependencies
        .iter()
        .find(|d| d.target == "all")
        .expect("property call");
    assert_eq!(call.resolved_class.as_deref(), Some("FileRepository"));
}

#[test]
fn test_new_expression_records_reference() {
    let result = parse(
        "<?php\nclass C {\n    public function run() {\n        $x = new FileService();\n    }\n}\n",
    );

    let reference = result
        .dependencies
        .iter()
        .find(|d| d.kind == DependencyKind::References)
        .expect("reference dependency");
    assert_eq!(reference.target, "FileService");
}

// ── Errors ─────────────────────────────────────────────────────────────────

#[test]
fn test_syntax_errors_do_not_suppress_parsed_symbols() {
    let result = parse("<?php\nclass Good {\n    public function ok() {}\n}\nfunction broken( {\n");

    assert!(result.symbols.iter().any(|s| s.name == "Good"));
    assert!(!result.errors.is_empty());
}
