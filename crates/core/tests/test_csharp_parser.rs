//! Tests for C# symbol, field-signature, and call extraction.

use compass_core::parser::csharp::CSharpParser;
use compass_core::parser::{DependencyKind, ImportKind, LanguageParser, ParseOptions, SymbolKind};
use std::path::PathBuf;

fn parse(source: &str) -> compass_core::parser::ParseResult {
    let parser = CSharpParser::new();
    parser
        .parse(
            &PathBuf::from("/repo/scripts/CardManager.cs"),
            source,
            &ParseOptions::default(),
        )
        .unwrap()
}

// ── Declarations ───────────────────────────────────────────────────────────

#[test]
fn test_namespace_qualifies_classes() {
    let result = parse(
        "namespace Game.Cards\n{\n    public class CardManager\n    {\n        public void Deal() {}\n    }\n}\n",
    );

    let class = result
        .symbols
        .iter()
        .find(|s| s.kind == SymbolKind::Class)
        .unwrap();
    assert_eq!(class.name, "CardManager");
    assert_eq!(class.qualified_name.as_deref(), Some("Game.Cards.CardManager"));
    assert!(class.is_exported);

    let method = result
        .symbols
        .iter()
        .find(|s| s.kind == SymbolKind::Method)
        .unwrap();
    assert_eq!(
        method.qualified_name.as_deref(),
        Some("Game.Cards.CardManager.Deal")
    );
}

#[test]
fn test_file_scoped_namespace() {
    let result = parse("namespace Game.Cards;\n\npublic class Deck {}\n");

    let class = result
        .symbols
        .iter()
        .find(|s| s.kind == SymbolKind::Class)
        .unwrap();
    assert_eq!(class.qualified_name.as_deref(), Some("Game.Cards.Deck"));
}

#[test]
fn test_field_signature_records_declared_type() {
    let result = parse(
        "public class CardManager\n{\n    private IHandManager _handManager;\n}\n",
    );

    let field = result
        .symbols
        .iter()
        .find(|s| s.kind == SymbolKind::Property)
        .unwrap();
    assert_eq!(field.name, "_handManager");
    assert_eq!(
        field.signature.as_deref(),
        Some("IHandManager _handManager")
    );
}

#[test]
fn test_field_initializer_type_recorded() {
    let result = parse(
        "public class CardManager\n{\n    private IHandManager _handManager = new HandManager();\n}\n",
    );

    let field = result
        .symbols
        .iter()
        .find(|s| s.kind == SymbolKind::Property)
        .unwrap();
    assert_eq!(
        field.signature.as_deref(),
        Some("IHandManager _handManager = new HandManager()")
    );
}

#[test]
fn test_base_list_split_into_inherits_and_implements() {
    let result = parse("public class HandManager : Node2D, IHandManager {}\n");

    assert!(result
        .dependencies
        .iter()
        .any(|d| d.kind == DependencyKind::Inherits && d.target == "Node2D"));
    assert!(result
        .dependencies
        .iter()
        .any(|d| d.kind == DependencyKind::Implements && d.target == "IHandManager"));
}

#[test]
fn test_interface_methods_extracted() {
    let result = parse(
        "public interface IHandManager\n{\n    void SetHandPositions(int a, int b);\n}\n",
    );

    let interface = result
        .symbols
        .iter()
        .find(|s| s.kind == SymbolKind::Interface)
        .unwrap();
    assert_eq!(interface.name, "IHandManager");

    let method = result
        .symbols
        .iter()
        .find(|s| s.name == "SetHandPositions")
        .unwrap();
    assert_eq!(method.kind, SymbolKind::Method);
}

// ── Usings ─────────────────────────────────────────────────────────────────

#[test]
fn test_using_directive_is_namespace_import() {
    let result = parse("using System.Collections.Generic;\n\npublic class C {}\n");

    assert_eq!(result.imports.len(), 1);
    let import = &result.imports[0];
    assert_eq!(import.kind, ImportKind::Namespace);
    assert_eq!(import.source, "System.Collections.Generic");
    assert_eq!(import.imported_names, vec!["Generic".to_string()]);
}

// ── Calls ──────────────────────────────────────────────────────────────────

#[test]
fn test_field_call_carries_qualified_context() {
    let result = parse(
        "public class CardManager\n{\n    private IHandManager _handManager;\n    public void Deal()\n    {\n        _handManager.SetHandPositions(1, 2);\n    }\n}\n",
    );

    let call = result
        .dependencies
        .iter()
        .find(|d| d.kind == DependencyKind::Calls)
        .expect("call dependency");
    assert_eq!(call.target, "_handManager.SetHandPositions");
    assert_eq!(
        call.qualified_context.as_deref(),
        Some("field_call__handManager")
    );
    assert_eq!(call.from_symbol, "CardManager.Deal");
}

#[test]
fn test_this_call_anchors_to_class() {
    let result = parse(
        "public class CardManager\n{\n    public void Deal() { this.Shuffle(); }\n    public void Shuffle() {}\n}\n",
    );

    let call = result
        .dependencies
        .iter()
        .find(|d| d.target == "Shuffle")
        .unwrap();
    assert_eq!(call.calling_object.as_deref(), Some("this"));
    assert_eq!(call.resolved_class.as_deref(), Some("CardManager"));
}

#[test]
fn test_bare_call_keeps_enclosing_class() {
    let result = parse(
        "public class CardManager\n{\n    public void Deal() { Shuffle(); }\n    public void Shuffle() {}\n}\n",
    );

    let call = result
        .dependencies
        .iter()
        .find(|d| d.target == "Shuffle")
        .unwrap();
    assert_eq!(call.resolved_class.as_deref(), Some("CardManager"));
}

#[test]
fn test_object_creation_records_reference() {
    let result = parse(
        "public class Dealer\n{\n    public void Init() { var deck = new Deck(); }\n}\n",
    );

    assert!(result
        .dependencies
        .iter()
        .any(|d| d.kind == DependencyKind::References && d.target == "Deck"));
}
