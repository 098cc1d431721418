//! Chunked parsing must produce the same symbol identities (name + start
//! line) as parsing the whole file at once.

use compass_core::language::Language;
use compass_core::parser::{ParseOptions, ParserDispatcher};
use std::path::PathBuf;

fn big_typescript_source(functions: usize) -> String {
    let mut source = String::new();
    for i in 0..functions {
        source.push_str(&format!(
            "export function handler{i}(input: number): number {{\n    return input + {i};\n}}\n\n"
        ));
    }
    source
}

#[test]
fn test_chunked_parse_matches_whole_parse() {
    let source = big_typescript_source(120);
    let path = PathBuf::from("/repo/src/handlers.ts");
    let dispatcher = ParserDispatcher::new();

    let whole = dispatcher
        .parse_file(&path, Language::TypeScript, &source, &ParseOptions::default())
        .unwrap();

    let chunked_options = ParseOptions {
        chunking_threshold: 1024,
        chunk_overlap_lines: 8,
        ..Default::default()
    };
    let chunked = dispatcher
        .parse_file(&path, Language::TypeScript, &source, &chunked_options)
        .unwrap();

    let identities = |result: &compass_core::parser::ParseResult| -> Vec<(String, usize)> {
        let mut ids: Vec<(String, usize)> = result
            .symbols
            .iter()
            .map(|s| (s.name.clone(), s.start_line))
            .collect();
        ids.sort();
        ids
    };

    assert_eq!(whole.symbols.len(), 120);
    assert_eq!(identities(&whole), identities(&chunked));
}

#[test]
fn test_chunked_parse_deduplicates_overlap() {
    let source = big_typescript_source(60);
    let path = PathBuf::from("/repo/src/handlers.ts");
    let dispatcher = ParserDispatcher::new();

    let options = ParseOptions {
        chunking_threshold: 512,
        chunk_overlap_lines: 10,
        ..Default::default()
    };
    let result = dispatcher
        .parse_file(&path, Language::TypeScript, &source, &options)
        .unwrap();

    // Overlap lines are parsed twice; identities must still be unique
    let mut seen = std::collections::HashSet::new();
    for symbol in &result.symbols {
        assert!(
            seen.insert((symbol.name.clone(), symbol.start_line)),
            "duplicate symbol identity {:?}",
            (&symbol.name, symbol.start_line)
        );
    }
    assert_eq!(result.symbols.len(), 60);
}

#[test]
fn test_small_input_is_not_chunked_differently() {
    let source = "export function one() {}\n";
    let path = PathBuf::from("/repo/src/one.ts");
    let dispatcher = ParserDispatcher::new();

    let result = dispatcher
        .parse_file(&path, Language::TypeScript, source, &ParseOptions::default())
        .unwrap();
    assert_eq!(result.symbols.len(), 1);
    assert_eq!(result.symbols[0].start_line, 1);
}
