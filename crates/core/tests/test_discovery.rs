//! Tests for file discovery: ignore rules, size and count limits, and
//! test-path filtering.

use compass_core::config::AnalysisConfig;
use compass_core::discovery::discover_files;
use compass_core::language::Language;
use std::path::PathBuf;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_discovers_supported_extensions_sorted() {
    let dir = TempDir::new().unwrap();
    write(&dir, "b.ts", "export const b = 1;\n");
    write(&dir, "a.php", "<?php\n");
    write(&dir, "notes.md", "# notes\n");

    let files = discover_files(dir.path(), &AnalysisConfig::default()).unwrap();

    let names: Vec<String> = files
        .iter()
        .map(|f| f.relative_path.to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["a.php".to_string(), "b.ts".to_string()]);
    assert_eq!(files[0].language, Language::Php);
    assert_eq!(files[1].language, Language::TypeScript);
}

#[test]
fn test_blocked_directories_are_pruned() {
    let dir = TempDir::new().unwrap();
    write(&dir, "src/app.ts", "export const a = 1;\n");
    write(&dir, "node_modules/pkg/index.js", "module.exports = {};\n");
    write(&dir, "vendor/lib/lib.php", "<?php\n");
    write(&dir, "dist/bundle.js", "var x;\n");
    write(&dir, ".hidden/secret.ts", "export {};\n");

    let files = discover_files(dir.path(), &AnalysisConfig::default()).unwrap();

    assert_eq!(files.len(), 1);
    assert!(files[0].relative_path.ends_with("app.ts"));
}

#[test]
fn test_vendored_dirs_included_on_request() {
    let dir = TempDir::new().unwrap();
    write(&dir, "src/app.ts", "export const a = 1;\n");
    write(&dir, "node_modules/pkg/index.js", "module.exports = {};\n");

    let config = AnalysisConfig {
        include_vendored_dependencies: true,
        ..Default::default()
    };
    let files = discover_files(dir.path(), &config).unwrap();

    assert_eq!(files.len(), 2);
}

#[test]
fn test_compassignore_globs() {
    let dir = TempDir::new().unwrap();
    write(&dir, ".compassignore", "legacy/\n*.generated.ts\n");
    write(&dir, "src/app.ts", "export const a = 1;\n");
    write(&dir, "src/api.generated.ts", "export const g = 1;\n");
    write(&dir, "legacy/old.ts", "export const o = 1;\n");

    let files = discover_files(dir.path(), &AnalysisConfig::default()).unwrap();

    assert_eq!(files.len(), 1);
    assert!(files[0].relative_path.ends_with("app.ts"));
}

#[test]
fn test_max_file_size_boundary() {
    let dir = TempDir::new().unwrap();
    write(&dir, "exact.ts", &"x".repeat(100));
    write(&dir, "over.ts", &"x".repeat(101));

    let config = AnalysisConfig {
        max_file_size: 100,
        ..Default::default()
    };
    let files = discover_files(dir.path(), &config).unwrap();

    // A file of exactly max_file_size is included; one byte larger is not
    assert_eq!(files.len(), 1);
    assert!(files[0].relative_path.ends_with("exact.ts"));
}

#[test]
fn test_max_files_truncation_is_deterministic() {
    let dir = TempDir::new().unwrap();
    for name in ["a.ts", "b.ts", "c.ts", "d.ts"] {
        write(&dir, name, "export {};\n");
    }

    let config = AnalysisConfig {
        max_files: 2,
        ..Default::default()
    };
    let files = discover_files(dir.path(), &config).unwrap();

    let names: Vec<String> = files
        .iter()
        .map(|f| f.relative_path.to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["a.ts".to_string(), "b.ts".to_string()]);
}

#[test]
fn test_test_files_excluded_by_default() {
    let dir = TempDir::new().unwrap();
    write(&dir, "src/app.ts", "export const a = 1;\n");
    write(&dir, "src/app.test.ts", "it('works', () => {});\n");
    write(&dir, "tests/integration.php", "<?php\n");

    let default_files = discover_files(dir.path(), &AnalysisConfig::default()).unwrap();
    assert_eq!(default_files.len(), 1);

    let config = AnalysisConfig {
        include_test_files: true,
        ..Default::default()
    };
    let all_files = discover_files(dir.path(), &config).unwrap();
    assert_eq!(all_files.len(), 3);
    assert!(all_files.iter().any(|f| f.is_test));
}

#[test]
fn test_generated_flag() {
    let dir = TempDir::new().unwrap();
    write(&dir, "types/api.d.ts", "export interface A {}\n");

    let files = discover_files(dir.path(), &AnalysisConfig::default()).unwrap();
    assert_eq!(files.len(), 1);
    assert!(files[0].is_generated);
}

#[test]
fn test_project_godot_discovered() {
    let dir = TempDir::new().unwrap();
    write(&dir, "project.godot", "[application]\n");
    write(&dir, "scenes/Main.tscn", "[gd_scene]\n");

    let files = discover_files(dir.path(), &AnalysisConfig::default()).unwrap();
    assert_eq!(files.len(), 2);
    assert!(files
        .iter()
        .any(|f| f.language == Language::GodotProject));
    assert!(files.iter().any(|f| f.language == Language::GodotScene));
}
