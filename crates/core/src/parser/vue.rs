//! Vue single-file component parser
//!
//! Slices `<script>` / `<script setup>` blocks out of the SFC and delegates
//! them to the TypeScript parser with line offsets preserved. The component
//! itself becomes a symbol named after the file stem; module-level statements
//! in `<script setup>` are re-anchored to it. Template-level API calls are
//! recorded as raw dependencies carrying the HTTP method and URL string for
//! higher layers; the resolver ignores them.

use super::typescript::{TypeScriptParser, MODULE_ANCHOR};
use super::{
    DependencyKind, Export, ExportKind, LanguageParser, ParseError, ParseOptions, ParseResult,
    RawDependency, Symbol, SymbolKind,
};
use crate::language::Language;
use regex::Regex;
use std::path::Path;

/// Vue SFC parser
pub struct VueParser {
    script: TypeScriptParser,
    api_call: Regex,
    fetch_call: Regex,
    fetch_method: Regex,
}

impl Default for VueParser {
    fn default() -> Self {
        Self {
            script: TypeScriptParser::new(),
            api_call: Regex::new(
                r#"(?P<recv>axios|\$?api|\$http)\.(?P<method>get|post|put|patch|delete)\s*\(\s*['"`](?P<url>[^'"`]+)"#,
            )
            .expect("valid api call pattern"),
            fetch_call: Regex::new(r#"fetch\s*\(\s*['"`](?P<url>[^'"`]+)"#)
                .expect("valid fetch pattern"),
            fetch_method: Regex::new(r#"method:\s*['"](?P<m>[A-Za-z]+)['"]"#)
                .expect("valid fetch method pattern"),
        }
    }
}

/// One `<script>` block located in the SFC text.
struct ScriptBlock {
    /// 0-based line of the first content line
    start_line: usize,
    text: String,
}

impl VueParser {
    pub fn new() -> Self {
        Self::default()
    }

    fn component_name(path: &Path) -> String {
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Component")
            .to_string()
    }

    /// Locate every `<script ...>...</script>` block with its line offset.
    fn script_blocks(source: &str) -> Vec<ScriptBlock> {
        let mut blocks = Vec::new();
        let mut search_from = 0usize;

        while let Some(open_rel) = source[search_from..].find("<script") {
            let open = search_from + open_rel;
            let Some(tag_end_rel) = source[open..].find('>') else {
                break;
            };
            let content_start = open + tag_end_rel + 1;
            let Some(close_rel) = source[content_start..].find("</script>") else {
                break;
            };
            let content_end = content_start + close_rel;

            let start_line = source[..content_start].matches('\n').count();
            blocks.push(ScriptBlock {
                start_line,
                text: source[content_start..content_end].to_string(),
            });

            search_from = content_end + "</script>".len();
        }

        blocks
    }

    fn scan_template_api_calls(
        &self,
        source: &str,
        component: &str,
        result: &mut ParseResult,
    ) {
        // Script lines are handled by the TypeScript parser; scanning them
        // again would duplicate the call records
        let script_ranges: Vec<(usize, usize)> = Self::script_blocks(source)
            .iter()
            .map(|b| (b.start_line, b.start_line + b.text.lines().count() + 1))
            .collect();

        for (idx, line) in source.lines().enumerate() {
            if script_ranges.iter().any(|&(lo, hi)| idx >= lo && idx <= hi) {
                continue;
            }
            let line_no = idx + 1;

            for caps in self.api_call.captures_iter(line) {
                let method = caps["method"].to_uppercase();
                let url = &caps["url"];
                let recv = &caps["recv"];
                let mut dep = RawDependency::new(
                    component,
                    format!("{}.{}", recv.trim_start_matches('$'), caps["method"].to_string()),
                    DependencyKind::Calls,
                    line_no,
                );
                dep.parameter_context = Some(format!("{} {}", method, url));
                result.dependencies.push(dep);
            }

            for caps in self.fetch_call.captures_iter(line) {
                let url = &caps["url"];
                let method = self
                    .fetch_method
                    .captures(line)
                    .map(|m| m["m"].to_uppercase())
                    .unwrap_or_else(|| "GET".to_string());
                let mut dep =
                    RawDependency::new(component, "fetch", DependencyKind::Calls, line_no);
                dep.parameter_context = Some(format!("{} {}", method, url));
                result.dependencies.push(dep);
            }
        }
    }
}

impl LanguageParser for VueParser {
    fn languages(&self) -> &[Language] {
        &[Language::Vue]
    }

    fn parse(
        &self,
        path: &Path,
        source: &str,
        _options: &ParseOptions,
    ) -> Result<ParseResult, ParseError> {
        let component = Self::component_name(path);
        let mut result = ParseResult::new(path, Language::Vue);

        let total_lines = source.lines().count().max(1);
        let mut component_symbol = Symbol::new(&component, SymbolKind::Component, 1);
        component_symbol.end_line = total_lines;
        component_symbol.is_exported = true;
        result.symbols.push(component_symbol);
        result.exports.push(Export {
            name: component.clone(),
            line: 1,
            kind: ExportKind::Default,
        });

        for block in Self::script_blocks(source) {
            let mut script_result = self.script.parse_source(path, &block.text, Language::Vue)?;

            for symbol in &mut script_result.symbols {
                symbol.start_line += block.start_line;
                symbol.end_line += block.start_line;
            }
            for dep in &mut script_result.dependencies {
                dep.line += block.start_line;
                if dep.from_symbol == MODULE_ANCHOR {
                    dep.from_symbol = component.clone();
                }
            }
            for import in &mut script_result.imports {
                import.line += block.start_line;
            }
            for export in &mut script_result.exports {
                export.line += block.start_line;
            }
            for error in &mut script_result.errors {
                error.line += block.start_line;
            }

            result.symbols.extend(script_result.symbols);
            result.dependencies.extend(script_result.dependencies);
            result.imports.extend(script_result.imports);
            result.exports.extend(script_result.exports);
            result.errors.extend(script_result.errors);
        }

        self.scan_template_api_calls(source, &component, &mut result);

        result.symbols.sort_by_key(|s| s.start_line);
        Ok(result)
    }
}
