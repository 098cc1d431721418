//! Godot scene and project file parser
//!
//! `.tscn` and `project.godot` are INI-like data formats, not source
//! languages: this parser emits framework entities (scenes, nodes, attached
//! scripts, autoloads) and no symbols. Anything beyond section headers and
//! key/value attributes (sub-resources, property payloads) is ignored.

use super::{LanguageParser, ParseError, ParseOptions, ParseResult};
use crate::framework::{FrameworkEntityDraft, FrameworkEntityKind};
use crate::language::Language;
use regex::Regex;
use std::path::Path;

/// Godot data-file parser
pub struct GodotParser {
    section: Regex,
    attribute: Regex,
    assignment: Regex,
}

impl Default for GodotParser {
    fn default() -> Self {
        Self {
            section: Regex::new(r#"^\[(?P<name>[A-Za-z_][A-Za-z0-9_]*)(?P<attrs>[^\]]*)\]"#)
                .expect("valid section pattern"),
            attribute: Regex::new(r#"(?P<key>[A-Za-z_][A-Za-z0-9_]*)="(?P<value>[^"]*)""#)
                .expect("valid attribute pattern"),
            assignment: Regex::new(r#"^(?P<key>[^=\s]+)\s*=\s*"?(?P<value>[^"]*)"?$"#)
                .expect("valid assignment pattern"),
        }
    }
}

impl GodotParser {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse_scene(&self, path: &Path, source: &str, result: &mut ParseResult) {
        let scene_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Scene")
            .to_string();

        result.framework_entities.push(FrameworkEntityDraft {
            kind: FrameworkEntityKind::Scene,
            name: scene_name.clone(),
            symbol_name: None,
            metadata: serde_json::json!({ "path": path.to_string_lossy() }),
        });

        for line in source.lines() {
            let line = line.trim();
            let Some(caps) = self.section.captures(line) else {
                continue;
            };
            let attrs = self.attributes(caps.name("attrs").map(|m| m.as_str()).unwrap_or(""));

            match &caps["name"] {
                "node" => {
                    let Some(name) = attrs.iter().find(|(k, _)| k == "name") else {
                        continue;
                    };
                    let node_type = attrs
                        .iter()
                        .find(|(k, _)| k == "type")
                        .map(|(_, v)| v.clone())
                        .unwrap_or_default();
                    let parent = attrs
                        .iter()
                        .find(|(k, _)| k == "parent")
                        .map(|(_, v)| v.clone());

                    result.framework_entities.push(FrameworkEntityDraft {
                        kind: FrameworkEntityKind::Node,
                        name: name.1.clone(),
                        symbol_name: None,
                        metadata: serde_json::json!({
                            "scene": scene_name,
                            "type": node_type,
                            "parent": parent,
                        }),
                    });
                }
                "ext_resource" => {
                    let is_script = attrs
                        .iter()
                        .any(|(k, v)| k == "type" && (v == "Script" || v == "CSharpScript"));
                    if !is_script {
                        continue;
                    }
                    let Some((_, script_path)) = attrs.iter().find(|(k, _)| k == "path") else {
                        continue;
                    };

                    result.framework_entities.push(FrameworkEntityDraft {
                        kind: FrameworkEntityKind::Script,
                        name: script_file_name(script_path),
                        symbol_name: None,
                        metadata: serde_json::json!({
                            "scene": scene_name,
                            "path": script_path,
                        }),
                    });
                }
                _ => {}
            }
        }
    }

    fn parse_project(&self, source: &str, result: &mut ParseResult) {
        let mut in_autoload = false;

        for line in source.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }

            if let Some(caps) = self.section.captures(line) {
                in_autoload = &caps["name"] == "autoload";
                continue;
            }

            if !in_autoload {
                continue;
            }

            let Some(caps) = self.assignment.captures(line) else {
                continue;
            };
            // A leading `*` marks the autoload as a singleton instance
            let value = caps["value"].trim_start_matches('*').to_string();

            result.framework_entities.push(FrameworkEntityDraft {
                kind: FrameworkEntityKind::Autoload,
                name: caps["key"].to_string(),
                symbol_name: None,
                metadata: serde_json::json!({ "path": value }),
            });
        }
    }

    fn attributes(&self, text: &str) -> Vec<(String, String)> {
        self.attribute
            .captures_iter(text)
            .map(|c| (c["key"].to_string(), c["value"].to_string()))
            .collect()
    }
}

impl LanguageParser for GodotParser {
    fn languages(&self) -> &[Language] {
        &[Language::GodotScene, Language::GodotProject]
    }

    fn parse(
        &self,
        path: &Path,
        source: &str,
        _options: &ParseOptions,
    ) -> Result<ParseResult, ParseError> {
        let language = Language::from_path(path).unwrap_or(Language::GodotScene);
        let mut result = ParseResult::new(path, language);

        match language {
            Language::GodotProject => self.parse_project(source, &mut result),
            _ => self.parse_scene(path, source, &mut result),
        }

        Ok(result)
    }
}

/// `res://scripts/CardManager.cs` → `CardManager`
fn script_file_name(resource_path: &str) -> String {
    resource_path
        .rsplit('/')
        .next()
        .unwrap_or(resource_path)
        .rsplit('.')
        .last()
        .unwrap_or(resource_path)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_scene_nodes_and_scripts() {
        let source = r#"
[gd_scene load_steps=3 format=3]

[ext_resource type="Script" path="res://scripts/CardManager.cs" id="1_a"]

[node name="Main" type="Node2D"]

[node name="Card" type="Area2D" parent="."]
"#;
        let parser = GodotParser::new();
        let result = parser
            .parse(
                &PathBuf::from("scenes/Main.tscn"),
                source,
                &ParseOptions::default(),
            )
            .unwrap();

        assert!(result.symbols.is_empty());
        let kinds: Vec<_> = result
            .framework_entities
            .iter()
            .map(|e| (e.kind, e.name.clone()))
            .collect();
        assert!(kinds.contains(&(FrameworkEntityKind::Scene, "Main".to_string())));
        assert!(kinds.contains(&(FrameworkEntityKind::Node, "Card".to_string())));
        assert!(kinds.contains(&(FrameworkEntityKind::Script, "CardManager".to_string())));
    }

    #[test]
    fn test_project_autoloads() {
        let source = r#"
[application]
config/name="Game"

[autoload]
GameState="*res://scripts/GameState.cs"
Audio="res://scripts/Audio.gd"
"#;
        let parser = GodotParser::new();
        let result = parser
            .parse(
                &PathBuf::from("project.godot"),
                source,
                &ParseOptions::default(),
            )
            .unwrap();

        let autoloads: Vec<_> = result
            .framework_entities
            .iter()
            .filter(|e| e.kind == FrameworkEntityKind::Autoload)
            .collect();
        assert_eq!(autoloads.len(), 2);
        assert_eq!(autoloads[0].name, "GameState");
        assert_eq!(
            autoloads[0].metadata["path"],
            serde_json::json!("res://scripts/GameState.cs")
        );
    }
}
