//! Source language classification by file extension

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Languages the analysis pipeline understands.
///
/// Godot scene and project files are data formats rather than source
/// languages; their parser emits framework entities instead of symbols.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Language {
    JavaScript,
    TypeScript,
    Vue,
    Php,
    CSharp,
    GodotScene,
    GodotProject,
}

impl Language {
    /// Classify a file by its extension. Returns `None` for unknown extensions.
    pub fn from_path(path: &Path) -> Option<Language> {
        if path.file_name().and_then(|n| n.to_str()) == Some("project.godot") {
            return Some(Language::GodotProject);
        }
        let ext = path.extension()?.to_str()?;
        Language::from_extension(ext)
    }

    /// Classify by bare extension (no leading dot).
    pub fn from_extension(ext: &str) -> Option<Language> {
        match ext {
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
            "ts" | "tsx" => Some(Language::TypeScript),
            "vue" => Some(Language::Vue),
            "php" => Some(Language::Php),
            "cs" => Some(Language::CSharp),
            "tscn" => Some(Language::GodotScene),
            "godot" => Some(Language::GodotProject),
            _ => None,
        }
    }

    /// Stable tag stored on file rows.
    pub fn tag(&self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Vue => "vue",
            Language::Php => "php",
            Language::CSharp => "csharp",
            Language::GodotScene => "godot-scene",
            Language::GodotProject => "godot-project",
        }
    }

    /// Parse a stored tag back into a language.
    pub fn from_tag(tag: &str) -> Option<Language> {
        match tag {
            "javascript" => Some(Language::JavaScript),
            "typescript" => Some(Language::TypeScript),
            "vue" => Some(Language::Vue),
            "php" => Some(Language::Php),
            "csharp" => Some(Language::CSharp),
            "godot-scene" => Some(Language::GodotScene),
            "godot-project" => Some(Language::GodotProject),
            _ => None,
        }
    }

    /// True for data formats that produce framework entities, not symbols.
    pub fn is_data_format(&self) -> bool {
        matches!(self, Language::GodotScene | Language::GodotProject)
    }

    /// Extensions probed when resolving an extensionless import specifier.
    pub fn probe_extensions() -> &'static [&'static str] {
        &["ts", "tsx", "js", "jsx", "mjs", "cjs", "vue"]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_classifies_by_extension() {
        assert_eq!(
            Language::from_path(&PathBuf::from("src/app.ts")),
            Some(Language::TypeScript)
        );
        assert_eq!(
            Language::from_path(&PathBuf::from("app/Models/User.php")),
            Some(Language::Php)
        );
        assert_eq!(
            Language::from_path(&PathBuf::from("scenes/Main.tscn")),
            Some(Language::GodotScene)
        );
        assert_eq!(Language::from_path(&PathBuf::from("README.md")), None);
    }

    #[test]
    fn test_project_godot_by_filename() {
        assert_eq!(
            Language::from_path(&PathBuf::from("game/project.godot")),
            Some(Language::GodotProject)
        );
    }

    #[test]
    fn test_tag_round_trip() {
        for lang in [
            Language::JavaScript,
            Language::TypeScript,
            Language::Vue,
            Language::Php,
            Language::CSharp,
            Language::GodotScene,
            Language::GodotProject,
        ] {
            assert_eq!(Language::from_tag(lang.tag()), Some(lang));
        }
    }
}
