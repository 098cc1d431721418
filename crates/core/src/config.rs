//! Analysis configuration, loadable from .compass.toml

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a single analysis pass.
///
/// Every field has a default so an empty `.compass.toml` (or none at all)
/// yields a working configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Include files matching test path conventions (`*.test.*`, `/tests/`, ...)
    #[serde(default)]
    pub include_test_files: bool,

    /// Descend into vendored dependency directories (`node_modules/`, `vendor/`)
    #[serde(default)]
    pub include_vendored_dependencies: bool,

    /// Extension whitelist, with leading dots
    #[serde(default = "default_extensions")]
    pub file_extensions: Vec<String>,

    /// Files larger than this are skipped with a warning (bytes)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Inputs larger than this are parsed in chunks (bytes)
    #[serde(default = "default_chunking_threshold")]
    pub chunking_threshold: usize,

    /// Files larger than this log a warning but are still parsed (bytes)
    #[serde(default = "default_warn_threshold")]
    pub warn_threshold: u64,

    /// Overlap between chunks, used only to avoid splitting a declaration
    #[serde(default = "default_chunk_overlap_lines")]
    pub chunk_overlap_lines: usize,

    /// Discovery is truncated at this many files
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// Encoding tried when UTF-8 decoding fails ("latin-1" or "lossy")
    #[serde(default = "default_encoding_fallback")]
    pub encoding_fallback: String,

    /// Parse files on a thread pool
    #[serde(default = "default_true")]
    pub parallel_parsing: bool,

    /// Upper bound on parser worker threads
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Hard per-file parse timeout (seconds)
    #[serde(default = "default_parse_timeout_secs")]
    pub parse_timeout_secs: u64,

    /// Ignore prior store state and re-analyze everything
    #[serde(default)]
    pub force_full_analysis: bool,

    /// When this fraction of files changed, promote incremental to full
    #[serde(default = "default_full_reanalysis_threshold")]
    pub full_reanalysis_threshold: f64,

    /// Tri-state cross-stack override: unset defers to the detector
    #[serde(default)]
    pub cross_stack_enabled: Option<bool>,

    /// Name of the repo-local ignore file (gitignore syntax)
    #[serde(default = "default_ignore_file")]
    pub ignore_file: String,
}

fn default_extensions() -> Vec<String> {
    [
        ".js", ".jsx", ".ts", ".tsx", ".mjs", ".cjs", ".vue", ".php", ".cs", ".tscn", ".godot",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

fn default_chunking_threshold() -> usize {
    512 * 1024
}

fn default_warn_threshold() -> u64 {
    1024 * 1024
}

fn default_chunk_overlap_lines() -> usize {
    50
}

fn default_max_files() -> usize {
    50_000
}

fn default_encoding_fallback() -> String {
    "latin-1".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_concurrency() -> usize {
    10
}

fn default_parse_timeout_secs() -> u64 {
    30
}

fn default_full_reanalysis_threshold() -> f64 {
    0.6
}

fn default_ignore_file() -> String {
    ".compassignore".to_string()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        toml::from_str("").expect("empty TOML should parse to defaults")
    }
}

impl AnalysisConfig {
    /// Load configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AnalysisConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Find and load `.compass.toml` from the given directory or its ancestors.
    pub fn find_and_load(start_dir: &Path) -> Result<Self> {
        let mut current = start_dir;

        loop {
            let config_path = current.join(".compass.toml");
            if config_path.exists() {
                return Self::from_file(&config_path);
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        Ok(Self::default())
    }

    /// Extension whitelist without leading dots, for walker matching.
    pub fn bare_extensions(&self) -> Vec<String> {
        self.file_extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert!(!config.include_test_files);
        assert!(!config.include_vendored_dependencies);
        assert!(config.file_extensions.contains(&".vue".to_string()));
        assert!(config.file_extensions.contains(&".tscn".to_string()));
        assert_eq!(config.max_concurrency, 10);
        assert_eq!(config.parse_timeout_secs, 30);
        assert_eq!(config.cross_stack_enabled, None);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config: AnalysisConfig =
            toml::from_str("include_test_files = true\nmax_files = 10\n").unwrap();
        assert!(config.include_test_files);
        assert_eq!(config.max_files, 10);
        assert_eq!(config.max_concurrency, 10);
    }

    #[test]
    fn test_bare_extensions() {
        let config = AnalysisConfig::default();
        assert!(config.bare_extensions().contains(&"php".to_string()));
        assert!(!config.bare_extensions().iter().any(|e| e.starts_with('.')));
    }
}
