//! File discovery with ignore-aware filtering
//!
//! Walks the repository root, applies the built-in directory block list and
//! the repo-local ignore file (gitignore syntax), classifies files by
//! extension, and enforces the size and count limits from the configuration.

use crate::config::AnalysisConfig;
use crate::language::Language;
use anyhow::{Context, Result};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

/// A discovered candidate file, classified and stat'ed.
#[derive(Debug, Clone)]
pub struct WalkedFile {
    pub absolute_path: PathBuf,
    pub relative_path: PathBuf,
    pub language: Language,
    pub size: u64,
    pub modified: SystemTime,
    pub is_test: bool,
    pub is_generated: bool,
}

/// Directory basenames never descended into, independent of ignore files.
/// `node_modules` and `vendor` are lifted when vendored deps are requested.
const BLOCKED_DIRS: &[&str] = &["node_modules", ".git", "dist", "build", "vendor"];

/// Discover candidate files under `root` according to `config`.
///
/// Returns files ordered by relative path. Unreadable entries are logged and
/// skipped; oversized files are skipped with a warning; the result is
/// truncated at `max_files` with a warning.
pub fn discover_files(root: &Path, config: &AnalysisConfig) -> Result<Vec<WalkedFile>> {
    let root = root
        .canonicalize()
        .with_context(|| format!("invalid repository root: {}", root.display()))?;

    let ignore_matcher = load_ignore_file(&root, &config.ignore_file);
    let extensions = config.bare_extensions();
    let include_vendored = config.include_vendored_dependencies;

    let mut builder = WalkBuilder::new(&root);
    builder
        .standard_filters(false)
        .hidden(false)
        .follow_links(false)
        .sort_by_file_path(|a, b| a.cmp(b));

    builder.filter_entry(move |entry| {
        // The root itself is depth 0 and is never filtered by basename
        if entry.depth() == 0 {
            return true;
        }
        let Some(name) = entry.file_name().to_str() else {
            return false;
        };
        let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
        if !is_dir {
            return true;
        }
        if name.starts_with('.') {
            return false;
        }
        if BLOCKED_DIRS.contains(&name) {
            let vendored = name == "node_modules" || name == "vendor";
            return vendored && include_vendored;
        }
        true
    });

    let mut files = Vec::new();
    let mut truncated = false;

    for entry in builder.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                warn!("skipping unreadable entry: {err}");
                continue;
            }
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let path = entry.into_path();
        let relative = match path.strip_prefix(&root) {
            Ok(r) => r.to_path_buf(),
            Err(_) => continue,
        };

        if let Some(matcher) = &ignore_matcher {
            if matcher.matched(&relative, false).is_ignore() {
                debug!("ignored by {}: {}", config.ignore_file, relative.display());
                continue;
            }
        }

        let Some(language) = classify(&path, &extensions) else {
            continue;
        };

        let metadata = match std::fs::metadata(&path) {
            Ok(m) => m,
            Err(err) => {
                warn!("skipping unreadable file {}: {err}", path.display());
                continue;
            }
        };

        let size = metadata.len();
        if size > config.max_file_size {
            warn!(
                "skipping {} ({} bytes > max_file_size {})",
                relative.display(),
                size,
                config.max_file_size
            );
            continue;
        }
        if size > config.warn_threshold {
            warn!(
                "{} is large ({} bytes); parsing may be slow",
                relative.display(),
                size
            );
        }

        let is_test = is_test_path(&relative);
        if is_test && !config.include_test_files {
            continue;
        }

        if files.len() >= config.max_files {
            truncated = true;
            break;
        }

        files.push(WalkedFile {
            is_generated: is_generated_path(&relative),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            absolute_path: path,
            relative_path: relative,
            language,
            size,
            is_test,
        });
    }

    if truncated {
        warn!(
            "discovery truncated at max_files = {}; remaining files were not considered",
            config.max_files
        );
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(files)
}

/// Load the repo-local ignore file if present. Gitignore semantics:
/// repo-relative patterns, last match wins, `!` negates.
fn load_ignore_file(root: &Path, ignore_file: &str) -> Option<Gitignore> {
    let path = root.join(ignore_file);
    if !path.exists() {
        return None;
    }

    let mut builder = GitignoreBuilder::new(root);
    if let Some(err) = builder.add(&path) {
        warn!("failed to read {}: {err}", path.display());
        return None;
    }
    match builder.build() {
        Ok(matcher) => Some(matcher),
        Err(err) => {
            warn!("invalid patterns in {}: {err}", path.display());
            None
        }
    }
}

fn classify(path: &Path, extensions: &[String]) -> Option<Language> {
    if path.file_name().and_then(|n| n.to_str()) == Some("project.godot") {
        return Some(Language::GodotProject);
    }
    let ext = path.extension().and_then(|e| e.to_str())?;
    if !extensions.iter().any(|allowed| allowed == ext) {
        return None;
    }
    Language::from_extension(ext)
}

/// Test-path conventions shared by the supported ecosystems.
pub fn is_test_path(relative: &Path) -> bool {
    let path_str = relative.to_string_lossy().replace('\\', "/");
    let file_name = relative
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    if file_name.contains(".test.") || file_name.contains(".spec.") {
        return true;
    }

    let segments: Vec<&str> = path_str.split('/').collect();
    segments
        .iter()
        .take(segments.len().saturating_sub(1))
        .any(|s| *s == "tests" || *s == "test" || *s == "__tests__")
}

/// Generated-output heuristics; recorded on the file row for downstream filters.
fn is_generated_path(relative: &Path) -> bool {
    let file_name = relative
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    if file_name.ends_with(".min.js") || file_name.ends_with(".d.ts") {
        return true;
    }

    relative.components().any(|c| {
        c.as_os_str()
            .to_str()
            .is_some_and(|s| s == "generated" || s == ".generated")
    })
}
