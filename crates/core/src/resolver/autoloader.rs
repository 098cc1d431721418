//! PSR-4 autoloader rules extracted from composer.json
//!
//! Maps fully qualified PHP class names to source file paths. Rules come
//! from `autoload.psr-4` and `autoload-dev.psr-4`; the longest matching
//! prefix wins, as Composer's own loader behaves.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Default)]
struct ComposerAutoload {
    #[serde(rename = "psr-4", default)]
    psr4: BTreeMap<String, Psr4Target>,
}

/// A PSR-4 mapping value: one directory or a list of directories.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Psr4Target {
    One(String),
    Many(Vec<String>),
}

impl Psr4Target {
    fn dirs(&self) -> Vec<&str> {
        match self {
            Psr4Target::One(d) => vec![d.as_str()],
            Psr4Target::Many(ds) => ds.iter().map(|d| d.as_str()).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ComposerJson {
    #[serde(default)]
    autoload: ComposerAutoload,
    #[serde(rename = "autoload-dev", default)]
    autoload_dev: ComposerAutoload,
}

/// One PSR-4 rule: namespace prefix → base directory.
#[derive(Debug, Clone)]
struct Psr4Rule {
    /// Normalized without trailing backslash, e.g. `App`
    prefix: String,
    /// Relative to the repository root
    dir: PathBuf,
}

/// PSR-4 class → file mapping for one repository.
#[derive(Debug, Clone, Default)]
pub struct Psr4Autoloader {
    rules: Vec<Psr4Rule>,
    root: PathBuf,
}

impl Psr4Autoloader {
    /// An autoloader with no rules; every lookup misses.
    pub fn empty(root: &Path) -> Self {
        Self {
            rules: Vec::new(),
            root: root.to_path_buf(),
        }
    }

    /// Load rules from `<root>/composer.json`, if present and parsable.
    pub fn from_composer(root: &Path) -> Self {
        let mut loader = Self::empty(root);

        let Ok(contents) = std::fs::read_to_string(root.join("composer.json")) else {
            return loader;
        };
        let Ok(composer) = serde_json::from_str::<ComposerJson>(&contents) else {
            return loader;
        };

        for autoload in [&composer.autoload, &composer.autoload_dev] {
            for (prefix, target) in &autoload.psr4 {
                for dir in target.dirs() {
                    loader.add_rule(prefix, dir);
                }
            }
        }

        loader
    }

    /// Register a rule. Prefixes keep Composer's trailing-backslash
    /// convention in the manifest but are stored normalized.
    pub fn add_rule(&mut self, prefix: &str, dir: &str) {
        self.rules.push(Psr4Rule {
            prefix: prefix.trim_end_matches('\\').to_string(),
            dir: PathBuf::from(dir.trim_end_matches('/')),
        });
        // Longest prefix first so `App\Tests` beats `App`
        self.rules
            .sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
    }

    pub fn has_rules(&self) -> bool {
        !self.rules.is_empty()
    }

    /// Map a fully qualified class name to the absolute path PSR-4 implies.
    /// The file is not checked for existence; callers probe their file index.
    pub fn resolve(&self, fqn: &str) -> Option<PathBuf> {
        let fqn = fqn.trim_start_matches('\\');

        for rule in &self.rules {
            let Some(rest) = fqn.strip_prefix(&rule.prefix) else {
                continue;
            };
            let rest = rest.trim_start_matches('\\');
            if rest.is_empty() {
                continue;
            }

            let relative: PathBuf = rest.split('\\').collect();
            let mut path = self.root.join(&rule.dir).join(relative);
            path.set_extension("php");
            return Some(path);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_mapping() {
        let mut loader = Psr4Autoloader::empty(Path::new("/repo"));
        loader.add_rule("App\\", "app/");
        assert_eq!(
            loader.resolve("App\\Services\\Bar"),
            Some(PathBuf::from("/repo/app/Services/Bar.php"))
        );
    }

    #[test]
    fn test_longest_prefix_wins() {
        let mut loader = Psr4Autoloader::empty(Path::new("/repo"));
        loader.add_rule("App\\", "app/");
        loader.add_rule("App\\Tests\\", "tests/");
        assert_eq!(
            loader.resolve("App\\Tests\\FooTest"),
            Some(PathBuf::from("/repo/tests/FooTest.php"))
        );
    }

    #[test]
    fn test_unmatched_prefix_misses() {
        let mut loader = Psr4Autoloader::empty(Path::new("/repo"));
        loader.add_rule("App\\", "app/");
        assert_eq!(loader.resolve("Vendor\\Thing"), None);
    }
}
