//! Import-specifier → file-path resolution
//!
//! Resolves relative specifiers, project-root aliases (`@/`, `src/`), and
//! rooted paths against the set of files known to the pass, probing the
//! supported extensions and `index.<ext>` variants. Bare specifiers are
//! external modules and never resolve.

use crate::language::Language;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

/// Resolves module specifiers to absolute in-repo file paths.
#[derive(Debug, Clone)]
pub struct ModulePathResolver {
    root: PathBuf,
    files: HashSet<PathBuf>,
}

impl ModulePathResolver {
    pub fn new(root: &Path, files: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            root: root.to_path_buf(),
            files: files.into_iter().collect(),
        }
    }

    /// True for specifiers this resolver could resolve at all: relative
    /// paths, rooted paths, and the common project aliases. Bare module
    /// names (`vue`, `lodash/merge`) are external.
    pub fn looks_resolvable(&self, specifier: &str) -> bool {
        specifier.starts_with("./")
            || specifier.starts_with("../")
            || specifier.starts_with('/')
            || specifier.starts_with("@/")
            || specifier.starts_with("~/")
            || specifier.starts_with("src/")
    }

    /// Resolve a specifier relative to the importing file. Returns the
    /// absolute path of a file known to the pass, or `None`.
    pub fn resolve(&self, specifier: &str, importing_file: &Path) -> Option<PathBuf> {
        let base = if specifier.starts_with("./") || specifier.starts_with("../") {
            importing_file.parent()?.join(specifier)
        } else if let Some(rest) = specifier.strip_prefix("@/").or_else(|| specifier.strip_prefix("~/")) {
            // `@/` conventionally maps to `<root>/src`, falling back to root
            let under_src = self.root.join("src").join(rest);
            if let Some(found) = self.try_candidates(&under_src) {
                return Some(found);
            }
            self.root.join(rest)
        } else if specifier.starts_with("src/") {
            self.root.join(specifier)
        } else if let Some(rest) = specifier.strip_prefix('/') {
            self.root.join(rest)
        } else {
            return None;
        };

        self.try_candidates(&base)
    }

    /// Try the base path as-is, with each probe extension, and as a
    /// directory with `index.<ext>`.
    fn try_candidates(&self, base: &Path) -> Option<PathBuf> {
        let base = normalize(base);

        if self.files.contains(&base) {
            return Some(base);
        }

        for ext in Language::probe_extensions() {
            let mut candidate = base.as_os_str().to_owned();
            candidate.push(format!(".{ext}"));
            let candidate = PathBuf::from(candidate);
            if self.files.contains(&candidate) {
                return Some(candidate);
            }
        }

        for ext in Language::probe_extensions() {
            let candidate = base.join(format!("index.{ext}"));
            if self.files.contains(&candidate) {
                return Some(candidate);
            }
        }

        None
    }
}

/// Collapse `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> ModulePathResolver {
        ModulePathResolver::new(
            Path::new("/repo"),
            vec![
                PathBuf::from("/repo/src/util.ts"),
                PathBuf::from("/repo/src/stores/areasStore.ts"),
                PathBuf::from("/repo/src/components/index.ts"),
            ],
        )
    }

    #[test]
    fn test_relative_with_extension_probe() {
        let r = resolver();
        assert_eq!(
            r.resolve("./util", Path::new("/repo/src/app.ts")),
            Some(PathBuf::from("/repo/src/util.ts"))
        );
    }

    #[test]
    fn test_parent_traversal() {
        let r = resolver();
        assert_eq!(
            r.resolve("../util", Path::new("/repo/src/stores/areasStore.ts")),
            Some(PathBuf::from("/repo/src/util.ts"))
        );
    }

    #[test]
    fn test_alias_resolution() {
        let r = resolver();
        assert_eq!(
            r.resolve("@/stores/areasStore", Path::new("/repo/src/app.ts")),
            Some(PathBuf::from("/repo/src/stores/areasStore.ts"))
        );
    }

    #[test]
    fn test_index_probe() {
        let r = resolver();
        assert_eq!(
            r.resolve("./components", Path::new("/repo/src/app.ts")),
            Some(PathBuf::from("/repo/src/components/index.ts"))
        );
    }

    #[test]
    fn test_bare_specifier_is_external() {
        let r = resolver();
        assert!(!r.looks_resolvable("vue"));
        assert_eq!(r.resolve("vue", Path::new("/repo/src/app.ts")), None);
    }
}
