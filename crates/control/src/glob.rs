//! Shell-style path patterns evaluated against a directory tree.
//!
//! `*` and `?` stay inside one path segment, `**/` spans any number of
//! directories (including none) and `[...]` is a character class (`[!...]`
//! negates it). A trailing `/` restricts the pattern to directories.

use globset::{GlobBuilder, GlobMatcher};
use ignore::WalkBuilder;
use sdk_models::SdkError;
use std::path::{Path, PathBuf};

/// A compiled pattern, relative to the directory it is evaluated in.
#[derive(Debug, Clone)]
pub struct PathPattern {
    matcher: GlobMatcher,
    dirs_only: bool,
}

impl PathPattern {
    pub fn new(pattern: &str) -> Result<Self, SdkError> {
        let mut normalized = pattern.trim();
        while let Some(rest) = normalized.strip_prefix("./") {
            normalized = rest;
        }
        let dirs_only = normalized.len() > 1 && normalized.ends_with('/');
        let normalized = if dirs_only {
            normalized.trim_end_matches('/')
        } else {
            normalized
        };

        let glob = GlobBuilder::new(normalized)
            .literal_separator(true)
            .build()
            .map_err(|e| SdkError::ConfigError {
                reason: format!("invalid pattern '{pattern}': {e}"),
            })?;

        Ok(Self {
            matcher: glob.compile_matcher(),
            dirs_only,
        })
    }

    /// `relative` uses `/` separators.
    pub fn is_match(&self, relative: &str, is_dir: bool) -> bool {
        (is_dir || !self.dirs_only) && self.matcher.is_match(relative)
    }
}

/// Files and directories under `base` matching `pattern`, sorted.
pub fn glob(base: &Path, pattern: &str) -> Result<Vec<PathBuf>, SdkError> {
    let pattern = PathPattern::new(pattern)?;

    // Hidden files and ignore files are part of the tree; symlinks are not followed
    let walker = WalkBuilder::new(base)
        .standard_filters(false)
        .follow_links(false)
        .build();

    let mut matches = Vec::new();
    for entry in walker {
        let entry = entry.map_err(std::io::Error::other)?;
        if entry.depth() == 0 {
            continue;
        }
        let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
        let relative = relative_slash_path(base, entry.path());
        if pattern.is_match(&relative, is_dir) {
            matches.push(entry.into_path());
        }
    }
    matches.sort();
    Ok(matches)
}

/// `path` relative to `root`, with `/` separators.
pub fn relative_slash_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, path: &str) -> bool {
        PathPattern::new(pattern).unwrap().is_match(path, false)
    }

    #[test]
    fn test_single_star_stays_in_segment() {
        assert!(matches("*.py", "setup.py"));
        assert!(!matches("*.py", "azure/setup.py"));
        assert!(matches("*/composite*.json", "arm-web/compositeWebAppClient.json"));
        assert!(!matches("*/composite*.json", "a/b/composite.json"));
    }

    #[test]
    fn test_double_star_spans_directories() {
        assert!(matches("**/__init__.py", "__init__.py"));
        assert!(matches("**/__init__.py", "azure/mgmt/__init__.py"));
        assert!(matches("azure/**", "azure/mgmt/web"));
    }

    #[test]
    fn test_question_mark_and_classes() {
        assert!(matches("v?.py", "v1.py"));
        assert!(!matches("v?.py", "v12.py"));
        assert!(matches("[a-c]*.txt", "b.txt"));
        assert!(!matches("[!a-c]*.txt", "b.txt"));
        assert!(matches("[!a-c]*.txt", "d.txt"));
    }

    #[test]
    fn test_literals_and_leading_dot_slash() {
        assert!(matches("version.py", "version.py"));
        assert!(!matches("version.py", "versionXpy"));
        assert!(matches("a+b(1).md", "a+b(1).md"));
        assert!(matches("./setup.py", "setup.py"));
    }

    #[test]
    fn test_trailing_slash_selects_directories() {
        let pattern = PathPattern::new("azure/mgmt/").unwrap();
        assert!(pattern.is_match("azure/mgmt", true));
        assert!(!pattern.is_match("azure/mgmt", false));
    }

    #[test]
    fn test_malformed_class_is_a_config_error() {
        assert!(matches!(
            PathPattern::new("[!]x"),
            Err(SdkError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_glob_walks_tree() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("azure/mgmt")).unwrap();
        std::fs::write(dir.path().join("azure/__init__.py"), "").unwrap();
        std::fs::write(dir.path().join("azure/mgmt/__init__.py"), "").unwrap();
        std::fs::write(dir.path().join("setup.py"), "").unwrap();
        std::fs::write(dir.path().join(".gitignore"), "*.py\n").unwrap();

        let found = glob(dir.path(), "**/__init__.py").unwrap();
        let relative: Vec<String> = found
            .iter()
            .map(|p| relative_slash_path(dir.path(), p))
            .collect();
        assert_eq!(relative, vec!["azure/__init__.py", "azure/mgmt/__init__.py"]);

        let dirs = glob(dir.path(), "azure/mgmt").unwrap();
        assert_eq!(dirs, vec![dir.path().join("azure/mgmt")]);

        let dirs = glob(dir.path(), "azure/mgmt/").unwrap();
        assert_eq!(dirs, vec![dir.path().join("azure/mgmt")]);
        assert!(glob(dir.path(), "setup.py/").unwrap().is_empty());
    }
}
