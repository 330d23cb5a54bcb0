use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::collections::HashSet;
use std::path::Path;

use super::error::CoreError;

/// Builds a `Gitignore` matcher rooted at `root` from `.gitignore`-style patterns.
///
/// Blank lines and comments are skipped. An empty pattern set yields a matcher
/// that never matches.
pub fn build_ignore_matcher(
    root: &Path,
    patterns: &HashSet<String>,
) -> Result<Gitignore, CoreError> {
    let mut builder = GitignoreBuilder::new(root);

    let mut sorted: Vec<&String> = patterns.iter().collect();
    sorted.sort();
    for pattern in sorted {
        let trimmed = pattern.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        builder.add_line(None, trimmed)?;
    }

    Ok(builder.build()?)
}

/// `true` if `path` (below the matcher's root) is excluded by the patterns.
pub fn is_ignored(matcher: &Gitignore, path: &Path, is_dir: bool) -> bool {
    matcher
        .matched_path_or_any_parents(path, is_dir)
        .is_ignore()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns(list: &[&str]) -> HashSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn matches_directories_and_their_contents() {
        let root = Path::new("/project");
        let list = patterns(&["target/", "*.log", "# comment", ""]);
        let matcher = build_ignore_matcher(root, &list).unwrap();

        assert!(is_ignored(&matcher, Path::new("/project/target"), true));
        assert!(is_ignored(&matcher, Path::new("/project/target/debug/app"), false));
        assert!(is_ignored(&matcher, Path::new("/project/logs/run.log"), false));
        assert!(!is_ignored(&matcher, Path::new("/project/src/main.rs"), false));
    }

    #[test]
    fn empty_pattern_set_matches_nothing() {
        let root = Path::new("/project");
        let matcher = build_ignore_matcher(root, &HashSet::new()).unwrap();
        assert!(!is_ignored(&matcher, Path::new("/project/anything"), false));
    }
}
