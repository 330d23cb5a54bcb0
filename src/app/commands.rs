//! Synchronous user commands against the loaded tree.
//!
//! Paths may be absolute or relative to the loaded root. Every command that
//! names a path fails with [`CoreError::UnknownPath`] when that path is not a
//! node of the current tree.

use std::path::{Path, PathBuf};

use super::state::AppState;
use crate::core::{CoreError, FileTree, NodeId, SearchEngine, SearchFilter};

/// Maps `path` to its node, trying it as given and then relative to the root.
fn resolve(tree: &FileTree, path: &Path) -> Result<NodeId, CoreError> {
    if let Some(id) = tree.find(path) {
        return Ok(id);
    }
    let joined = if path == Path::new(".") {
        tree.root_path().to_path_buf()
    } else {
        tree.root_path().join(path)
    };
    tree.find(&joined)
        .ok_or_else(|| CoreError::UnknownPath(path.to_path_buf()))
}

/// Flips the checkbox of `path`. Returns the new value.
pub fn toggle_path(state: &mut AppState, path: &Path) -> Result<bool, CoreError> {
    let Some(tree) = state.tree.as_mut() else {
        return Err(CoreError::UnknownPath(path.to_path_buf()));
    };
    let id = resolve(tree, path)?;
    Ok(tree.toggle(id))
}

/// Sets the checkbox of `path` regardless of its current value.
pub fn set_path_checked(state: &mut AppState, path: &Path, checked: bool) -> Result<(), CoreError> {
    let Some(tree) = state.tree.as_mut() else {
        return Err(CoreError::UnknownPath(path.to_path_buf()));
    };
    let id = resolve(tree, path)?;
    tree.set_checked(id, checked);
    Ok(())
}

pub fn select_all(state: &mut AppState) {
    if let Some(tree) = state.tree.as_mut() {
        tree.select_all();
    }
}

pub fn deselect_all(state: &mut AppState) {
    if let Some(tree) = state.tree.as_mut() {
        tree.deselect_all();
    }
}

/// Runs a name search and remembers the matches for highlighting.
pub fn search(state: &mut AppState, query: &str, extension: &str) -> Vec<PathBuf> {
    state.search_matches.clear();
    let Some(tree) = state.tree.as_ref() else {
        return Vec::new();
    };

    let filter = SearchFilter {
        query: query.to_string(),
        extension: extension.to_string(),
        case_sensitive: state.config.case_sensitive_search,
    };
    let matches = SearchEngine::find_matches(tree, &filter);
    let paths = matches
        .iter()
        .map(|&id| tree.node(id).path().to_path_buf())
        .collect();
    state.search_matches.extend(matches);
    paths
}

/// Preview text for a node of the loaded tree.
pub fn preview(state: &AppState, path: &Path) -> Result<String, CoreError> {
    let Some(tree) = state.tree.as_ref() else {
        return Err(CoreError::UnknownPath(path.to_path_buf()));
    };
    let id = resolve(tree, path)?;
    Ok(state
        .file_handler()
        .get_file_preview(tree.node(id).path(), state.config.preview_char_limit))
}

pub fn cancel_scan(state: &mut AppState) {
    state.cancel_current_scan();
}

pub fn cancel_extraction(state: &mut AppState) {
    state.cancel_current_extraction();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DirectoryScanner, SelectionState};
    use std::collections::HashSet;
    use std::fs as std_fs;
    use tempfile::{tempdir, TempDir};

    struct TestHarness {
        state: AppState,
        _temp_dir: TempDir,
        root_path: PathBuf,
    }

    impl TestHarness {
        fn new() -> Self {
            let temp_dir = tempdir().expect("Failed to create temp dir");
            let root_path = temp_dir.path().canonicalize().unwrap();
            Self {
                state: AppState::default(),
                _temp_dir: temp_dir,
                root_path,
            }
        }

        fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
            let path = self.root_path.join(relative_path);
            if let Some(parent) = path.parent() {
                std_fs::create_dir_all(parent).unwrap();
            }
            std_fs::write(&path, content).unwrap();
            path
        }

        fn load(&mut self) {
            let tree = DirectoryScanner::new(HashSet::new())
                .scan(&self.root_path)
                .unwrap();
            self.state.root_path = Some(self.root_path.clone());
            self.state.tree = Some(tree);
        }

        fn state_of(&self, relative_path: &str) -> SelectionState {
            let tree = self.state.tree.as_ref().unwrap();
            let id = resolve(tree, Path::new(relative_path)).unwrap();
            tree.selection_state(id)
        }
    }

    #[test]
    fn test_toggle_accepts_relative_and_absolute_paths() {
        let mut harness = TestHarness::new();
        harness.create_file("src/main.rs", "fn main() {}");
        let lib = harness.create_file("src/lib.rs", "");
        harness.load();

        assert!(!toggle_path(&mut harness.state, Path::new("src/main.rs")).unwrap());
        assert_eq!(harness.state_of("src"), SelectionState::Partial);

        assert!(!toggle_path(&mut harness.state, &lib).unwrap());
        assert_eq!(harness.state_of("src"), SelectionState::None);
    }

    #[test]
    fn test_unknown_path_is_rejected() {
        let mut harness = TestHarness::new();
        harness.create_file("a.py", "");
        harness.load();

        let err = toggle_path(&mut harness.state, Path::new("missing.py")).unwrap_err();
        assert!(matches!(err, CoreError::UnknownPath(_)));
    }

    #[test]
    fn test_commands_without_tree() {
        let mut state = AppState::default();
        assert!(toggle_path(&mut state, Path::new("a")).is_err());
        assert!(search(&mut state, "a", "").is_empty());
        select_all(&mut state);
        deselect_all(&mut state);
    }

    #[test]
    fn test_search_records_matches() {
        let mut harness = TestHarness::new();
        let main = harness.create_file("src/main.rs", "");
        harness.create_file("README.md", "");
        harness.load();

        let found = search(&mut harness.state, "MAIN", "");
        assert_eq!(found, vec![main]);
        assert_eq!(harness.state.search_matches.len(), 1);

        assert!(search(&mut harness.state, "", "").is_empty());
        assert!(harness.state.search_matches.is_empty());
    }

    #[test]
    fn test_preview_uses_configured_limit() {
        let mut harness = TestHarness::new();
        harness.create_file("a.py", "abcdef");
        harness.load();
        harness.state.config.preview_char_limit = 3;

        let text = preview(&harness.state, Path::new("a.py")).unwrap();
        assert_eq!(text, "abc\n\n[File truncated...]");
        let root = preview(&harness.state, Path::new(".")).unwrap();
        assert!(root.starts_with("Selected item is a directory: "));
    }

    #[test]
    fn test_select_and_deselect_all() {
        let mut harness = TestHarness::new();
        harness.create_file("a.py", "");
        harness.create_file("d/b.py", "");
        harness.load();

        deselect_all(&mut harness.state);
        assert_eq!(harness.state.tree.as_ref().unwrap().selected_count(), 0);
        set_path_checked(&mut harness.state, Path::new("d"), true).unwrap();
        assert_eq!(harness.state_of("."), SelectionState::Partial);
        select_all(&mut harness.state);
        assert_eq!(harness.state.tree.as_ref().unwrap().selected_count(), 4);
    }
}
