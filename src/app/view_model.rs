//! Turns the `AppState` into something that can be displayed.
//!
//! The tree is flattened into pre-order rows with their depth, which is all a
//! terminal (or any other front end) needs to draw it.

use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;

use super::state::AppState;
use crate::core::{FileTree, NodeId, SelectionState};

/// A serializable snapshot of the application state.
#[derive(Serialize, Clone, Debug)]
pub struct UiState {
    pub root_path: Option<PathBuf>,
    pub tree: Vec<TreeRow>,
    pub total_items: usize,
    pub selected_count: usize,
    pub unreadable_directories: Vec<PathBuf>,
    pub is_scanning: bool,
    pub is_extracting: bool,
    pub status_message: String,
}

/// One visible node.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct TreeRow {
    pub name: String,
    pub path: PathBuf,
    pub depth: usize,
    pub is_directory: bool,
    pub selection_state: SelectionState,
    pub is_match: bool,
}

pub fn generate_ui_state(state: &AppState) -> UiState {
    let (tree, total_items, selected_count, unreadable_directories) = match &state.tree {
        Some(tree) => (
            build_tree_rows(tree, &state.search_matches),
            tree.len(),
            tree.selected_count(),
            tree.warnings().iter().map(|w| w.path.clone()).collect(),
        ),
        None => (Vec::new(), 0, 0, Vec::new()),
    };

    UiState {
        root_path: state.root_path.clone(),
        tree,
        total_items,
        selected_count,
        unreadable_directories,
        is_scanning: state.is_scanning,
        is_extracting: state.is_extracting,
        status_message: state.status_message.clone(),
    }
}

pub fn build_tree_rows(tree: &FileTree, matches: &HashSet<NodeId>) -> Vec<TreeRow> {
    tree.preorder(tree.root())
        .map(|id| {
            let node = tree.node(id);
            TreeRow {
                name: node.name(),
                path: node.path().to_path_buf(),
                depth: tree.depth(id),
                is_directory: node.is_directory(),
                selection_state: node.selection_state(),
                is_match: matches.contains(&id),
            }
        })
        .collect()
}

/// Renders rows as an indented checklist.
///
/// `[x]` all, `[-]` partial, `[ ]` none. Directories end with `/`, search
/// matches are prefixed with `*`.
pub fn render_tree_text(rows: &[TreeRow]) -> String {
    let mut out = String::new();
    for row in rows {
        let mark = match row.selection_state {
            SelectionState::All => "[x]",
            SelectionState::Partial => "[-]",
            SelectionState::None => "[ ]",
        };
        let highlight = if row.is_match { "* " } else { "" };
        let suffix = if row.is_directory { "/" } else { "" };
        out.push_str(&format!(
            "{}{} {}{}{}\n",
            "  ".repeat(row.depth),
            mark,
            highlight,
            row.name,
            suffix
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DirectoryScanner;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_render_marks_partial_directories_and_matches() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::create_dir(root.join("src")).unwrap();
        fs::write(root.join("src/a.rs"), "").unwrap();
        fs::write(root.join("src/b.rs"), "").unwrap();

        let mut tree = DirectoryScanner::new(HashSet::new()).scan(&root).unwrap();
        let b = tree.find(&root.join("src/b.rs")).unwrap();
        tree.toggle(b);
        let matches: HashSet<NodeId> = [b].into_iter().collect();

        let text = render_tree_text(&build_tree_rows(&tree, &matches));
        let root_name = root.file_name().unwrap().to_string_lossy();
        assert_eq!(
            text,
            format!("[-] {root_name}/\n  [-] src/\n    [x] a.rs\n    [ ] * b.rs\n")
        );
    }

    #[test]
    fn test_ui_state_without_tree() {
        let state = AppState::default();
        let ui = generate_ui_state(&state);
        assert!(ui.tree.is_empty());
        assert_eq!(ui.selected_count, 0);
        assert_eq!(ui.status_message, "Ready.");
        let json = serde_json::to_value(&ui).unwrap();
        assert_eq!(json["is_scanning"], serde_json::json!(false));
    }
}
