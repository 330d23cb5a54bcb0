//! Check/uncheck propagation over a [`FileTree`].
//!
//! Every node carries a `checked` flag. Toggling a node forces its whole
//! subtree to the new value and then recomputes each ancestor as the AND of
//! its direct children. On top of that flag each node exposes a
//! [`SelectionState`], so a directory whose subtree is only partly checked is
//! distinguishable from one where nothing is checked.

use serde::Serialize;
use std::path::PathBuf;

use super::tree::{FileTree, NodeId};

/// Aggregated selection of a node's subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionState {
    /// The node and every descendant are checked.
    All,
    /// Nothing in the subtree is checked.
    None,
    /// Some descendants are checked, others are not.
    Partial,
}

impl SelectionState {
    fn from_checked(checked: bool) -> Self {
        if checked {
            Self::All
        } else {
            Self::None
        }
    }
}

impl FileTree {
    /// Flips `id` and propagates. Returns the new value.
    pub fn toggle(&mut self, id: NodeId) -> bool {
        let new_value = !self.node(id).checked;
        self.set_checked(id, new_value);
        new_value
    }

    /// Sets `id` (and its subtree) to `value`, then settles every ancestor.
    pub fn set_checked(&mut self, id: NodeId, value: bool) {
        tracing::debug!(
            "Setting {} to {}",
            self.node(id).path().display(),
            if value { "checked" } else { "unchecked" }
        );
        let subtree: Vec<NodeId> = self.preorder(id).collect();
        for node_id in subtree {
            let node = self.node_mut(node_id);
            node.checked = value;
            node.selection = SelectionState::from_checked(value);
        }

        let ancestors: Vec<NodeId> = self.ancestors(id).collect();
        for ancestor in ancestors {
            self.recompute(ancestor);
        }
    }

    /// Recomputes a directory from its direct children.
    fn recompute(&mut self, id: NodeId) {
        let children = self.node(id).children();
        if children.is_empty() {
            return;
        }

        let mut all = true;
        let mut none = true;
        for &child in children {
            match self.node(child).selection {
                SelectionState::All => none = false,
                SelectionState::None => all = false,
                SelectionState::Partial => {
                    all = false;
                    none = false;
                }
            }
        }

        let selection = match (all, none) {
            (true, _) => SelectionState::All,
            (false, true) => SelectionState::None,
            (false, false) => SelectionState::Partial,
        };
        let node = self.node_mut(id);
        node.checked = all;
        node.selection = selection;
    }

    pub fn select_all(&mut self) {
        self.set_checked(self.root(), true);
    }

    pub fn deselect_all(&mut self) {
        self.set_checked(self.root(), false);
    }

    pub fn selection_state(&self, id: NodeId) -> SelectionState {
        self.node(id).selection
    }

    /// Paths of every checked node in pre-order, directories included.
    ///
    /// A checked directory implies its whole subtree is checked, so the result
    /// is closed under "descendant of a checked directory".
    pub fn selected_paths(&self) -> Vec<PathBuf> {
        let selected: Vec<PathBuf> = self
            .preorder(self.root())
            .filter(|&id| self.node(id).checked)
            .map(|id| self.node(id).path().to_path_buf())
            .collect();
        tracing::debug!("Number of selected items: {}", selected.len());
        selected
    }

    pub fn selected_count(&self) -> usize {
        self.preorder(self.root())
            .filter(|&id| self.node(id).checked)
            .count()
    }
}
