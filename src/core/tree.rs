//! The in-memory representation of one scanned filesystem subtree.
//!
//! Nodes are stored in an arena owned by [`FileTree`] and addressed by
//! [`NodeId`]. Parent links are plain indices, so the only ownership edge is
//! the arena itself. A path index maps every scanned path back to its node,
//! which lets the presentation layer go from a displayed entry to the node it
//! represents without rebuilding paths from labels.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::selection::SelectionState;

/// Stable index of a node within a [`FileTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// One scanned filesystem entry.
#[derive(Debug, Clone)]
pub struct TreeNode {
    path: PathBuf,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    pub(crate) checked: bool,
    pub(crate) selection: SelectionState,
}

impl TreeNode {
    fn new(path: PathBuf, parent: Option<NodeId>) -> Self {
        Self {
            path,
            parent,
            children: Vec::new(),
            checked: true,
            selection: SelectionState::All,
        }
    }

    /// The absolute path recorded at scan time. This is the node's identity.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path segment, or the full path for a filesystem root.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Queries the filesystem; a directory replaced after the scan reports its current type.
    pub fn is_directory(&self) -> bool {
        self.path.is_dir()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in the order the scanner appended them.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_checked(&self) -> bool {
        self.checked
    }

    pub fn selection_state(&self) -> SelectionState {
        self.selection
    }
}

/// A directory that could not be enumerated during the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanWarning {
    pub path: PathBuf,
    pub message: String,
}

/// A fully materialized scan result.
#[derive(Debug, Clone)]
pub struct FileTree {
    root_path: PathBuf,
    nodes: Vec<TreeNode>,
    index: HashMap<PathBuf, NodeId>,
    warnings: Vec<ScanWarning>,
}

impl FileTree {
    /// Creates a tree holding only the root node.
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        let root_path = root_path.into();
        let mut index = HashMap::new();
        index.insert(root_path.clone(), NodeId(0));
        Self {
            nodes: vec![TreeNode::new(root_path.clone(), None)],
            root_path,
            index,
            warnings: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Appends a new child to `parent`.
    ///
    /// # Panics
    /// Panics if `parent` does not belong to this tree.
    pub fn add_child(&mut self, parent: NodeId, path: PathBuf) -> NodeId {
        if let Some(existing) = self.index.get(&path) {
            tracing::warn!("Path {} is already part of the tree", path.display());
            return *existing;
        }
        let id = NodeId(self.nodes.len());
        self.index.insert(path.clone(), id);
        self.nodes.push(TreeNode::new(path, Some(parent)));
        self.nodes[parent.0].children.push(id);
        id
    }

    /// # Panics
    /// Panics if `id` does not belong to this tree.
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.0)
    }

    /// O(1) lookup of the node scanned at `path`.
    pub fn find(&self, path: &Path) -> Option<NodeId> {
        self.index.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn warnings(&self) -> &[ScanWarning] {
        &self.warnings
    }

    pub(crate) fn push_warning(&mut self, path: PathBuf, message: String) {
        self.warnings.push(ScanWarning { path, message });
    }

    /// Path of `id` relative to the scan root; the root itself is `.`.
    pub fn relative_path(&self, id: NodeId) -> PathBuf {
        relative_to(self.node(id).path(), &self.root_path)
    }

    /// Number of edges between `id` and the root.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.node(id).parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.node(parent).parent;
        }
        depth
    }

    /// Pre-order walk of the subtree rooted at `start`, children in stored order.
    pub fn preorder(&self, start: NodeId) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![start],
        }
    }

    /// Strict ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.node(id).parent,
        }
    }
}

/// Iterator returned by [`FileTree::preorder`].
pub struct Preorder<'a> {
    tree: &'a FileTree,
    stack: Vec<NodeId>,
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack.extend(self.tree.node(id).children.iter().rev().copied());
        Some(id)
    }
}

/// Iterator returned by [`FileTree::ancestors`].
pub struct Ancestors<'a> {
    tree: &'a FileTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.tree.node(id).parent;
        Some(id)
    }
}

/// `path` relative to `root`, with `.` standing in for the root itself.
pub fn relative_to(path: &Path, root: &Path) -> PathBuf {
    match path.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => PathBuf::from("."),
        Ok(rel) => rel.to_path_buf(),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (FileTree, NodeId, NodeId, NodeId) {
        let mut tree = FileTree::new("/project");
        let src = tree.add_child(tree.root(), PathBuf::from("/project/src"));
        let main = tree.add_child(src, PathBuf::from("/project/src/main.rs"));
        let readme = tree.add_child(tree.root(), PathBuf::from("/project/README.md"));
        (tree, src, main, readme)
    }

    #[test]
    fn children_keep_insertion_order_and_parent_links() {
        let (tree, src, main, readme) = sample();
        assert_eq!(tree.node(tree.root()).children(), &[src, readme]);
        assert_eq!(tree.node(main).parent(), Some(src));
        assert_eq!(tree.node(tree.root()).parent(), None);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn find_maps_paths_back_to_nodes() {
        let (tree, _, main, _) = sample();
        assert_eq!(tree.find(Path::new("/project/src/main.rs")), Some(main));
        assert_eq!(tree.find(Path::new("/project/missing")), None);
    }

    #[test]
    fn relative_paths_and_names() {
        let (tree, src, main, _) = sample();
        assert_eq!(tree.relative_path(tree.root()), PathBuf::from("."));
        assert_eq!(tree.relative_path(main), PathBuf::from("src/main.rs"));
        assert_eq!(tree.node(src).name(), "src");
        assert_eq!(tree.depth(main), 2);
    }

    #[test]
    fn preorder_visits_parents_before_children() {
        let (tree, src, main, readme) = sample();
        let order: Vec<_> = tree.preorder(tree.root()).collect();
        assert_eq!(order, vec![tree.root(), src, main, readme]);
        let ancestors: Vec<_> = tree.ancestors(main).collect();
        assert_eq!(ancestors, vec![src, tree.root()]);
    }
}
