//! Name search over a scanned [`FileTree`].

use super::tree::{FileTree, NodeId};
use std::path::Path;

/// What to look for. An empty field does not restrict the result.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub query: String,
    pub extension: String,
    pub case_sensitive: bool,
}

impl SearchFilter {
    pub fn is_empty(&self) -> bool {
        self.query.is_empty() && self.extension.is_empty()
    }
}

/// Stateless matcher; all methods are associated functions.
pub struct SearchEngine;

impl SearchEngine {
    /// Every node matching `filter`, in pre-order. An empty filter matches nothing.
    pub fn find_matches(tree: &FileTree, filter: &SearchFilter) -> Vec<NodeId> {
        if filter.is_empty() {
            return Vec::new();
        }
        let matches: Vec<NodeId> = tree
            .preorder(tree.root())
            .filter(|&id| Self::matches_filter(tree.node(id).path(), filter))
            .collect();
        tracing::debug!("Search {:?} matched {} nodes", filter.query, matches.len());
        matches
    }

    pub fn matches_filter(path: &Path, filter: &SearchFilter) -> bool {
        if !filter.query.is_empty()
            && !Self::matches_search_query(path, &filter.query, filter.case_sensitive)
        {
            return false;
        }

        if !filter.extension.is_empty() && !Self::matches_extension(path, &filter.extension) {
            return false;
        }

        true
    }

    /// Substring match on the final path segment.
    fn matches_search_query(path: &Path, query: &str, case_sensitive: bool) -> bool {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();

        if case_sensitive {
            file_name.contains(query)
        } else {
            file_name.to_lowercase().contains(&query.to_lowercase())
        }
    }

    fn matches_extension(path: &Path, extension_filter: &str) -> bool {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => {
                let filter = extension_filter
                    .strip_prefix('.')
                    .unwrap_or(extension_filter);
                ext.eq_ignore_ascii_case(filter)
            }
            None => extension_filter.eq_ignore_ascii_case("no extension"),
        }
    }
}
