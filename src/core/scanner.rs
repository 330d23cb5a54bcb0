//! Materializes a directory subtree as a [`FileTree`].

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use walkdir::WalkDir;

use super::error::CoreError;
use super::ignore::{build_ignore_matcher, is_ignored};
use super::tree::FileTree;

/// Lists one directory as `(path, is_dir)` pairs sorted by name.
pub(crate) type EntryReader = fn(&Path) -> io::Result<Vec<(PathBuf, bool)>>;

pub struct DirectoryScanner {
    ignore_patterns: HashSet<String>,
    entry_reader: EntryReader,
}

impl DirectoryScanner {
    pub fn new(ignore_patterns: HashSet<String>) -> Self {
        Self {
            ignore_patterns,
            entry_reader: Self::read_sorted_entries,
        }
    }

    /// Replaces how directories are listed.
    pub(crate) fn with_entry_reader(mut self, entry_reader: EntryReader) -> Self {
        self.entry_reader = entry_reader;
        self
    }

    /// Scans without progress reporting or cancellation.
    pub fn scan(&self, root_path: &Path) -> Result<FileTree, CoreError> {
        let never_cancelled = AtomicBool::new(false);
        self.scan_with_progress(root_path, &never_cancelled, |_| {})
    }

    /// Walks `root_path` and returns the complete tree.
    ///
    /// Directories waiting for expansion sit on a LIFO stack, so the walk never
    /// recurses. Within one directory, entries are appended sorted by file name;
    /// sibling subdirectories are expanded last-discovered first, which only
    /// affects the order of `progress_callback` invocations, not the tree shape.
    ///
    /// `progress_callback` runs once per discovered entry. A directory that
    /// cannot be listed is logged, recorded as a warning on the tree and left
    /// without children; it never aborts the scan. `cancel_flag` is checked
    /// once per directory.
    pub fn scan_with_progress<F>(
        &self,
        root_path: &Path,
        cancel_flag: &AtomicBool,
        mut progress_callback: F,
    ) -> Result<FileTree, CoreError>
    where
        F: FnMut(&Path),
    {
        if !root_path.is_dir() {
            return Err(CoreError::NotADirectory(root_path.to_path_buf()));
        }

        let matcher = build_ignore_matcher(root_path, &self.ignore_patterns)?;
        let mut tree = FileTree::new(root_path);
        let mut stack = vec![tree.root()];
        let mut discovered = 0usize;

        while let Some(dir_id) = stack.pop() {
            if cancel_flag.load(Ordering::Relaxed) {
                tracing::info!("Scan cancelled after {} entries", discovered);
                return Err(CoreError::Cancelled);
            }

            let dir_path = tree.node(dir_id).path().to_path_buf();
            let entries = match (self.entry_reader)(&dir_path) {
                Ok(entries) => entries,
                Err(e) => {
                    if e.kind() == io::ErrorKind::PermissionDenied {
                        tracing::error!("Permission denied: {}", dir_path.display());
                    } else {
                        tracing::error!("Error scanning directory {}: {}", dir_path.display(), e);
                    }
                    tree.push_warning(dir_path, e.to_string());
                    continue;
                }
            };

            for (path, is_dir) in entries {
                if is_ignored(&matcher, &path, is_dir) {
                    continue;
                }
                let child = tree.add_child(dir_id, path.clone());
                if is_dir {
                    stack.push(child);
                }
                discovered += 1;
                progress_callback(&path);
            }
        }

        tracing::info!(
            "Scan of {} completed: {} entries, {} unreadable directories",
            root_path.display(),
            discovered,
            tree.warnings().len()
        );
        Ok(tree)
    }

    /// Counts the entries a scan of `root_path` would discover.
    ///
    /// Used as the denominator for scan progress; unreadable directories simply
    /// contribute nothing. `cancel_flag` is checked once per directory, like
    /// the scan itself.
    pub fn count_entries(
        &self,
        root_path: &Path,
        cancel_flag: &AtomicBool,
    ) -> Result<usize, CoreError> {
        let matcher = build_ignore_matcher(root_path, &self.ignore_patterns)?;
        let walker = WalkDir::new(root_path)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                let is_dir = entry.file_type().is_dir();
                entry.depth() == 0 || !is_ignored(&matcher, entry.path(), is_dir)
            })
            .filter_map(Result::ok);

        let mut count = 0usize;
        for entry in walker {
            if entry.file_type().is_dir() && cancel_flag.load(Ordering::Relaxed) {
                tracing::info!("Entry count cancelled after {} entries", count);
                return Err(CoreError::Cancelled);
            }
            if entry.depth() > 0 {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Lists the direct entries of `dir`, sorted by name.
    ///
    /// Symlinks are reported as non-directories so they are never expanded.
    fn read_sorted_entries(dir: &Path) -> io::Result<Vec<(PathBuf, bool)>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    continue;
                }
            };
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            entries.push((entry.path(), is_dir));
        }
        entries.sort_by(|(a, _), (b, _)| a.file_name().cmp(&b.file_name()));
        Ok(entries)
    }
}
