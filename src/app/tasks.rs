//! Launches scans and extractions in the background.
//!
//! Both launchers validate synchronously, update [`AppState`], and hand the
//! actual work to the blocking pool. Outcomes come back as [`UserEvent`]s.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use super::events::{Operation, UserEvent};
use super::proxy::EventProxy;
use super::state::AppState;
use crate::core::file_handler::progress_percent;
use crate::core::{CoreError, DirectoryScanner, FileTree};

/// Starts a scan of `path`, replacing the currently loaded tree.
pub fn start_scan_on_path<P: EventProxy>(
    path: PathBuf,
    proxy: P,
    state: &mut AppState,
) -> Result<(), CoreError> {
    if state.is_scanning {
        return Err(CoreError::Busy(Operation::Scan.as_str()));
    }
    if !path.is_dir() {
        return Err(CoreError::NotADirectory(path));
    }
    let root_path = path.canonicalize().map_err(|e| CoreError::io(e, &path))?;

    state.reset_directory_state();
    state.root_path = Some(root_path.clone());
    state.config.last_directory = Some(root_path.clone());
    state.is_scanning = true;
    state.status_message = format!("Scanning {}...", root_path.display());

    let cancel_flag = Arc::new(AtomicBool::new(false));
    state.scan_cancellation_flag = cancel_flag.clone();
    let ignore_patterns = state.config.ignore_patterns.clone();

    tracing::info!("Starting scan of {}", root_path.display());
    let span = tracing::info_span!("scan", root = %root_path.display());
    let handle = tokio::spawn(async move {
        let task_proxy = proxy.clone();
        let result = tokio::task::spawn_blocking(move || {
            let _guard = span.enter();
            scan_directory_task(&root_path, ignore_patterns, &cancel_flag, &task_proxy)
        })
        .await;

        let event = match result.map_err(CoreError::from).and_then(|r| r) {
            Ok(tree) => UserEvent::ScanComplete(Box::new(tree)),
            Err(e) if e.is_cancelled() => UserEvent::ScanCancelled,
            Err(e) => {
                tracing::error!("Scan failed: {}", e);
                UserEvent::ScanFailed(e.to_string())
            }
        };
        proxy.send_event(event);
    });
    state.scan_task = Some(handle);
    Ok(())
}

/// Runs on the blocking pool. Progress is only sent when the percentage changes.
fn scan_directory_task<P: EventProxy>(
    root_path: &Path,
    ignore_patterns: HashSet<String>,
    cancel_flag: &AtomicBool,
    proxy: &P,
) -> Result<FileTree, CoreError> {
    let scanner = DirectoryScanner::new(ignore_patterns);
    let total = scanner.count_entries(root_path, cancel_flag)?;
    tracing::debug!("Pre-scan counted {} entries", total);

    let mut discovered = 0usize;
    let mut last_percent = None;
    let tree = scanner.scan_with_progress(root_path, cancel_flag, |_path| {
        discovered += 1;
        let percent = progress_percent(discovered, total);
        if last_percent != Some(percent) {
            last_percent = Some(percent);
            proxy.send_event(UserEvent::Progress {
                operation: Operation::Scan,
                percent,
            });
        }
    })?;

    if last_percent != Some(100) {
        proxy.send_event(UserEvent::Progress {
            operation: Operation::Scan,
            percent: 100,
        });
    }
    Ok(tree)
}

/// Starts writing every checked node of the loaded tree to `destination`.
///
/// The selection is captured now; toggles made while the job runs do not
/// affect it.
pub fn start_extraction<P: EventProxy>(
    destination: PathBuf,
    proxy: P,
    state: &mut AppState,
) -> Result<(), CoreError> {
    if state.is_extracting {
        return Err(CoreError::Busy(Operation::Extraction.as_str()));
    }
    let tree = state.tree.as_ref().ok_or(CoreError::NothingSelected)?;
    let items = tree.selected_paths();
    if items.is_empty() {
        tracing::warn!("No items selected for extraction");
        return Err(CoreError::NothingSelected);
    }
    let root_path = tree.root_path().to_path_buf();
    let handler = state.file_handler();

    let cancel_flag = Arc::new(AtomicBool::new(false));
    state.extraction_cancellation_flag = cancel_flag.clone();
    state.is_extracting = true;
    state.extraction_progress = 0;
    state.status_message = format!("Extracting {} items...", items.len());

    tracing::info!(
        "Starting extraction of {} items to {}",
        items.len(),
        destination.display()
    );
    let span = tracing::info_span!("extraction", items = items.len());
    let handle = tokio::spawn(async move {
        let task_proxy = proxy.clone();
        let result = tokio::task::spawn_blocking(move || {
            let _guard = span.enter();
            handler.extract_to_file(
                &root_path,
                &items,
                &destination,
                &cancel_flag,
                |completed, total| {
                    task_proxy.send_event(UserEvent::Progress {
                        operation: Operation::Extraction,
                        percent: progress_percent(completed, total),
                    })
                },
            )
        })
        .await;

        let event = match result.map_err(CoreError::from).and_then(|r| r) {
            Ok(summary) => UserEvent::ExtractionComplete(summary.destination),
            Err(e) if e.is_cancelled() => UserEvent::ExtractionCancelled,
            Err(e) => {
                tracing::error!("Extraction failed: {}", e);
                UserEvent::ExtractionFailed(e.to_string())
            }
        };
        proxy.send_event(event);
    });
    state.extraction_task = Some(handle);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;
    use tokio::sync::mpsc;

    #[test]
    fn cancelled_scan_stops_during_the_entry_count() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("a/b/c.py"), "c").unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let err = scan_directory_task(dir.path(), HashSet::new(), &AtomicBool::new(true), &tx)
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn scan_ends_with_full_progress() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("one.py"), "1").unwrap();
        fs::write(dir.path().join("two.py"), "2").unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let tree =
            scan_directory_task(dir.path(), HashSet::new(), &AtomicBool::new(false), &tx).unwrap();

        assert_eq!(tree.len(), 3);
        let mut last = None;
        while let Ok(event) = rx.try_recv() {
            if let UserEvent::Progress { operation, percent } = event {
                assert_eq!(operation, Operation::Scan);
                last = Some(percent);
            }
        }
        assert_eq!(last, Some(100));
    }
}
