//! Defines the central, mutable state of the application.

use crate::config::AppConfig;
use crate::core::{FileHandler, FileTree, NodeId};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Holds the complete, mutable state of the application.
///
/// Owned by the foreground consumer only. Background tasks never touch it;
/// they report through the progress channel and the consumer applies their
/// events here.
pub struct AppState {
    /// The application's configuration settings.
    pub config: AppConfig,
    /// The absolute path of the currently loaded directory.
    pub root_path: Option<PathBuf>,
    /// The tree of the last completed scan.
    pub tree: Option<FileTree>,
    /// `true` if a directory scan is currently in progress.
    pub is_scanning: bool,
    /// `true` if an extraction is currently running.
    pub is_extracting: bool,
    pub scan_progress: u8,
    pub extraction_progress: u8,
    /// One-line summary of the last thing that happened.
    pub status_message: String,
    /// Nodes matching the current name search.
    pub search_matches: HashSet<NodeId>,
    /// Destination of the last completed extraction.
    pub last_output: Option<PathBuf>,
    /// A handle to the currently running scan task.
    pub scan_task: Option<JoinHandle<()>>,
    /// A flag used to signal cancellation to the scan task.
    pub scan_cancellation_flag: Arc<AtomicBool>,
    /// A handle to the currently running extraction task.
    pub extraction_task: Option<JoinHandle<()>>,
    /// A flag used to signal cancellation to the extraction task.
    pub extraction_cancellation_flag: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            root_path: None,
            tree: None,
            is_scanning: false,
            is_extracting: false,
            scan_progress: 0,
            extraction_progress: 0,
            status_message: "Ready.".to_string(),
            search_matches: HashSet::new(),
            last_output: None,
            scan_task: None,
            scan_cancellation_flag: Arc::new(AtomicBool::new(false)),
            extraction_task: None,
            extraction_cancellation_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// `true` while any background operation still has to report back.
    pub fn is_busy(&self) -> bool {
        self.is_scanning || self.is_extracting
    }

    /// A pipeline configured from the current settings.
    pub fn file_handler(&self) -> FileHandler {
        FileHandler::new(self.config.code_extensions.clone())
            .with_worker_threads(self.config.worker_threads.unwrap_or(0))
    }

    /// Asks the running scan to stop. The task still reports `ScanCancelled`.
    pub fn cancel_current_scan(&mut self) {
        if self.is_scanning {
            tracing::info!("Cancelling the running scan");
            self.scan_cancellation_flag.store(true, Ordering::SeqCst);
        } else {
            tracing::debug!("cancel_current_scan called, but no scan is running");
        }
    }

    /// Asks the running extraction to stop. The task still reports `ExtractionCancelled`.
    pub fn cancel_current_extraction(&mut self) {
        if self.is_extracting {
            tracing::info!("Cancelling the running extraction");
            self.extraction_cancellation_flag.store(true, Ordering::SeqCst);
        } else {
            tracing::debug!("cancel_current_extraction called, but no extraction is running");
        }
    }

    /// Forgets the loaded directory before a new scan starts.
    pub fn reset_directory_state(&mut self) {
        self.root_path = None;
        self.tree = None;
        self.search_matches.clear();
        self.scan_progress = 0;
        self.status_message = "Ready.".to_string();
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}
