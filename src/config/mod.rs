pub mod settings;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use crate::core::file_handler::DEFAULT_PREVIEW_CHARS;
use crate::utils::file_detection::default_code_extensions;

/// Persisted user settings. Fields missing from the file take their default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Lowercase, dot-prefixed extensions whose content is extracted.
    pub code_extensions: BTreeSet<String>,
    /// Gitignore-style patterns excluded from the scan. Empty by default.
    pub ignore_patterns: HashSet<String>,
    pub last_directory: Option<PathBuf>,
    pub output_directory: Option<PathBuf>,
    /// Output file name used when no destination is given. Empty means a timestamped name.
    pub output_filename: String,
    /// Extraction workers; `None` uses one per logical CPU.
    pub worker_threads: Option<usize>,
    pub preview_char_limit: usize,
    pub case_sensitive_search: bool,
    pub log_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        settings::load_config(path)
    }

    /// `output_directory` joined with the configured or generated file name.
    pub fn default_output_path(&self) -> PathBuf {
        let directory = self
            .output_directory
            .clone()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        let filename = if self.output_filename.is_empty() {
            format!(
                "extracted_{}.txt",
                chrono::Local::now().format("%Y%m%d_%H%M%S")
            )
        } else {
            self.output_filename.clone()
        };
        directory.join(filename)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            code_extensions: default_code_extensions(),
            ignore_patterns: HashSet::new(),
            last_directory: None,
            output_directory: dirs::desktop_dir(),
            output_filename: String::new(),
            worker_threads: None,
            preview_char_limit: DEFAULT_PREVIEW_CHARS,
            case_sensitive_search: false,
            log_file: None,
        }
    }
}
