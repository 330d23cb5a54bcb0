//! Messages sent from background work to the single foreground consumer.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::core::FileTree;

/// The long-running operations that report progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Scan,
    Extraction,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Scan => "scan",
            Operation::Extraction => "extraction",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events delivered over the progress channel.
///
/// Every operation ends with exactly one of its `Complete`, `Failed` or
/// `Cancelled` variants; `Progress` events only precede it.
#[derive(Debug)]
pub enum UserEvent {
    /// Integer percentage in `0..=100`.
    Progress { operation: Operation, percent: u8 },
    ScanComplete(Box<FileTree>),
    ScanFailed(String),
    ScanCancelled,
    /// Carries the path of the written document.
    ExtractionComplete(PathBuf),
    ExtractionFailed(String),
    ExtractionCancelled,
}
