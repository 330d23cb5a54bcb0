//! Defines the custom error type for the `core` module.

use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for the `core` module.
///
/// Item-level problems (an unreadable file, a broken PDF, a directory that
/// cannot be listed) never surface as a `CoreError`. They are logged or
/// embedded into the output document instead. A `CoreError` always means the
/// whole operation did not happen or did not finish.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Represents an I/O error, typically from file system operations.
    #[error("I/O error for path {1}: {0}")]
    Io(#[source] std::io::Error, PathBuf),

    /// Represents an error that occurred when a Tokio task was joined.
    /// This is often due to a task panicking.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Represents a path that was expected to be a directory but was not.
    #[error("Path is not a valid directory: {0}")]
    NotADirectory(PathBuf),

    /// A path that does not belong to the currently scanned tree.
    #[error("Path is not part of the scanned tree: {0}")]
    UnknownPath(PathBuf),

    /// An extraction was requested while nothing is checked.
    #[error("No items selected for extraction")]
    NothingSelected,

    /// An operation of the same kind is already running.
    #[error("A {0} is already in progress")]
    Busy(&'static str),

    /// The assembled document could not be written to its destination.
    #[error("Failed to write output file {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The extraction worker pool could not be created.
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A pooled worker went away without delivering its record.
    #[error("Extraction worker terminated before delivering item {0}")]
    WorkerLost(usize),

    /// Represents an error while compiling ignore patterns.
    #[error("Invalid ignore pattern: {0}")]
    IgnorePattern(#[from] ignore::Error),

    /// Represents a user-initiated cancellation of an operation.
    #[error("Operation was cancelled by the user")]
    Cancelled,
}

impl CoreError {
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io(source, path.into())
    }

    /// `true` for the cancellation outcome, which is reported separately from failures.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
