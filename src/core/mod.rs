pub mod error;
pub mod file_handler;
pub mod ignore;
pub mod pdf;
pub mod scanner;
pub mod search;
pub mod selection;
pub mod tree;

pub use error::CoreError;
pub use file_handler::{ExtractionSummary, FileHandler};
pub use pdf::{PdfError, PdfExtractBackend, PdfTextExtractor};
pub use scanner::DirectoryScanner;
pub use search::{SearchEngine, SearchFilter};
pub use selection::SelectionState;
pub use tree::{FileTree, NodeId, ScanWarning, TreeNode};
