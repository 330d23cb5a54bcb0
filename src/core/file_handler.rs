//! Turns a list of selected paths into one text document.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use tempfile::NamedTempFile;

use super::error::CoreError;
use super::pdf::{PdfExtractBackend, PdfTextExtractor};
use super::tree::relative_to;
use crate::utils::file_detection::{is_code_file, is_pdf_file};

pub const NON_CODE_MARKER: &str = "Non-code file (content not extracted)\n";
pub const ENCODING_ERROR_MARKER: &str = "Unable to read file: encoding error\n";
pub const DEFAULT_PREVIEW_CHARS: usize = 4000;

const SEPARATOR_WIDTH: usize = 80;
const PREVIEW_TRUNCATED_MARKER: &str = "\n\n[File truncated...]";

/// Outcome of a successful extraction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionSummary {
    pub destination: PathBuf,
    pub items: usize,
    pub bytes: u64,
}

/// Renders extraction records and runs the pooled extraction job.
#[derive(Clone)]
pub struct FileHandler {
    code_extensions: BTreeSet<String>,
    pdf: Arc<dyn PdfTextExtractor>,
    worker_threads: usize,
}

impl FileHandler {
    /// A handler using the `pdf-extract` backend and one worker per logical CPU.
    pub fn new(code_extensions: BTreeSet<String>) -> Self {
        Self {
            code_extensions,
            pdf: Arc::new(PdfExtractBackend),
            worker_threads: default_worker_threads(),
        }
    }

    pub fn with_pdf_extractor(mut self, pdf: Arc<dyn PdfTextExtractor>) -> Self {
        self.pdf = pdf;
        self
    }

    /// `0` keeps the default of one worker per logical CPU.
    pub fn with_worker_threads(mut self, worker_threads: usize) -> Self {
        if worker_threads > 0 {
            self.worker_threads = worker_threads;
        }
        self
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    /// Formats the record for one selected path.
    ///
    /// Regular files get a content block; every other path (directories, but
    /// also entries that disappeared since the scan) becomes a directory record.
    pub fn render_record(&self, root_path: &Path, item: &Path) -> String {
        let relative = relative_to(item, root_path);
        let separator = "-".repeat(SEPARATOR_WIDTH);

        if item.is_file() {
            let mut record = format!("File: {}\n{}\n", relative.display(), separator);
            record.push_str(&self.file_content(item));
            record.push_str("\n\n");
            record
        } else {
            format!("Directory: {}\n{}\n\n", relative.display(), separator)
        }
    }

    /// The content block of a file record. Failures are embedded, never returned.
    fn file_content(&self, path: &Path) -> String {
        if !is_code_file(path, &self.code_extensions) {
            return NON_CODE_MARKER.to_string();
        }

        if is_pdf_file(path) {
            return match self.pdf.extract_text(path) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("PDF extraction failed for {}: {}", path.display(), e);
                    format!("Error extracting PDF content: {e}")
                }
            };
        }

        match fs::read(path) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(_) => {
                    tracing::warn!("{} is not valid UTF-8", path.display());
                    ENCODING_ERROR_MARKER.to_string()
                }
            },
            Err(e) => {
                tracing::warn!("Error reading file {}: {}", path.display(), e);
                format!("Error reading file: {e}\n")
            }
        }
    }

    /// Renders every item on the worker pool and joins the records in input order.
    ///
    /// A record is appended only once all records before it are in, so the
    /// document never depends on scheduling. `on_slot(completed, total)` runs
    /// on the calling thread once per appended record. `cancel_flag` is checked
    /// once per submitted item and once per filled slot.
    pub fn concatenate<F>(
        &self,
        root_path: &Path,
        items: &[PathBuf],
        cancel_flag: &AtomicBool,
        mut on_slot: F,
    ) -> Result<String, CoreError>
    where
        F: FnMut(usize, usize),
    {
        let total = items.len();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.worker_threads)
            .thread_name(|i| format!("extract-worker-{i}"))
            .build()?;

        tracing::debug!("Extracting {} items with {} workers", total, self.worker_threads);

        pool.in_place_scope(|scope| {
            let (tx, rx) = mpsc::channel::<(usize, String)>();

            for (index, item) in items.iter().enumerate() {
                if cancel_flag.load(Ordering::Relaxed) {
                    return Err(CoreError::Cancelled);
                }
                let tx = tx.clone();
                scope.spawn(move |_| {
                    if cancel_flag.load(Ordering::Relaxed) {
                        return;
                    }
                    let record = self.render_record(root_path, item);
                    // The receiver is gone only if the job already failed.
                    let _ = tx.send((index, record));
                });
            }
            drop(tx);

            let mut pending: BTreeMap<usize, String> = BTreeMap::new();
            let mut output = String::new();
            let mut next = 0;
            while next < total {
                if cancel_flag.load(Ordering::Relaxed) {
                    return Err(CoreError::Cancelled);
                }
                if let Some(record) = pending.remove(&next) {
                    output.push_str(&record);
                    next += 1;
                    on_slot(next, total);
                    continue;
                }
                match rx.recv() {
                    Ok((index, record)) => {
                        pending.insert(index, record);
                    }
                    Err(_) if cancel_flag.load(Ordering::Relaxed) => {
                        return Err(CoreError::Cancelled);
                    }
                    Err(_) => return Err(CoreError::WorkerLost(next)),
                }
            }
            Ok(output)
        })
    }

    /// Writes `content` to `destination` in one step.
    ///
    /// The document goes to a temporary file next to the destination which is
    /// then renamed over it, so a failed write leaves no output file behind.
    /// A new file gets the mode a plain create would give it (`0o666` minus the
    /// umask); an existing destination keeps its mode.
    pub fn write_output(destination: &Path, content: &str) -> Result<(), CoreError> {
        let parent = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = create_temp_output(parent).map_err(|e| output_error(destination, e))?;
        keep_existing_mode(temp.as_file(), destination)
            .map_err(|e| output_error(destination, e))?;
        temp.write_all(content.as_bytes())
            .map_err(|e| output_error(destination, e))?;
        temp.persist(destination)
            .map_err(|e| output_error(destination, e.error))?;
        Ok(())
    }

    /// Runs the whole job: concatenate, then write once.
    pub fn extract_to_file<F>(
        &self,
        root_path: &Path,
        items: &[PathBuf],
        destination: &Path,
        cancel_flag: &AtomicBool,
        on_slot: F,
    ) -> Result<ExtractionSummary, CoreError>
    where
        F: FnMut(usize, usize),
    {
        let content = self.concatenate(root_path, items, cancel_flag, on_slot)?;
        if cancel_flag.load(Ordering::Relaxed) {
            return Err(CoreError::Cancelled);
        }
        Self::write_output(destination, &content)?;

        tracing::info!(
            "Extracted {} items ({} bytes) to {}",
            items.len(),
            content.len(),
            destination.display()
        );
        Ok(ExtractionSummary {
            destination: destination.to_path_buf(),
            items: items.len(),
            bytes: content.len() as u64,
        })
    }

    /// Returns at most `max_chars` characters of `path` for display.
    pub fn get_file_preview(&self, path: &Path, max_chars: usize) -> String {
        tracing::debug!("Previewing: {}", path.display());

        if path.is_dir() {
            return format!("Selected item is a directory: {}", path.display());
        }
        if !path.is_file() {
            return format!("Item not found: {}", path.display());
        }

        let content = if is_pdf_file(path) {
            self.pdf
                .extract_text(path)
                .map(|text| text.chars().take(max_chars).collect::<String>())
                .map_err(|e| format!("Error previewing file: {e}"))
        } else {
            read_text_prefix(path, max_chars)
        };

        match content {
            Ok(mut text) => {
                if max_chars > 0 && text.chars().count() == max_chars {
                    text.push_str(PREVIEW_TRUNCATED_MARKER);
                }
                text
            }
            Err(message) => message,
        }
    }
}

#[cfg(unix)]
fn create_temp_output(dir: &Path) -> io::Result<NamedTempFile> {
    use std::os::unix::fs::PermissionsExt;

    // The requested mode goes through open(2), so the umask still applies.
    tempfile::Builder::new()
        .prefix(".code-extractor")
        .permissions(fs::Permissions::from_mode(0o666))
        .tempfile_in(dir)
}

#[cfg(not(unix))]
fn create_temp_output(dir: &Path) -> io::Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix(".code-extractor")
        .tempfile_in(dir)
}

/// Copies the mode of an existing `destination` onto the file replacing it.
#[cfg(unix)]
fn keep_existing_mode(replacement: &File, destination: &Path) -> io::Result<()> {
    match fs::metadata(destination) {
        Ok(existing) => replacement.set_permissions(existing.permissions()),
        Err(_) => Ok(()),
    }
}

#[cfg(not(unix))]
fn keep_existing_mode(_replacement: &File, _destination: &Path) -> io::Result<()> {
    Ok(())
}

fn output_error(destination: &Path, source: io::Error) -> CoreError {
    CoreError::OutputWrite {
        path: destination.to_path_buf(),
        source,
    }
}

/// Decodes the first `max_chars` characters of a UTF-8 file.
fn read_text_prefix(path: &Path, max_chars: usize) -> Result<String, String> {
    let byte_limit = (max_chars as u64).saturating_mul(4);
    let mut bytes = Vec::new();
    File::open(path)
        .and_then(|file| file.take(byte_limit).read_to_end(&mut bytes))
        .map_err(|e| format!("Error previewing file: {e}"))?;

    let text = match std::str::from_utf8(&bytes) {
        Ok(text) => text,
        // A multi-byte character cut by the byte limit is not an encoding error.
        Err(e) if e.error_len().is_none() && bytes.len() as u64 == byte_limit => {
            std::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default()
        }
        Err(_) => return Err("Unable to preview: encoding error".to_string()),
    };
    Ok(text.chars().take(max_chars).collect())
}

/// One worker per logical CPU.
pub fn default_worker_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// `floor(100 * completed / total)`; an empty job is complete.
pub fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    (completed.min(total) * 100 / total) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pdf::PdfError;
    use crate::utils::file_detection::default_code_extensions;
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    fn separator() -> String {
        "-".repeat(80)
    }

    fn project() -> TempDir {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "x=1").unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        fs::write(dir.path().join("bad.py"), [0xff, 0xfe, 0x00, 0x41]).unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        dir
    }

    struct FailingPdf;

    impl PdfTextExtractor for FailingPdf {
        fn extract_pages(&self, _path: &Path) -> Result<Vec<String>, PdfError> {
            Err(PdfError::Backend("no xref table".to_string()))
        }
    }

    struct TwoPages;

    impl PdfTextExtractor for TwoPages {
        fn extract_pages(&self, _path: &Path) -> Result<Vec<String>, PdfError> {
            Ok(vec!["page one".to_string(), "page two".to_string()])
        }
    }

    /// Slows down the first item so later items finish first.
    struct SlowFirstPage;

    impl PdfTextExtractor for SlowFirstPage {
        fn extract_pages(&self, path: &Path) -> Result<Vec<String>, PdfError> {
            if path.file_name().is_some_and(|n| n == "0.pdf") {
                std::thread::sleep(Duration::from_millis(150));
            }
            Ok(vec![path.file_name().unwrap().to_string_lossy().into_owned()])
        }
    }

    #[test]
    fn code_file_record_matches_format() {
        let dir = project();
        let handler = FileHandler::new(default_code_extensions());
        let record = handler.render_record(dir.path(), &dir.path().join("a.py"));
        assert_eq!(record, format!("File: a.py\n{}\nx=1\n\n", separator()));
    }

    #[test]
    fn non_code_file_gets_marker() {
        let dir = project();
        let handler = FileHandler::new(default_code_extensions());
        let record = handler.render_record(dir.path(), &dir.path().join("notes.txt"));
        assert_eq!(
            record,
            format!("File: notes.txt\n{}\n{}\n\n", separator(), NON_CODE_MARKER)
        );
    }

    #[test]
    fn directory_record_has_no_body() {
        let dir = project();
        let handler = FileHandler::new(default_code_extensions());
        let record = handler.render_record(dir.path(), &dir.path().join("sub"));
        assert_eq!(record, format!("Directory: sub\n{}\n\n", separator()));

        let root_record = handler.render_record(dir.path(), dir.path());
        assert!(root_record.starts_with("Directory: .\n"));
    }

    #[test]
    fn undecodable_file_embeds_encoding_error() {
        let dir = project();
        let handler = FileHandler::new(default_code_extensions());
        let record = handler.render_record(dir.path(), &dir.path().join("bad.py"));
        assert!(record.ends_with(&format!("{}\n\n", ENCODING_ERROR_MARKER)));
    }

    #[test]
    fn pdf_content_comes_from_the_extractor() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("doc.pdf"), "%PDF").unwrap();

        let handler =
            FileHandler::new(default_code_extensions()).with_pdf_extractor(Arc::new(TwoPages));
        let record = handler.render_record(dir.path(), &dir.path().join("doc.pdf"));
        assert!(record.ends_with("page one\npage two\n\n\n"));

        let failing =
            FileHandler::new(default_code_extensions()).with_pdf_extractor(Arc::new(FailingPdf));
        let record = failing.render_record(dir.path(), &dir.path().join("doc.pdf"));
        assert!(record.ends_with("Error extracting PDF content: no xref table\n\n"));
    }

    #[test]
    fn output_order_follows_input_order() {
        let dir = tempdir().unwrap();
        let items: Vec<PathBuf> = (0..6)
            .map(|i| {
                let path = dir.path().join(format!("{i}.pdf"));
                fs::write(&path, "%PDF").unwrap();
                path
            })
            .collect();

        let handler = FileHandler::new(default_code_extensions())
            .with_pdf_extractor(Arc::new(SlowFirstPage))
            .with_worker_threads(4);
        let mut progress = Vec::new();
        let output = handler
            .concatenate(dir.path(), &items, &AtomicBool::new(false), |done, total| {
                progress.push(progress_percent(done, total))
            })
            .unwrap();

        let positions: Vec<usize> = (0..6)
            .map(|i| output.find(&format!("File: {i}.pdf\n")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(progress, vec![16, 33, 50, 66, 83, 100]);
    }

    #[test]
    fn cancelled_job_writes_nothing() {
        let dir = project();
        let destination = dir.path().join("out.txt");
        let handler = FileHandler::new(default_code_extensions());
        let err = handler
            .extract_to_file(
                dir.path(),
                &[dir.path().join("a.py")],
                &destination,
                &AtomicBool::new(true),
                |_, _| {},
            )
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(!destination.exists());
    }

    #[test]
    fn unwritable_destination_is_fatal() {
        let dir = project();
        let destination = dir.path().join("missing_dir").join("out.txt");
        let handler = FileHandler::new(default_code_extensions());
        let err = handler
            .extract_to_file(
                dir.path(),
                &[dir.path().join("a.py")],
                &destination,
                &AtomicBool::new(false),
                |_, _| {},
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::OutputWrite { .. }));
        assert!(!destination.exists());
    }

    #[cfg(unix)]
    #[test]
    fn new_output_gets_the_usual_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let plain = dir.path().join("plain.txt");
        fs::write(&plain, "x").unwrap();
        let destination = dir.path().join("out.txt");

        FileHandler::write_output(&destination, "content").unwrap();

        let mode = |path: &Path| fs::metadata(path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&destination), mode(&plain));
        assert_eq!(fs::read_to_string(&destination).unwrap(), "content");
    }

    #[cfg(unix)]
    #[test]
    fn overwritten_output_keeps_its_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let destination = dir.path().join("out.txt");
        fs::write(&destination, "old").unwrap();
        fs::set_permissions(&destination, fs::Permissions::from_mode(0o640)).unwrap();

        FileHandler::write_output(&destination, "new").unwrap();

        let mode = fs::metadata(&destination).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
        assert_eq!(fs::read_to_string(&destination).unwrap(), "new");
    }

    #[test]
    fn preview_truncates_and_reports_kinds() {
        let dir = project();
        let handler = FileHandler::new(default_code_extensions());

        let long = dir.path().join("long.py");
        fs::write(&long, "é".repeat(20)).unwrap();
        assert_eq!(
            handler.get_file_preview(&long, 5),
            format!("{}{}", "é".repeat(5), PREVIEW_TRUNCATED_MARKER)
        );
        assert_eq!(handler.get_file_preview(&dir.path().join("a.py"), 4000), "x=1");
        assert_eq!(
            handler.get_file_preview(&dir.path().join("bad.py"), 4000),
            "Unable to preview: encoding error"
        );
        assert!(handler
            .get_file_preview(&dir.path().join("sub"), 4000)
            .starts_with("Selected item is a directory: "));
        assert!(handler
            .get_file_preview(&dir.path().join("nope"), 4000)
            .starts_with("Item not found: "));
    }

    #[test]
    fn percent_is_floored() {
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 66);
        assert_eq!(progress_percent(3, 3), 100);
        assert_eq!(progress_percent(0, 0), 100);
    }
}
