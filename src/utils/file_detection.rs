use std::collections::BTreeSet;
use std::path::Path;

pub const PDF_EXTENSION: &str = ".pdf";

/// Extensions whose content is extracted verbatim by default.
const CODE_EXTENSIONS: &[&str] = &[
    ".py", ".pyi", ".ipynb", ".js", ".jsx", ".mjs", ".cjs", ".ts", ".tsx", ".vue", ".svelte",
    ".java", ".kt", ".kts", ".scala", ".groovy", ".gradle",
    ".c", ".h", ".cpp", ".cc", ".cxx", ".hpp", ".hxx", ".cs", ".m", ".mm", ".swift",
    ".go", ".rs", ".zig", ".nim", ".d",
    ".rb", ".php", ".pl", ".pm", ".lua", ".r", ".jl", ".dart", ".ex", ".exs", ".erl", ".hs", ".ml",
    ".clj", ".cljs", ".elm", ".fs", ".fsx",
    ".sh", ".bash", ".zsh", ".fish", ".ps1", ".bat", ".cmd",
    ".html", ".htm", ".css", ".scss", ".sass", ".less",
    ".json", ".yaml", ".yml", ".toml", ".xml", ".ini", ".cfg", ".conf", ".env",
    ".sql", ".graphql", ".proto",
    ".md", ".rst", ".tex",
    ".dockerfile", ".makefile", ".cmake",
    PDF_EXTENSION,
];

/// The built-in code-extension allow-list (lowercase, leading dot).
pub fn default_code_extensions() -> BTreeSet<String> {
    CODE_EXTENSIONS.iter().map(|ext| ext.to_string()).collect()
}

/// Normalizes a user-supplied extension to the stored form (`"PY"` -> `".py"`).
pub fn normalize_extension(extension: &str) -> String {
    let trimmed = extension.trim().to_lowercase();
    if trimmed.starts_with('.') {
        trimmed
    } else {
        format!(".{trimmed}")
    }
}

/// Determines whether the content of `path` should be extracted.
///
/// Matches on the lowercase file name ending with any allow-listed extension,
/// so multi-part extensions such as `.d.ts` work as well.
pub fn is_code_file(path: &Path, extensions: &BTreeSet<String>) -> bool {
    let Some(file_name) = path.file_name() else {
        return false;
    };
    let file_name = file_name.to_string_lossy().to_lowercase();
    extensions.iter().any(|ext| file_name.ends_with(ext.as_str()))
}

pub fn is_pdf_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().to_lowercase().ends_with(PDF_EXTENSION))
        .unwrap_or(false)
}
