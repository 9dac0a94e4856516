//! Input resolution: read a user-supplied path into a [`SourceDocument`].
//!
//! The pipeline consumes markdown text. PDFs must go through an external
//! PDF-to-markdown converter first, so a file starting with the `%PDF` magic
//! bytes is rejected up front with a hint rather than chunked as garbage.
//! Files are decoded as UTF-8 with lossy replacement: a stray invalid byte
//! from a converter should cost one character, not the whole document.

use crate::error::ChunkError;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// A markdown document held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// File name (no directories); used for the ACS title fallback and as
    /// part of the cache key.
    pub name: String,
    /// Size of the source in bytes, as read.
    pub size: u64,
    /// Text with line endings normalised to `\n`.
    pub text: String,
}

impl SourceDocument {
    /// Build a document from text already in memory.
    pub fn from_text(name: impl Into<String>, text: impl AsRef<str>) -> Self {
        let text = text.as_ref();
        Self {
            name: name.into(),
            size: text.len() as u64,
            text: normalise_line_endings(text),
        }
    }
}

/// Read the markdown file at `path`.
pub fn resolve_input(path: impl AsRef<Path>) -> Result<SourceDocument, ChunkError> {
    let path = path.as_ref().to_path_buf();

    if !path.exists() {
        return Err(ChunkError::FileNotFound { path });
    }

    let bytes = std::fs::read(&path).map_err(|e| match e.kind() {
        ErrorKind::PermissionDenied => ChunkError::PermissionDenied { path: path.clone() },
        ErrorKind::NotFound => ChunkError::FileNotFound { path: path.clone() },
        _ => ChunkError::ReadFailed {
            path: path.clone(),
            source: e,
        },
    })?;

    if bytes.starts_with(b"%PDF") {
        return Err(ChunkError::UnsupportedInput {
            path,
            reason: "this is a PDF; convert it to markdown first (e.g. with pdf2md)".into(),
        });
    }

    let name = file_name(&path);
    let size = bytes.len() as u64;
    let text = normalise_line_endings(&String::from_utf8_lossy(&bytes));

    debug!("Resolved local markdown: {} ({} bytes)", path.display(), size);
    Ok(SourceDocument { name, size, text })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file() {
        let err = resolve_input("/definitely/not/here.md").unwrap_err();
        assert!(matches!(err, ChunkError::FileNotFound { .. }));
    }

    #[test]
    fn test_pdf_rejected() {
        let mut tmp = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        tmp.write_all(b"%PDF-1.7\n...").unwrap();
        let err = resolve_input(tmp.path()).unwrap_err();
        assert!(matches!(err, ChunkError::UnsupportedInput { .. }), "got: {err}");
    }

    #[test]
    fn test_reads_markdown_with_name_and_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper-one.md");
        std::fs::write(&path, "## A\r\n\r\nText.\r\n").unwrap();

        let doc = resolve_input(&path).unwrap();
        assert_eq!(doc.name, "paper-one.md");
        assert_eq!(doc.size, 15);
        assert_eq!(doc.text, "## A\n\nText.\n");
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"caf\xE9 au lait").unwrap();
        let doc = resolve_input(tmp.path()).unwrap();
        assert_eq!(doc.text, "caf\u{FFFD} au lait");
    }

    #[test]
    fn test_from_text() {
        let doc = SourceDocument::from_text("x.md", "a\rb");
        assert_eq!(doc.text, "a\nb");
        assert_eq!(doc.size, 3);
    }
}
