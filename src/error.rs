//! Error types for the qa-chunker library.
//!
//! Only failures that stop a document from being read at all surface as
//! [`ChunkError`] from the `process_*` entry points. Everything past input
//! resolution recovers locally:
//!
//! * the ACS structural extractor reports [`ChunkError::NotAcsFormatted`],
//!   which [`crate::convert::chunk_document`] answers by chunking the raw
//!   text with the generic chunker;
//! * a paragraph filter that keeps nothing re-runs with relaxed thresholds
//!   and, failing that, returns an empty list.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the qa-chunker library.
#[derive(Debug, Error)]
pub enum ChunkError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Markdown file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file is readable but not something this pipeline consumes.
    #[error("Unsupported input '{path}': {reason}")]
    UnsupportedInput { path: PathBuf, reason: String },

    /// Reading the file failed for a reason other than permissions.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The ACS structural extractor cannot make sense of the document.
    ///
    /// Never escapes [`crate::convert::chunk_document`]; the caller falls
    /// back to generic chunking of the unprocessed text.
    #[error("Document '{name}' is not ACS-formatted markdown: {reason}")]
    NotAcsFormatted { name: String, reason: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialisation of chunks or QA records failed.
    #[error("Failed to serialise output: {0}")]
    Serialization(#[from] serde_json::Error),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_acs_formatted_display() {
        let e = ChunkError::NotAcsFormatted {
            name: "paper.md".into(),
            reason: "no level-2 section headings".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("paper.md"), "got: {msg}");
        assert!(msg.contains("no level-2"), "got: {msg}");
    }

    #[test]
    fn unsupported_input_display() {
        let e = ChunkError::UnsupportedInput {
            path: PathBuf::from("paper.pdf"),
            reason: "PDF input must be converted to markdown first".into(),
        };
        assert!(e.to_string().contains("paper.pdf"));
        assert!(e.to_string().contains("converted to markdown"));
    }

    #[test]
    fn serialization_error_converts() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let e: ChunkError = json_err.into();
        assert!(e.to_string().starts_with("Failed to serialise output"));
    }

    #[test]
    fn invalid_config_display() {
        let e = ChunkError::InvalidConfig("concurrency must be ≥ 1".into());
        assert_eq!(e.to_string(), "Invalid configuration: concurrency must be ≥ 1");
    }
}
