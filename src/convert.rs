//! Eager (single-document) entry points.
//!
//! These functions tie the pipeline stages together for one document:
//! optional ACS extraction, chunking, caption extraction and paragraph
//! selection. They are synchronous and hold no state between calls; see
//! [`crate::stream`] for processing many documents at once and
//! [`crate::cache`] for memoising results.

use crate::config::{ChunkerConfig, ParserKind};
use crate::error::ChunkError;
use crate::observer::{NoopObserver, Observer, ParseObserver};
use crate::output::{Chunk, DocumentOutput, ProcessStats};
use crate::pipeline::acs::AcsDocument;
use crate::pipeline::input::{self, SourceDocument};
use crate::pipeline::{chunker, filter};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Markdown ready for the chunker, and how it was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedMarkdown {
    pub markdown: String,
    /// The ACS extractor was requested but rejected the document, so
    /// `markdown` is the raw text.
    pub extractor_fallback: bool,
}

/// Produce the markdown the chunker will see for `doc`.
///
/// With [`ParserKind::Acs`] this is the extractor's clean markdown; if the
/// extractor fails, the raw text is used instead and the failure is
/// reported to `observer` and logged, never returned.
pub fn prepare_markdown(
    doc: &SourceDocument,
    parser: ParserKind,
    observer: &dyn ParseObserver,
) -> PreparedMarkdown {
    match parser {
        ParserKind::Generic => PreparedMarkdown {
            markdown: doc.text.clone(),
            extractor_fallback: false,
        },
        ParserKind::Acs => match AcsDocument::parse_with_observer(&doc.text, &doc.name, observer) {
            Ok(acs) => {
                debug!(
                    "ACS extraction of '{}': title {:?}, {} body sections, {} references",
                    doc.name,
                    acs.title,
                    acs.body_sections.len(),
                    acs.references.len()
                );
                PreparedMarkdown {
                    markdown: acs.to_clean_markdown(),
                    extractor_fallback: false,
                }
            }
            Err(e) => {
                warn!("ACS extraction failed, chunking raw text instead: {}", e);
                observer.on_extractor_fallback(&doc.name, &e.to_string());
                PreparedMarkdown {
                    markdown: doc.text.clone(),
                    extractor_fallback: true,
                }
            }
        },
    }
}

/// Chunk a document according to `config`.
///
/// Never fails: an ACS extraction error falls back to generic chunking of
/// the raw text.
pub fn chunk_document(doc: &SourceDocument, config: &ChunkerConfig) -> Vec<Chunk> {
    let observer = observer_of(config);
    chunk_prepared(doc, config, observer.as_ref()).chunks
}

/// Chunk a document and select its annotation paragraphs.
pub fn process_document(doc: &SourceDocument, config: &ChunkerConfig) -> DocumentOutput {
    let start = Instant::now();
    let observer = observer_of(config);
    observer.on_document_start(&doc.name, config.parser.as_str());

    let chunked = chunk_prepared(doc, config, observer.as_ref());

    let selection = filter::select_paragraphs(&chunked.chunks, &config.thresholds);
    if selection.used_fallback {
        info!(
            "'{}': no paragraph passed the primary filter; relaxed pass kept {}",
            doc.name,
            selection.paragraphs.len()
        );
        observer.on_filter_fallback(selection.paragraphs.len());
    }

    let stats = ProcessStats {
        chunks: chunked.chunks.len(),
        paragraphs: chunked.chunks.iter().map(|c| c.paragraphs.len()).sum(),
        captions: chunked.captions,
        eligible_paragraphs: selection.paragraphs.len(),
        extractor_fallback: chunked.extractor_fallback,
        filter_fallback: selection.used_fallback,
        duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Processed '{}' ({}): {} chunks, {} eligible paragraphs, {}ms",
        doc.name, config.parser, stats.chunks, stats.eligible_paragraphs, stats.duration_ms
    );
    observer.on_document_complete(&doc.name, stats.chunks, stats.eligible_paragraphs);

    DocumentOutput {
        document: doc.name.clone(),
        parser: config.parser,
        chunks: chunked.chunks,
        paragraphs: selection.paragraphs,
        stats,
    }
}

/// Read a markdown file and process it.
///
/// # Errors
/// Only input errors: missing or unreadable file, or a PDF.
pub fn process_file(
    path: impl AsRef<Path>,
    config: &ChunkerConfig,
) -> Result<DocumentOutput, ChunkError> {
    let doc = input::resolve_input(path)?;
    Ok(process_document(&doc, config))
}

/// Write `contents` to `path` atomically, creating parent directories as
/// needed. A reader never sees a partially written file.
pub fn write_output(path: impl AsRef<Path>, contents: &str) -> Result<(), ChunkError> {
    let path = path.as_ref();
    let write_err = |source| ChunkError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            std::fs::create_dir_all(parent).map_err(write_err)?;
            parent
        }
        None => Path::new("."),
    };

    // Temp file in the target directory so the rename stays on one filesystem.
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(contents.as_bytes()).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    debug!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

// ── Internal helpers ─────────────────────────────────────────────────────

struct Chunked {
    chunks: Vec<Chunk>,
    captions: usize,
    extractor_fallback: bool,
}

fn chunk_prepared(doc: &SourceDocument, config: &ChunkerConfig, observer: &dyn ParseObserver) -> Chunked {
    let prepared = prepare_markdown(doc, config.parser, observer);
    let sections = chunker::split_sections(&prepared.markdown);

    if !config.extract_captions || !chunker::has_headings(&prepared.markdown) {
        return Chunked {
            chunks: sections,
            captions: 0,
            extractor_fallback: prepared.extractor_fallback,
        };
    }

    let extraction = chunker::extract_captions(sections);
    for caption in &extraction.captions {
        observer.on_caption_extracted(&caption.section, &caption.text);
    }
    let captions = extraction.captions.len();
    debug!("'{}': extracted {} captions", doc.name, captions);

    Chunked {
        chunks: extraction.into_chunks(),
        captions,
        extractor_fallback: prepared.extractor_fallback,
    }
}

fn observer_of(config: &ChunkerConfig) -> Observer {
    config
        .observer
        .clone()
        .unwrap_or_else(|| Arc::new(NoopObserver))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        fallbacks: Mutex<Vec<String>>,
        captions: AtomicUsize,
        filter_fallbacks: AtomicUsize,
        completed: AtomicUsize,
    }

    impl ParseObserver for Recorder {
        fn on_extractor_fallback(&self, name: &str, _error: &str) {
            self.fallbacks.lock().unwrap().push(name.to_string());
        }
        fn on_caption_extracted(&self, _section: &str, _caption: &str) {
            self.captions.fetch_add(1, Ordering::SeqCst);
        }
        fn on_filter_fallback(&self, _kept: usize) {
            self.filter_fallbacks.fetch_add(1, Ordering::SeqCst);
        }
        fn on_document_complete(&self, _name: &str, _chunks: usize, _paragraphs: usize) {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }
    }

    const SPEC_EXAMPLE: &str = "## Intro\nShort.\n\n## Methods\nFigure 1. A chart.\n\nWe used method X for a long enough paragraph to pass the length threshold of one hundred characters total.";

    fn generic() -> ChunkerConfig {
        ChunkerConfig::builder()
            .parser(ParserKind::Generic)
            .build()
            .unwrap()
    }

    #[test]
    fn end_to_end_generic_document() {
        let doc = SourceDocument::from_text("doc.md", SPEC_EXAMPLE);
        let out = process_document(&doc, &generic());

        assert_eq!(out.paragraphs.len(), 1);
        assert_eq!(out.paragraphs[0].section, "Methods");
        assert!(out.paragraphs[0].paragraph.starts_with("We used method X"));
        assert!(!out.stats.filter_fallback);

        let captions = out.chunks.last().unwrap();
        assert!(captions.is_captions());
        assert_eq!(captions.paragraphs, vec!["Figure 1. A chart."]);
        assert_eq!(out.stats.captions, 1);
    }

    #[test]
    fn acs_parser_falls_back_to_generic_on_headingless_text() {
        let recorder = Arc::new(Recorder::default());
        let config = ChunkerConfig::builder()
            .observer(recorder.clone())
            .build()
            .unwrap();
        let doc = SourceDocument::from_text("notes.md", "Plain text without any headings at all.");

        let out = process_document(&doc, &config);
        assert!(out.stats.extractor_fallback);
        assert_eq!(out.chunks, vec![Chunk::new("Document", vec![doc.text.clone()])]);
        assert_eq!(recorder.fallbacks.lock().unwrap().as_slice(), ["notes.md"]);
        assert_eq!(recorder.completed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn fallback_output_equals_generic_output() {
        let doc = SourceDocument::from_text("x.md", "Para one.\n\nFigure 1. cap\n\nPara two.");
        let acs = chunk_document(&doc, &ChunkerConfig::default());
        assert_eq!(acs, chunk_document(&doc, &generic()));
    }

    #[test]
    fn headingless_document_skips_caption_pass() {
        let recorder = Arc::new(Recorder::default());
        let config = ChunkerConfig::builder()
            .parser(ParserKind::Generic)
            .observer(recorder.clone())
            .build()
            .unwrap();
        let doc = SourceDocument::from_text("x.md", "Para one.\n\nFigure 1. cap\n\nPara two.");
        let out = process_document(&doc, &config);

        assert_eq!(
            out.chunks,
            vec![Chunk::new(
                "Document",
                vec!["Para one.".into(), "Figure 1. cap".into(), "Para two.".into()],
            )]
        );
        assert_eq!(out.stats.captions, 0);
        assert_eq!(recorder.captions.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn acs_parser_routes_through_clean_markdown() {
        let text = "## A Study of Things\n\nAuthors\n\n## ■ INTRODUCTION\n\nText.\n\n## ■ NOTES\n\nNone.";
        let doc = SourceDocument::from_text("x.md", text);
        let chunks = chunk_document(&doc, &ChunkerConfig::default());
        let sections: Vec<&str> = chunks.iter().map(|c| c.section.as_str()).collect();
        assert_eq!(sections, vec!["Preamble", "INTRODUCTION"]);
        assert_eq!(chunks[0].paragraphs, vec!["# A Study of Things"]);
    }

    #[test]
    fn caption_extraction_can_be_disabled() {
        let config = ChunkerConfig::builder()
            .parser(ParserKind::Generic)
            .extract_captions(false)
            .build()
            .unwrap();
        let doc = SourceDocument::from_text("doc.md", SPEC_EXAMPLE);
        let chunks = chunk_document(&doc, &config);
        assert!(chunks.iter().all(|c| !c.is_captions()));
        assert_eq!(chunks[1].paragraphs[0], "Figure 1. A chart.");
    }

    #[test]
    fn observer_sees_captions_and_filter_fallback() {
        let recorder = Arc::new(Recorder::default());
        let config = ChunkerConfig::builder()
            .parser(ParserKind::Generic)
            .observer(recorder.clone())
            .build()
            .unwrap();
        let text = "## Results\n\nThis paragraph is comfortably over fifty characters long.\n\nTable 1. Yields\n\n| a | b |";
        let out = process_document(&SourceDocument::from_text("r.md", text), &config);

        assert!(out.stats.filter_fallback);
        assert_eq!(out.paragraphs.len(), 1);
        assert_eq!(recorder.captions.load(Ordering::SeqCst), 1);
        assert_eq!(recorder.filter_fallbacks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn process_file_reports_missing_input() {
        let err = process_file("/no/such/file.md", &ChunkerConfig::default()).unwrap_err();
        assert!(matches!(err, ChunkError::FileNotFound { .. }));
    }

    #[test]
    fn write_output_creates_parents_replaces_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.json");
        write_output(&path, "[]").unwrap();
        write_output(&path, "[1]").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[1]");
        let entries = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1);
    }
}
