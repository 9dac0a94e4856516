//! Output types produced by the pipeline.

use crate::config::ParserKind;
use serde::{Deserialize, Serialize};

/// Name of the synthetic chunk that collects every extracted caption.
pub const CAPTIONS_SECTION: &str = "Figures and Tables";

/// Name of the chunk holding text before the first section heading.
pub const PREAMBLE_SECTION: &str = "Preamble";

/// Name of the single chunk produced for a document without section headings.
pub const DOCUMENT_SECTION: &str = "Document";

/// One section of a document with its paragraphs, in document order.
///
/// Serialises as `{"section": ..., "paragraphs": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Section name as found in the source, decorations included.
    pub section: String,
    /// Paragraphs in document order.
    pub paragraphs: Vec<String>,
}

impl Chunk {
    pub fn new(section: impl Into<String>, paragraphs: Vec<String>) -> Self {
        Self {
            section: section.into(),
            paragraphs,
        }
    }

    /// True for the synthetic "Figures and Tables" chunk.
    pub fn is_captions(&self) -> bool {
        self.section == CAPTIONS_SECTION
    }
}

/// A paragraph selected for question-answer annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibleParagraph {
    /// Section name with placeholder tokens decoded.
    pub section: String,
    /// Trimmed paragraph text with placeholder tokens decoded.
    pub paragraph: String,
}

/// Counters describing one processed document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessStats {
    /// Chunks produced, the captions chunk included.
    pub chunks: usize,
    /// Paragraphs across all chunks.
    pub paragraphs: usize,
    /// Captions moved into the captions chunk.
    pub captions: usize,
    /// Paragraphs eligible for annotation.
    pub eligible_paragraphs: usize,
    /// The ACS extractor rejected the document and generic chunking ran instead.
    pub extractor_fallback: bool,
    /// The primary filter kept nothing and the relaxed pass ran.
    pub filter_fallback: bool,
    pub duration_ms: u64,
}

/// Everything the pipeline produced for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentOutput {
    /// Document name, usually the source file name.
    pub document: String,
    /// Parser that was requested for this document.
    pub parser: ParserKind,
    pub chunks: Vec<Chunk>,
    pub paragraphs: Vec<EligibleParagraph>,
    pub stats: ProcessStats,
}
