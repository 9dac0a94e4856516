//! Section filter: which chunks and paragraphs are offered for annotation.
//!
//! Reference lists, caption chunks and the title preamble contain nothing a
//! reading-comprehension question should be asked about, and very short
//! paragraphs or tables make poor contexts. The filter drops them by section
//! name and by paragraph shape.
//!
//! Short documents can lose everything this way. When the primary pass keeps
//! nothing, a relaxed pass runs with a lower length threshold and without
//! the section-name rule; the captions chunk stays excluded either way.

use crate::config::FilterThresholds;
use crate::output::{Chunk, EligibleParagraph};
use crate::pipeline::placeholder::decode_placeholders;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// A section whose normalised name contains any of these is never annotated.
pub const EXCLUDED_SECTION_KEYWORDS: &[&str] =
    &["REFERENCE", "BIBLIOGRAPHY", "FIGURE", "TABLE", "PREAMBLE"];

static RE_ROMAN_ORDINAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[IVXLCDM]+\.\s*").unwrap());

static RE_ARABIC_ORDINAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s*").unwrap());

/// Normalise a section name for comparison.
///
/// Strips leading `■` bullets, a Roman-numeral ordinal and then an Arabic
/// one, collapses whitespace and uppercases:
/// `"■III. REFERENCES"` → `"REFERENCES"`, `"2. Results and Discussion"` →
/// `"RESULTS AND DISCUSSION"`.
pub fn normalize_section(name: &str) -> String {
    let mut n = name.trim();
    while let Some(rest) = n.strip_prefix('■') {
        n = rest.trim_start();
    }
    let n = RE_ROMAN_ORDINAL.replace(n, "");
    let n = RE_ARABIC_ORDINAL.replace(&n, "");
    n.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// True if no paragraph of a section with this name should be annotated.
pub fn is_section_excluded(name: &str) -> bool {
    let norm = normalize_section(name);
    norm.is_empty() || EXCLUDED_SECTION_KEYWORDS.iter().any(|kw| norm.contains(kw))
}

/// True if the trimmed paragraph is long enough and not a table.
pub fn is_paragraph_eligible(paragraph: &str, min_chars: usize, max_table_pipes: usize) -> bool {
    let p = paragraph.trim();
    !p.is_empty() && p.chars().count() >= min_chars && p.matches('|').count() < max_table_pipes
}

/// Paragraphs chosen for annotation, and whether the relaxed pass chose them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub paragraphs: Vec<EligibleParagraph>,
    pub used_fallback: bool,
}

/// Select annotation paragraphs from `chunks`, in document order.
///
/// Section names and paragraphs in the result are trimmed and have their
/// `/uniXXXX` placeholders decoded.
pub fn select_paragraphs(chunks: &[Chunk], thresholds: &FilterThresholds) -> Selection {
    let primary = collect(chunks, thresholds.min_paragraph_chars, thresholds.max_table_pipes, true);
    if !primary.is_empty() {
        return Selection {
            paragraphs: primary,
            used_fallback: false,
        };
    }

    let relaxed = collect(
        chunks,
        thresholds.fallback_min_paragraph_chars,
        thresholds.max_table_pipes,
        false,
    );
    debug!(
        "Primary paragraph filter kept nothing; relaxed pass kept {}",
        relaxed.len()
    );
    Selection {
        paragraphs: relaxed,
        used_fallback: true,
    }
}

fn collect(
    chunks: &[Chunk],
    min_chars: usize,
    max_table_pipes: usize,
    exclude_by_section: bool,
) -> Vec<EligibleParagraph> {
    chunks
        .iter()
        .filter(|chunk| !chunk.is_captions())
        .filter(|chunk| !(exclude_by_section && is_section_excluded(&chunk.section)))
        .flat_map(|chunk| {
            chunk
                .paragraphs
                .iter()
                .filter(move |p| is_paragraph_eligible(p, min_chars, max_table_pipes))
                .map(move |p| EligibleParagraph {
                    section: decode_placeholders(&chunk.section),
                    paragraph: decode_placeholders(p.trim()),
                })
        })
        .collect()
}
