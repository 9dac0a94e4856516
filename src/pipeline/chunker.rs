//! Markdown chunking: sections by `## ` heading, paragraphs by blank lines.
//!
//! Chunking runs in two passes:
//!
//! 1. [`split_sections`] cuts the document at level-2 headings and each
//!    section body at blank-line runs. Text before the first heading becomes
//!    a `Preamble` chunk; a document with no headings becomes one `Document`
//!    chunk and skips the second pass.
//! 2. [`extract_captions`] scans every chunk for figure/table caption
//!    paragraphs, moves them out, and splices the prose that the caption
//!    interrupted back into one paragraph.
//!
//! Sections are never merged: two headings with the same text produce two
//! chunks, in source order.

use crate::output::{Chunk, CAPTIONS_SECTION, DOCUMENT_SECTION, PREAMBLE_SECTION};
use once_cell::sync::Lazy;
use regex::Regex;

static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^##\s+(.+)$").unwrap());

static RE_PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());

/// `Figure 3.`, `Table 2:`, `figure 10` …
static RE_CAPTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(Figure\s+\d+|Table\s+\d+)[.:]?\s*").unwrap());

/// Chunk `markdown` into sections and paragraphs.
///
/// With `extract_captions` set, caption paragraphs are moved into a final
/// `"Figures and Tables"` chunk (see [`extract_captions`]) and chunks left
/// without paragraphs are dropped. A document without headings is returned
/// as its single `Document` chunk, captions left in place. Returns an empty
/// vector for blank input.
pub fn chunk_markdown(markdown: &str, extract_captions: bool) -> Vec<Chunk> {
    let chunks = split_sections(markdown);
    if extract_captions && has_headings(markdown) {
        self::extract_captions(chunks).into_chunks()
    } else {
        chunks
    }
}

/// True if `markdown` has at least one `## ` heading.
pub fn has_headings(markdown: &str) -> bool {
    RE_HEADING.is_match(markdown)
}

/// Pass 1: split at `## ` headings, then split each body into paragraphs.
pub fn split_sections(markdown: &str) -> Vec<Chunk> {
    let headings: Vec<(usize, usize, String)> = RE_HEADING
        .captures_iter(markdown)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some((whole.start(), whole.end(), caps[1].trim().to_string()))
        })
        .collect();

    let mut chunks = Vec::with_capacity(headings.len() + 1);

    let Some(&(first_start, ..)) = headings.first() else {
        let paragraphs = split_paragraphs(markdown);
        if !paragraphs.is_empty() {
            chunks.push(Chunk::new(DOCUMENT_SECTION, paragraphs));
        }
        return chunks;
    };

    let preamble = split_paragraphs(&markdown[..first_start]);
    if !preamble.is_empty() {
        chunks.push(Chunk::new(PREAMBLE_SECTION, preamble));
    }

    for (i, (_, body_start, header)) in headings.iter().enumerate() {
        let body_end = headings
            .get(i + 1)
            .map(|(next_start, ..)| *next_start)
            .unwrap_or(markdown.len());
        let paragraphs = split_paragraphs(&markdown[*body_start..body_end]);
        chunks.push(Chunk::new(header.clone(), paragraphs));
    }

    chunks
}

/// Split a section body at blank-line runs into trimmed, non-empty blocks.
///
/// Tables are kept verbatim as a single block like any other paragraph.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    RE_PARAGRAPH_BREAK
        .split(text)
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .map(String::from)
        .collect()
}

/// True if the paragraph starts with a figure or table label and number.
pub fn is_caption(paragraph: &str) -> bool {
    RE_CAPTION.is_match(paragraph.trim())
}

/// True if the paragraph looks like a markdown table row or table.
pub fn is_table(paragraph: &str) -> bool {
    paragraph.matches('|').count() >= 2
}

/// A caption moved out of its section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedCaption {
    /// Section the caption was found in.
    pub section: String,
    pub text: String,
}

/// Result of [`extract_captions`]: the rewritten chunks plus every caption
/// removed from them, in encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptionExtraction {
    pub chunks: Vec<Chunk>,
    pub captions: Vec<ExtractedCaption>,
}

impl CaptionExtraction {
    /// The chunks followed by a `"Figures and Tables"` chunk holding all
    /// captions, if there were any.
    pub fn into_chunks(self) -> Vec<Chunk> {
        let mut chunks = self.chunks;
        if !self.captions.is_empty() {
            let captions = self.captions.into_iter().map(|c| c.text).collect();
            chunks.push(Chunk::new(CAPTIONS_SECTION, captions));
        }
        chunks
    }
}

/// Pass 2: remove captions and splice the paragraphs around them.
///
/// For each caption, with `next` the following paragraph in the same chunk
/// when it is not a table:
///
/// | kept paragraph before? | `next`  | result                                   |
/// |------------------------|---------|------------------------------------------|
/// | yes                    | present | `next` appended to it with one space     |
/// | no                     | present | `next` kept as its own paragraph         |
/// | either                 | absent  | caption dropped, scan resumes after it   |
///
/// A table after a caption is never merged; it is kept on the next step of
/// the scan. Chunks left without paragraphs are dropped.
pub fn extract_captions(chunks: Vec<Chunk>) -> CaptionExtraction {
    let mut out = CaptionExtraction::default();

    for chunk in chunks {
        let paras = &chunk.paragraphs;
        let mut kept: Vec<String> = Vec::with_capacity(paras.len());
        let mut i = 0;

        while i < paras.len() {
            let para = &paras[i];
            if !is_caption(para) {
                kept.push(para.clone());
                i += 1;
                continue;
            }

            out.captions.push(ExtractedCaption {
                section: chunk.section.clone(),
                text: para.clone(),
            });

            let next = paras.get(i + 1).filter(|n| !is_table(n));
            match next {
                Some(next) => {
                    if let Some(prev) = kept.last_mut() {
                        *prev = format!("{} {}", prev.trim_end(), next.trim_start());
                    } else {
                        kept.push(next.clone());
                    }
                    i += 2;
                }
                None => i += 1,
            }
        }

        if !kept.is_empty() {
            out.chunks.push(Chunk::new(chunk.section, kept));
        }
    }

    out
}
