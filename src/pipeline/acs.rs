//! Structural extraction for ACS journal articles converted to markdown.
//!
//! ACS papers come out of PDF conversion with a recognisable but loose shape:
//! every heading is a level-2 `##` line, body headings carry a `■` bullet and
//! often a Roman-numeral ordinal (`## ■ II. RESULTS`), the first heading is
//! usually the article title with authors and affiliations below it, and the
//! tail holds acknowledgments, author notes and a numbered reference list.
//!
//! [`AcsDocument::parse`] recovers title, DOI, abstract, the body sections
//! worth annotating and the reference list, and
//! [`AcsDocument::to_clean_markdown`] re-emits them as a normalised markdown
//! document for [`crate::pipeline::chunker`].

use crate::error::ChunkError;
use crate::observer::{NoopObserver, ParseObserver};
use crate::pipeline::clean::{clean_section_content, RE_DOI_LINE};
use crate::pipeline::placeholder::decode_placeholders;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::debug;

/// Section names that never belong to the body (front matter and boilerplate).
///
/// Matched against the normalised section name as a whole, as a prefix
/// followed by a space, or as a substring starting at a word boundary.
pub const BOILERPLATE_SECTIONS: &[&str] = &[
    "associated content",
    "author information",
    "acknowledgments",
    "acknowledgement",
    "supporting information",
    "conflict of interest",
    "notes",
    "corresponding author",
    "corresponding authors",
    "orcids",
    "orcid",
    "biographies",
];

static RE_SECTION_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^##\s*[■\s]*(.+?)\s*$").unwrap());

static RE_DOI: Lazy<Regex> = Lazy::new(|| Regex::new(r"10\.\d{4,}/\S+").unwrap());

static RE_ROMAN_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[ivxlcdm]+\.\s*").unwrap());

static RE_ABSTRACT_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^ABSTRACT:\s*").unwrap());

static RE_ABSTRACT_IN_PREAMBLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)ABSTRACT:\s*(.+)").unwrap());

static RE_REFERENCE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-*]\s*\((\d+)\)\s+").unwrap());

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// A parsed ACS article.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcsDocument {
    pub title: String,
    /// Empty when the document carries no DOI.
    pub doi: String,
    /// Empty when no abstract could be located.
    pub abstract_text: String,
    /// Retained sections, each as `## name` followed by its cleaned content,
    /// separated by blank lines.
    pub body: String,
    /// Names of the sections emitted into `body`, in order.
    pub body_sections: Vec<String>,
    /// Formatted references, `[key] citation text`.
    pub references: Vec<String>,
}

impl AcsDocument {
    /// Parse `text` as an ACS article.
    ///
    /// `doc_name` is the source file name; the title falls back to a
    /// title-cased form of it when no heading qualifies.
    ///
    /// # Errors
    /// [`ChunkError::NotAcsFormatted`] when the text is blank or has no
    /// level-2 heading at all. Callers are expected to chunk the raw text
    /// generically instead.
    pub fn parse(text: &str, doc_name: &str) -> Result<Self, ChunkError> {
        Self::parse_with_observer(text, doc_name, &NoopObserver)
    }

    /// [`AcsDocument::parse`], reporting skipped sections to `observer`.
    pub fn parse_with_observer(
        text: &str,
        doc_name: &str,
        observer: &dyn ParseObserver,
    ) -> Result<Self, ChunkError> {
        if text.trim().is_empty() {
            return Err(ChunkError::NotAcsFormatted {
                name: doc_name.to_string(),
                reason: "document is empty".into(),
            });
        }
        let lines: Vec<&str> = text.lines().collect();
        if !lines.iter().any(|l| RE_SECTION_HEADER.is_match(l)) {
            return Err(ChunkError::NotAcsFormatted {
                name: doc_name.to_string(),
                reason: "no level-2 section headings".into(),
            });
        }

        let mut doc = AcsDocument {
            doi: extract_doi(text, &lines),
            title: extract_title(&lines, doc_name),
            ..Default::default()
        };
        let sections = split_sections(&lines);
        debug!("ACS document '{}': {} sections", doc_name, sections.len());

        doc.abstract_text = doc.extract_abstract(&sections);

        let mut body_parts: Vec<String> = Vec::new();
        for (name, content) in &sections {
            if name.trim().eq_ignore_ascii_case("REFERENCES") {
                doc.references = parse_references(content);
                debug!("Parsed {} references", doc.references.len());
                observer.on_section_skipped(name, "references");
                continue;
            }
            if is_boilerplate_name(&name.trim().to_lowercase()) {
                debug!("Skipping boilerplate section '{}'", name);
                observer.on_section_skipped(name, "boilerplate");
                continue;
            }
            if doc.is_title_section(name) {
                debug!("Skipping title section '{}'", name);
                observer.on_section_skipped(name, "title");
                continue;
            }
            if is_main_section(name) {
                body_parts.push(format!("## {}\n\n{}", name, clean_section_content(content)));
                doc.body_sections.push(name.clone());
            } else {
                let reason = if normalize_section_name(name) == "references" {
                    "references"
                } else {
                    "boilerplate"
                };
                debug!("Skipping non-body section '{}' ({})", name, reason);
                observer.on_section_skipped(name, reason);
            }
        }
        doc.body = body_parts.join("\n\n");

        Ok(doc)
    }

    /// Render the document as clean markdown: `# title`, optional bold DOI
    /// line, optional `## Abstract`, the body, optional `## References`.
    pub fn to_clean_markdown(&self) -> String {
        let mut parts: Vec<String> = vec![format!("# {}\n", self.title)];
        if !self.doi.is_empty() {
            parts.push(format!("**DOI:** {}\n", self.doi));
        }
        if !self.abstract_text.is_empty() {
            parts.push(format!("## Abstract\n\n{}\n", self.abstract_text));
        }
        if !self.body.is_empty() {
            parts.push(self.body.clone());
        }
        if !self.references.is_empty() {
            parts.push(format!(
                "\n## References\n\n{}",
                self.references.join("\n\n")
            ));
        }
        parts.join("\n")
    }

    /// True if `name` is the title/front-matter section (authors, affiliations).
    fn is_title_section(&self, name: &str) -> bool {
        if self.title.is_empty() {
            return false;
        }
        // The title was decoded on extraction; the raw header was not.
        normalize_section_name(&decode_placeholders(name)) == normalize_section_name(&self.title)
    }

    fn extract_abstract(&self, sections: &IndexMap<String, String>) -> String {
        if let Some((_, content)) = sections
            .iter()
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("ABSTRACT"))
        {
            let cleaned = clean_section_content(content);
            let stripped = RE_ABSTRACT_LABEL.replace(&cleaned, "").trim().to_string();
            if !stripped.is_empty() {
                return stripped;
            }
        }

        // No usable ABSTRACT section: look for an "ABSTRACT:" label in the
        // title section, where the converter often leaves it.
        sections
            .iter()
            .find(|(name, _)| self.is_title_section(name))
            .map(|(_, content)| {
                let cleaned = clean_section_content(content);
                RE_ABSTRACT_IN_PREAMBLE
                    .captures(&cleaned)
                    .map(|caps| caps[1].trim().to_string())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }
}

// ── Section names ────────────────────────────────────────────────────────────

/// Lowercase, drop one leading `■` and a Roman-numeral ordinal (`iv.`).
pub fn normalize_section_name(name: &str) -> String {
    let mut n = name.trim().to_lowercase();
    if let Some(rest) = n.strip_prefix('■') {
        n = rest.trim().to_string();
    }
    RE_ROMAN_PREFIX.replace(&n, "").trim().to_string()
}

fn is_boilerplate_name(normalized: &str) -> bool {
    let padded = format!(" {normalized}");
    BOILERPLATE_SECTIONS.iter().any(|skip| {
        normalized == *skip
            || normalized.starts_with(&format!("{skip} "))
            || padded.contains(&format!(" {skip}"))
    })
}

/// Anything that is neither the reference list nor boilerplate is body text,
/// Perspective-style headings (`I. PREAMBLE`, `II. PAST`) included.
fn is_main_section(name: &str) -> bool {
    let n = normalize_section_name(name);
    n != "references" && !is_boilerplate_name(&n)
}

// ── Metadata ─────────────────────────────────────────────────────────────────

fn extract_doi(text: &str, lines: &[&str]) -> String {
    let found = lines
        .iter()
        .find_map(|line| RE_DOI_LINE.captures(line).map(|caps| caps[1].to_string()))
        .or_else(|| RE_DOI.find(text).map(|m| m.as_str().to_string()));

    found
        .map(|doi| doi.trim_end_matches(['.', ',', ';']).to_string())
        .unwrap_or_default()
}

fn extract_title(lines: &[&str], doc_name: &str) -> String {
    for line in lines {
        if line.starts_with("## ") && !line.chars().take(15).any(|c| c == '■') {
            return decode_placeholders(line.trim_start_matches('#').trim());
        }
        if let Some(caps) = RE_SECTION_HEADER.captures(line) {
            let header = caps[1].trim();
            if !header.eq_ignore_ascii_case("ABSTRACT") {
                return decode_placeholders(header);
            }
        }
    }
    title_from_file_name(doc_name)
}

/// `"my-great-paper.md"` → `"My Great Paper"`.
fn title_from_file_name(doc_name: &str) -> String {
    let base = Path::new(doc_name)
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| doc_name.to_string());
    title_case(&base.replace(".md", "").replace('-', " "))
}

/// Uppercase the first letter of every alphabetic run, lowercase the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

// ── Sections ─────────────────────────────────────────────────────────────────

/// Split at `##` headings into header → body, in first-seen order.
///
/// A header repeated later keeps its first position and takes the later
/// body. Headings with no lines before the next heading are dropped.
fn split_sections(lines: &[&str]) -> IndexMap<String, String> {
    let mut sections = IndexMap::new();
    let mut current: Option<String> = None;
    let mut body: Vec<&str> = Vec::new();

    for line in lines {
        if let Some(caps) = RE_SECTION_HEADER.captures(line) {
            flush_section(&mut sections, current.take(), &body);
            current = Some(caps[1].trim().to_string());
            body.clear();
        } else if current.is_some() {
            body.push(line);
        }
    }
    flush_section(&mut sections, current, &body);

    sections
}

fn flush_section(sections: &mut IndexMap<String, String>, header: Option<String>, body: &[&str]) {
    if let Some(header) = header {
        if !header.is_empty() && !body.is_empty() {
            sections.insert(header, body.join("\n").trim().to_string());
        }
    }
}

// ── References ───────────────────────────────────────────────────────────────

/// Parse `- (12) Author, A. Title. J. 2020, 1, 2.` records into
/// `[12] Author, A. Title. J. 2020, 1, 2.`.
///
/// A record starts at a list marker at the beginning of a line and runs to
/// the next marker anywhere in the text (or the end). Markers in the middle
/// of a line end the previous record without starting a new one.
fn parse_references(text: &str) -> Vec<String> {
    let markers: Vec<(usize, usize, usize, &str)> = RE_REFERENCE_MARKER
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let key = caps.get(1)?.as_str();
            let before = &text[..whole.start()];
            let run_start = before.trim_end().len();
            Some((run_start, whole.start(), whole.end(), key))
        })
        .collect();

    let mut refs = Vec::new();
    for (i, &(run_start, marker_start, body_start, key)) in markers.iter().enumerate() {
        let line_anchored = run_start == 0 || text[run_start..marker_start].contains('\n');
        if !line_anchored {
            continue;
        }
        let body_end = markers
            .get(i + 1)
            .map(|&(next_run, ..)| next_run.max(body_start))
            .unwrap_or(text.len());
        let citation = RE_WHITESPACE
            .replace_all(text[body_start..body_end].trim(), " ")
            .into_owned();
        if citation.is_empty() {
            continue;
        }
        refs.push(format!("[{}] {}", key, decode_placeholders(&citation)));
    }
    refs
}
