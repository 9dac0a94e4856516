//! SQuAD-style question-answer records for annotated paragraphs.
//!
//! The chunker decides which paragraphs are offered to annotators; this
//! module shapes what they write back into exportable records:
//!
//! ```json
//! {
//!   "id": "5f0c…",
//!   "context": "We used method X …",
//!   "question": "Which method was used?",
//!   "is_impossible": false,
//!   "answers": [{"text": "method X", "answer_start": 8}],
//!   "section": "Methods"
//! }
//! ```

use crate::error::ChunkError;
use crate::output::DOCUMENT_SECTION;
use crate::pipeline::filter::normalize_section;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

const MAX_SECTION_LABEL_CHARS: usize = 50;

static RE_LABEL_STRIP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").unwrap());

static RE_LABEL_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// One answer span inside a record's context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    /// Character offset of `text` in the context, or `-1` when the answer
    /// is a paraphrase rather than a literal span.
    pub answer_start: i64,
}

/// A question about one paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaRecord {
    pub id: String,
    pub context: String,
    pub question: String,
    pub is_impossible: bool,
    /// Empty for unanswerable questions.
    pub answers: Vec<Answer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl QaRecord {
    /// A record with a fresh random id.
    pub fn new(
        context: impl Into<String>,
        question: impl Into<String>,
        answer: &str,
        is_impossible: bool,
        section: &str,
    ) -> Self {
        Self::with_id(
            Uuid::new_v4().to_string(),
            context,
            question,
            answer,
            is_impossible,
            section,
        )
    }

    /// A record with a caller-chosen id, for keeping ids stable across edits.
    pub fn with_id(
        id: impl Into<String>,
        context: impl Into<String>,
        question: impl Into<String>,
        answer: &str,
        is_impossible: bool,
        section: &str,
    ) -> Self {
        let context = context.into();
        let answers = build_answers(&context, answer, is_impossible);
        Self {
            id: id.into(),
            context,
            question: question.into(),
            is_impossible,
            answers,
            section: section_label(section),
        }
    }
}

/// Answer list for `answer` in `context`.
pub fn build_answers(context: &str, answer: &str, is_impossible: bool) -> Vec<Answer> {
    if is_impossible || answer.is_empty() {
        return Vec::new();
    }
    let answer_start = context
        .find(answer)
        .map(|byte| context[..byte].chars().count() as i64)
        .unwrap_or(-1);
    vec![Answer {
        text: answer.to_string(),
        answer_start,
    }]
}

/// Label recorded for a paragraph's section, if any.
///
/// The headingless `Document` pseudo-section gets no label.
pub fn section_label(section: &str) -> Option<String> {
    if section.is_empty() || normalize_section(section).contains(&DOCUMENT_SECTION.to_uppercase()) {
        return None;
    }
    Some(sanitize_section(section))
}

/// Reduce a section name to word characters, hyphens and underscores.
///
/// `"■ II. Results & Discussion"` → `"II_Results_Discussion"`.
pub fn sanitize_section(name: &str) -> String {
    let stripped = RE_LABEL_STRIP.replace_all(name, "");
    let joined = RE_LABEL_SPACE.replace_all(stripped.trim(), "_");
    let label: String = joined.chars().take(MAX_SECTION_LABEL_CHARS).collect();
    if label.is_empty() {
        DOCUMENT_SECTION.to_string()
    } else {
        label
    }
}

/// Serialise records as a pretty-printed JSON array.
pub fn export_json(records: &[QaRecord]) -> Result<String, ChunkError> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// An editable list of records whose ids survive edits.
///
/// A record is identified by its `(context, question)` pair: re-recording
/// the same pair replaces the record in place and keeps its id, and
/// removing a record forgets the pair.
#[derive(Debug, Clone, Default)]
pub struct QaSet {
    records: Vec<QaRecord>,
    ids: HashMap<(String, String), String>,
}

impl QaSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the record for `(context, question)`; returns its id.
    pub fn record(
        &mut self,
        context: &str,
        question: &str,
        answer: &str,
        is_impossible: bool,
        section: &str,
    ) -> String {
        let key = (context.to_string(), question.to_string());
        let id = self
            .ids
            .entry(key)
            .or_insert_with(|| Uuid::new_v4().to_string())
            .clone();
        let record = QaRecord::with_id(id.clone(), context, question, answer, is_impossible, section);

        match self.records.iter_mut().find(|r| r.id == id) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
        id
    }

    /// Remove the record at `index`, returning it.
    pub fn remove(&mut self, index: usize) -> Option<QaRecord> {
        if index >= self.records.len() {
            return None;
        }
        let removed = self.records.remove(index);
        self.ids
            .remove(&(removed.context.clone(), removed.question.clone()));
        Some(removed)
    }

    pub fn records(&self) -> &[QaRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn to_json(&self) -> Result<String, ChunkError> {
        export_json(&self.records)
    }
}
