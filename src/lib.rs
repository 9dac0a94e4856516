//! # qa-chunker
//!
//! Split scientific-article markdown into annotation-ready paragraphs for
//! building extractive question-answer datasets.
//!
//! ## Why this crate?
//!
//! Papers converted from PDF to markdown are noisy: running headers, journal
//! citation footers, `Received:` dates, `<!-- image -->` markers, glyph
//! placeholders such as `/uniFB01`, figure captions dropped in the middle of
//! sentences, and pages of references. Annotators should only see the prose
//! worth asking questions about. This crate recovers the article structure,
//! cuts it into sections and paragraphs, pulls captions aside and picks the
//! paragraphs that make good reading-comprehension contexts.
//!
//! ## Pipeline Overview
//!
//! ```text
//! markdown
//!  │
//!  ├─ 1. Input    read the file (PDFs are rejected with a hint)
//!  ├─ 2. ACS      title, DOI, abstract, body sections, references → clean markdown
//!  │              (skipped with the generic parser; falls back to it on failure)
//!  ├─ 3. Chunk    `## ` sections → blank-line paragraphs
//!  ├─ 4. Captions move "Figure N." / "Table N." paragraphs into their own chunk
//!  └─ 5. Filter   drop references, captions, preamble, short text and tables
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use qa_chunker::{process_file, ChunkerConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ChunkerConfig::default();
//!     let output = process_file("paper.md", &config)?;
//!     for p in &output.paragraphs {
//!         println!("[{}] {}", p.section, p.paragraph);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `qachunk` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! qa-chunker = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cache;
pub mod config;
pub mod convert;
pub mod error;
pub mod export;
pub mod observer;
pub mod output;
pub mod pipeline;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use cache::{ChunkCache, DocumentKey};
pub use config::{ChunkerConfig, ChunkerConfigBuilder, FilterThresholds, ParserKind};
pub use convert::{chunk_document, prepare_markdown, process_document, process_file, write_output};
pub use error::ChunkError;
pub use export::{build_answers, export_json, Answer, QaRecord, QaSet};
pub use observer::{NoopObserver, Observer, ParseObserver};
pub use output::{Chunk, DocumentOutput, EligibleParagraph, ProcessStats};
pub use pipeline::acs::AcsDocument;
pub use pipeline::chunker::chunk_markdown;
pub use pipeline::filter::select_paragraphs;
pub use pipeline::input::{resolve_input, SourceDocument};
pub use stream::{process_files, process_files_sync, process_stream, DocumentStream};
