//! Pipeline stages for turning article markdown into annotation paragraphs.
//!
//! Each submodule implements exactly one transformation step and is a pure
//! function of its input, so every stage is testable on its own and
//! documents can be processed in parallel without coordination.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ acs (optional) ──▶ chunker ──▶ filter
//! (file)    (clean markdown)   (chunks)    (paragraphs)
//! ```
//!
//! 1. [`input`]   — read a markdown file into a [`input::SourceDocument`]
//! 2. [`acs`]     — ACS structural extraction: title, DOI, abstract, body
//!    sections and references, re-emitted as clean markdown. Uses
//!    [`clean`] for per-section noise removal and [`placeholder`] for
//!    `/uniXXXX` decoding
//! 3. [`chunker`] — split markdown into sections and paragraphs, then pull
//!    figure/table captions out into their own chunk
//! 4. [`filter`]  — choose the paragraphs worth annotating

pub mod acs;
pub mod chunker;
pub mod clean;
pub mod filter;
pub mod input;
pub mod placeholder;
