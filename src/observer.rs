//! Observer trait for per-document parsing events.
//!
//! Inject an [`Arc<dyn ParseObserver>`] via
//! [`crate::config::ChunkerConfigBuilder::observer`] to receive events as the
//! pipeline extracts, chunks and filters each document.
//!
//! The library also emits `tracing` events for the same decisions; the
//! observer exists for callers that need the information as data (counters,
//! a UI status line, a test assertion) rather than as log lines.
//!
//! # Example
//!
//! ```rust
//! use qa_chunker::{ChunkerConfig, ParseObserver};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CaptionCounter {
//!     captions: AtomicUsize,
//! }
//!
//! impl ParseObserver for CaptionCounter {
//!     fn on_caption_extracted(&self, _section: &str, _caption: &str) {
//!         self.captions.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(CaptionCounter { captions: AtomicUsize::new(0) });
//!
//! let config = ChunkerConfig::builder()
//!     .observer(counter.clone() as Arc<dyn ParseObserver>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the pipeline as it processes a document.
///
/// Implementations must be `Send + Sync`: batch processing runs distinct
/// documents on separate worker threads and shares one observer between
/// them. All methods have default no-op implementations so callers only
/// override what they care about.
pub trait ParseObserver: Send + Sync {
    /// Called once before a document is chunked.
    ///
    /// # Arguments
    /// * `name`   — document name (usually the file name)
    /// * `parser` — `"acs"` or `"generic"`
    fn on_document_start(&self, name: &str, parser: &str) {
        let _ = (name, parser);
    }

    /// Called when the ACS extractor leaves a section out of the body.
    ///
    /// # Arguments
    /// * `section` — section header as found in the source
    /// * `reason`  — short tag: `"references"`, `"boilerplate"` or `"title"`
    fn on_section_skipped(&self, section: &str, reason: &str) {
        let _ = (section, reason);
    }

    /// Called when the ACS extractor failed and generic chunking took over.
    fn on_extractor_fallback(&self, name: &str, error: &str) {
        let _ = (name, error);
    }

    /// Called for every caption paragraph moved into the captions chunk.
    fn on_caption_extracted(&self, section: &str, caption: &str) {
        let _ = (section, caption);
    }

    /// Called when the primary paragraph filter kept nothing and the relaxed
    /// pass ran instead.
    ///
    /// # Arguments
    /// * `kept` — paragraphs the relaxed pass kept (may be zero)
    fn on_filter_fallback(&self, kept: usize) {
        let _ = kept;
    }

    /// Called once after a document has been chunked and filtered.
    ///
    /// # Arguments
    /// * `chunks`     — number of chunks produced
    /// * `paragraphs` — number of paragraphs eligible for annotation
    fn on_document_complete(&self, name: &str, chunks: usize, paragraphs: usize) {
        let _ = (name, chunks, paragraphs);
    }
}

/// A no-op implementation for callers that don't need parsing events.
///
/// This is the default when no observer is configured.
pub struct NoopObserver;

impl ParseObserver for NoopObserver {}

/// Convenience alias matching the type stored in [`crate::config::ChunkerConfig`].
pub type Observer = Arc<dyn ParseObserver>;
