//! In-memory memoisation of processed documents.
//!
//! Annotation tools re-request the same paper many times while a user
//! pages through it. [`ChunkCache`] keeps each [`DocumentOutput`] keyed by
//! document name, source size and every config setting that shapes the
//! output, so a repeat request costs a map lookup. Entries are never evicted; drop the cache or call
//! [`ChunkCache::clear`] to release them.

use crate::config::{ChunkerConfig, FilterThresholds, ParserKind};
use crate::convert;
use crate::error::ChunkError;
use crate::output::DocumentOutput;
use crate::pipeline::input::{self, SourceDocument};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Identity of a processed document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    pub name: String,
    pub size: u64,
    pub parser: ParserKind,
    pub extract_captions: bool,
    pub thresholds: FilterThresholds,
}

impl DocumentKey {
    pub fn new(doc: &SourceDocument, config: &ChunkerConfig) -> Self {
        Self {
            name: doc.name.clone(),
            size: doc.size,
            parser: config.parser,
            extract_captions: config.extract_captions,
            thresholds: config.thresholds,
        }
    }
}

/// Thread-safe cache of processed documents.
#[derive(Debug, Default)]
pub struct ChunkCache {
    entries: Mutex<HashMap<DocumentKey, Arc<DocumentOutput>>>,
}

impl ChunkCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached output for `doc`, processing it on a miss.
    ///
    /// Processing happens outside the lock, so two threads missing on the
    /// same key may both process it; the first insert wins.
    pub fn get_or_process(&self, doc: &SourceDocument, config: &ChunkerConfig) -> Arc<DocumentOutput> {
        let key = DocumentKey::new(doc, config);
        if let Some(hit) = self.lock().get(&key) {
            debug!("Cache hit: {} ({})", key.name, key.parser);
            return Arc::clone(hit);
        }

        let output = Arc::new(convert::process_document(doc, config));
        Arc::clone(self.lock().entry(key).or_insert(output))
    }

    /// Read `path` and return its cached or freshly processed output.
    pub fn get_or_process_file(
        &self,
        path: impl AsRef<Path>,
        config: &ChunkerConfig,
    ) -> Result<Arc<DocumentOutput>, ChunkError> {
        let doc = input::resolve_input(path)?;
        Ok(self.get_or_process(&doc, config))
    }

    pub fn get(&self, key: &DocumentKey) -> Option<Arc<DocumentOutput>> {
        self.lock().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<DocumentKey, Arc<DocumentOutput>>> {
        // A panic while holding the lock cannot leave a half-written entry.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(parser: ParserKind) -> ChunkerConfig {
        ChunkerConfig::builder().parser(parser).build().unwrap()
    }

    #[test]
    fn repeat_request_returns_same_entry() {
        let cache = ChunkCache::new();
        let doc = SourceDocument::from_text("a.md", "## A\n\ntext");
        let first = cache.get_or_process(&doc, &config(ParserKind::Generic));
        let second = cache.get_or_process(&doc, &config(ParserKind::Generic));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn parser_and_size_are_part_of_the_key() {
        let cache = ChunkCache::new();
        let doc = SourceDocument::from_text("a.md", "## A\n\ntext");
        cache.get_or_process(&doc, &config(ParserKind::Generic));
        cache.get_or_process(&doc, &config(ParserKind::Acs));
        let edited = SourceDocument::from_text("a.md", "## A\n\nmore text");
        cache.get_or_process(&edited, &config(ParserKind::Generic));
        assert_eq!(cache.len(), 3);

        let key = DocumentKey::new(&doc, &config(ParserKind::Acs));
        assert_eq!(cache.get(&key).unwrap().parser, ParserKind::Acs);
    }

    #[test]
    fn caption_and_threshold_settings_are_part_of_the_key() {
        let cache = ChunkCache::new();
        let doc = SourceDocument::from_text("a.md", "## A\n\nalpha\n\nFigure 1. c\n\nbeta");
        let with_captions = cache.get_or_process(&doc, &config(ParserKind::Generic));

        let no_captions = ChunkerConfig::builder()
            .parser(ParserKind::Generic)
            .extract_captions(false)
            .build()
            .unwrap();
        let raw = cache.get_or_process(&doc, &no_captions);
        assert!(!Arc::ptr_eq(&with_captions, &raw));
        assert_eq!(raw.chunks[0].paragraphs.len(), 3);

        let stricter = ChunkerConfig::builder()
            .parser(ParserKind::Generic)
            .min_paragraph_chars(200)
            .build()
            .unwrap();
        cache.get_or_process(&doc, &stricter);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn file_errors_are_not_cached() {
        let cache = ChunkCache::new();
        assert!(cache
            .get_or_process_file("/no/such.md", &config(ParserKind::Acs))
            .is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn clear_empties_the_cache() {
        let cache = ChunkCache::new();
        cache.get_or_process(&SourceDocument::from_text("a.md", "x"), &config(ParserKind::Generic));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn shared_across_threads() {
        let cache = Arc::new(ChunkCache::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    let doc = SourceDocument::from_text("t.md", "## T\n\nbody");
                    cache.get_or_process(&doc, &config(ParserKind::Generic)).document.clone()
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), "t.md");
        }
        assert_eq!(cache.len(), 1);
    }
}
