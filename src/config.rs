//! Configuration types for chunking and paragraph selection.
//!
//! All pipeline behaviour is controlled through [`ChunkerConfig`], built via
//! its [`ChunkerConfigBuilder`]. One struct holds every knob so a config can
//! be cloned into worker threads and logged alongside a run's output.

use crate::error::ChunkError;
use crate::observer::Observer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Configuration for chunking a document and selecting annotation paragraphs.
///
/// Built via [`ChunkerConfig::builder()`] or using
/// [`ChunkerConfig::default()`].
///
/// # Example
/// ```rust
/// use qa_chunker::{ChunkerConfig, ParserKind};
///
/// let config = ChunkerConfig::builder()
///     .parser(ParserKind::Generic)
///     .min_paragraph_chars(120)
///     .build()
///     .unwrap();
/// assert_eq!(config.thresholds.min_paragraph_chars, 120);
/// ```
#[derive(Clone)]
pub struct ChunkerConfig {
    /// Whether the ACS structural extractor runs before chunking. Default: [`ParserKind::Acs`].
    pub parser: ParserKind,

    /// Move figure/table captions into a trailing "Figures and Tables" chunk
    /// and splice the paragraphs around them. Default: true.
    pub extract_captions: bool,

    /// Paragraph length and table thresholds used by the section filter.
    pub thresholds: FilterThresholds,

    /// Maximum number of documents processed at once by the batch API. Default: 4.
    ///
    /// Chunking is CPU-bound and each document runs on a blocking worker
    /// thread, so values far above the core count buy nothing.
    pub concurrency: usize,

    /// Optional observer receiving per-document parsing events.
    pub observer: Option<Observer>,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            parser: ParserKind::default(),
            extract_captions: true,
            thresholds: FilterThresholds::default(),
            concurrency: 4,
            observer: None,
        }
    }
}

impl fmt::Debug for ChunkerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkerConfig")
            .field("parser", &self.parser)
            .field("extract_captions", &self.extract_captions)
            .field("thresholds", &self.thresholds)
            .field("concurrency", &self.concurrency)
            .field("observer", &self.observer.as_ref().map(|_| "<dyn ParseObserver>"))
            .finish()
    }
}

impl ChunkerConfig {
    /// Create a new builder for `ChunkerConfig`.
    pub fn builder() -> ChunkerConfigBuilder {
        ChunkerConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ChunkerConfig`].
#[derive(Debug)]
pub struct ChunkerConfigBuilder {
    config: ChunkerConfig,
}

impl ChunkerConfigBuilder {
    pub fn parser(mut self, parser: ParserKind) -> Self {
        self.config.parser = parser;
        self
    }

    pub fn extract_captions(mut self, v: bool) -> Self {
        self.config.extract_captions = v;
        self
    }

    pub fn min_paragraph_chars(mut self, n: usize) -> Self {
        self.config.thresholds.min_paragraph_chars = n;
        self
    }

    pub fn fallback_min_paragraph_chars(mut self, n: usize) -> Self {
        self.config.thresholds.fallback_min_paragraph_chars = n;
        self
    }

    pub fn max_table_pipes(mut self, n: usize) -> Self {
        self.config.thresholds.max_table_pipes = n;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn observer(mut self, observer: Observer) -> Self {
        self.config.observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ChunkerConfig, ChunkError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(ChunkError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        if c.thresholds.max_table_pipes == 0 {
            return Err(ChunkError::InvalidConfig(
                "Table pipe threshold must be ≥ 1".into(),
            ));
        }
        if c.thresholds.fallback_min_paragraph_chars > c.thresholds.min_paragraph_chars {
            return Err(ChunkError::InvalidConfig(format!(
                "Fallback minimum ({}) must not exceed the primary minimum ({})",
                c.thresholds.fallback_min_paragraph_chars, c.thresholds.min_paragraph_chars
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which front end prepares the markdown before chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserKind {
    /// Run the ACS structural extractor, falling back to generic chunking if
    /// it rejects the document. (default)
    #[default]
    Acs,
    /// Chunk the raw text directly.
    Generic,
}

impl ParserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParserKind::Acs => "acs",
            ParserKind::Generic => "generic",
        }
    }
}

impl fmt::Display for ParserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParserKind {
    type Err = ChunkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "acs" => Ok(ParserKind::Acs),
            "generic" => Ok(ParserKind::Generic),
            other => Err(ChunkError::InvalidConfig(format!(
                "Unknown parser '{other}' (expected 'acs' or 'generic')"
            ))),
        }
    }
}

/// Thresholds applied to paragraphs by the section filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterThresholds {
    /// Minimum paragraph length, in characters, in the primary pass. Default: 100.
    pub min_paragraph_chars: usize,

    /// Minimum paragraph length in the relaxed fallback pass. Default: 50.
    pub fallback_min_paragraph_chars: usize,

    /// A paragraph with at least this many `|` characters is a table and is
    /// never offered for annotation. Default: 4.
    pub max_table_pipes: usize,
}

impl Default for FilterThresholds {
    fn default() -> Self {
        Self {
            min_paragraph_chars: 100,
            fallback_min_paragraph_chars: 50,
            max_table_pipes: 4,
        }
    }
}
