//! Batch API: process many documents concurrently.
//!
//! Chunking one document is CPU-bound and quick, but a corpus holds
//! hundreds of them. [`process_stream`] runs each document on tokio's
//! blocking pool, at most `config.concurrency` at a time, and yields
//! results as they complete. [`process_files`] collects the same work in
//! input order, and [`process_files_sync`] wraps it for callers without a
//! runtime.
//!
//! A failing document never aborts the batch: its error is yielded in its
//! slot and the remaining documents are still processed.

use crate::config::ChunkerConfig;
use crate::convert;
use crate::error::ChunkError;
use crate::output::DocumentOutput;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::{info, warn};

/// A boxed stream of per-document results.
pub type DocumentStream = Pin<Box<dyn Stream<Item = Result<DocumentOutput, ChunkError>> + Send>>;

/// Process `paths`, yielding each document as soon as it is done.
///
/// Results arrive in completion order; use [`DocumentOutput::document`] to
/// match them up, or [`process_files`] when input order matters.
///
/// # Example
/// ```rust,no_run
/// use qa_chunker::{process_stream, ChunkerConfig};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() {
/// let config = ChunkerConfig::default();
/// let mut results = process_stream(vec!["a.md", "b.md"], &config);
/// while let Some(result) = results.next().await {
///     match result {
///         Ok(doc) => println!("{}: {} paragraphs", doc.document, doc.paragraphs.len()),
///         Err(e) => eprintln!("Error: {e}"),
///     }
/// }
/// # }
/// ```
pub fn process_stream<I, P>(paths: I, config: &ChunkerConfig) -> DocumentStream
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let jobs = jobs(collect_paths(paths), config);
    Box::pin(stream::iter(jobs).buffer_unordered(config.concurrency))
}

/// Process `paths` concurrently and return results in input order.
pub async fn process_files<I, P>(
    paths: I,
    config: &ChunkerConfig,
) -> Vec<Result<DocumentOutput, ChunkError>>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let jobs = jobs(collect_paths(paths), config);
    let total = jobs.len();
    info!(
        "Processing {} documents (concurrency {})",
        total, config.concurrency
    );

    let results: Vec<_> = stream::iter(jobs)
        .buffered(config.concurrency)
        .collect()
        .await;

    let failed = results.iter().filter(|r| r.is_err()).count();
    info!("Batch complete: {} ok, {} failed", total - failed, failed);
    results
}

/// Blocking wrapper around [`process_files`].
///
/// Creates a private tokio runtime; do not call from inside one.
pub fn process_files_sync<I, P>(
    paths: I,
    config: &ChunkerConfig,
) -> Result<Vec<Result<DocumentOutput, ChunkError>>, ChunkError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    Ok(tokio::runtime::Runtime::new()
        .map_err(|e| ChunkError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(process_files(paths, config)))
}

fn collect_paths<I, P>(paths: I) -> Vec<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    paths.into_iter().map(|p| p.as_ref().to_path_buf()).collect()
}

fn jobs(
    paths: Vec<PathBuf>,
    config: &ChunkerConfig,
) -> Vec<impl std::future::Future<Output = Result<DocumentOutput, ChunkError>> + Send + 'static> {
    paths
        .into_iter()
        .map(|path| {
            let cfg = config.clone();
            async move {
                let label = path.display().to_string();
                let result = tokio::task::spawn_blocking(move || convert::process_file(&path, &cfg))
                    .await
                    .unwrap_or_else(|e| {
                        Err(ChunkError::Internal(format!("worker for {label} failed: {e}")))
                    });
                if let Err(ref e) = result {
                    warn!("Skipping {}: {}", label, e);
                }
                result
            }
        })
        .collect()
}
