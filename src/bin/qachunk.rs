//! CLI binary for qa-chunker.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ChunkerConfig` and prints results as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use qa_chunker::{
    prepare_markdown, process_files, resolve_input, write_output, ChunkerConfig, DocumentOutput,
    NoopObserver, Observer, ParseObserver, ParserKind,
};
use serde_json::{Map, Value};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress observer using indicatif ────────────────────────────────────

/// Terminal progress for batches: one bar over all inputs plus a log line per
/// finished document. Documents finish out of order, so lines are printed as
/// they complete.
struct CliProgress {
    bar: ProgressBar,
    fallbacks: AtomicUsize,
}

impl CliProgress {
    fn new(total: usize) -> Arc<Self> {
        let bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} documents  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Chunking");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            fallbacks: AtomicUsize::new(0),
        })
    }

    /// Advance the bar for an input that failed before it was processed.
    fn failed(&self, input: &str, error: &str) {
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar
            .println(format!("  {} {:<40}  {}", red("✗"), input, red(&msg)));
        self.bar.inc(1);
    }
}

impl ParseObserver for CliProgress {
    fn on_extractor_fallback(&self, name: &str, _error: &str) {
        self.fallbacks.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} {:<40}  {}",
            cyan("⚠"),
            name,
            dim("not ACS-formatted, chunked generically")
        ));
    }

    fn on_document_complete(&self, name: &str, chunks: usize, paragraphs: usize) {
        self.bar.println(format!(
            "  {} {:<40}  {}  {}",
            green("✓"),
            name,
            dim(&format!("{chunks:>3} chunks")),
            dim(&format!("{paragraphs:>4} paragraphs")),
        ));
        self.bar.inc(1);
    }
}

const DEFAULT_FALLBACK_MIN_CHARS: usize = 50;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Annotation paragraphs of one paper (JSON on stdout)
  qachunk paper.md

  # All sections and paragraphs, captions included
  qachunk --emit chunks paper.md

  # The ACS extractor's clean markdown
  qachunk --emit clean-markdown paper.md -o paper.clean.md

  # Any markdown, no ACS heuristics, keep captions in place
  qachunk --parser generic --no-captions notes.md

  # A whole corpus, 8 documents at a time
  qachunk --concurrency 8 corpus/*.md -o paragraphs.json

OUTPUT:
  paragraphs      [{"section": ..., "paragraph": ...}, ...]
  chunks          [{"section": ..., "paragraphs": [...]}, ...]
  clean-markdown  markdown text

  With several inputs, JSON output is an array of
  {"document": <file name>, "<emit>": <value>} in input order.

ENVIRONMENT VARIABLES:
  QACHUNK_PARSER               acs | generic
  QACHUNK_EMIT                 paragraphs | chunks | clean-markdown
  QACHUNK_NO_CAPTIONS          Keep captions in their sections
  QACHUNK_MIN_CHARS            Primary paragraph length threshold
  QACHUNK_FALLBACK_MIN_CHARS   Relaxed-pass length threshold
  QACHUNK_CONCURRENCY          Documents processed at once
  QACHUNK_OUTPUT               Output file
  RUST_LOG                     Overrides the log filter (e.g. qa_chunker=debug)

PDFs are not accepted: convert them to markdown first (e.g. with pdf2md).
"#;

/// Split scientific-article markdown into annotation-ready paragraphs.
#[derive(Parser, Debug)]
#[command(
    name = "qachunk",
    version,
    about = "Split scientific-article markdown into annotation-ready paragraphs",
    long_about = "Split markdown papers (typically converted from ACS journal PDFs) into \
labelled sections and paragraphs, move figure and table captions aside, and select the \
paragraphs suitable for question-answer annotation.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Markdown files to process.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Write output to this file instead of stdout.
    #[arg(short, long, env = "QACHUNK_OUTPUT")]
    output: Option<PathBuf>,

    /// Structure extractor: acs or generic.
    #[arg(long, env = "QACHUNK_PARSER", default_value = "acs",
          value_parser = parse_parser)]
    parser: ParserKind,

    /// What to emit.
    #[arg(long, env = "QACHUNK_EMIT", value_enum, default_value = "paragraphs")]
    emit: Emit,

    /// Leave figure/table captions in their sections.
    #[arg(long, env = "QACHUNK_NO_CAPTIONS")]
    no_captions: bool,

    /// Minimum paragraph length (characters) for annotation.
    #[arg(long, env = "QACHUNK_MIN_CHARS", default_value_t = 100)]
    min_chars: usize,

    /// Minimum length for the relaxed pass when nothing passes the first one.
    /// Defaults to 50, or to --min-chars when that is lower.
    #[arg(long, env = "QACHUNK_FALLBACK_MIN_CHARS")]
    fallback_min_chars: Option<usize>,

    /// Number of documents processed concurrently.
    #[arg(short, long, env = "QACHUNK_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Disable the progress bar.
    #[arg(long, env = "QACHUNK_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "QACHUNK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "QACHUNK_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Emit {
    Paragraphs,
    Chunks,
    CleanMarkdown,
}

impl Emit {
    fn key(self) -> &'static str {
        match self {
            Emit::Paragraphs => "paragraphs",
            Emit::Chunks => "chunks",
            Emit::CleanMarkdown => "clean_markdown",
        }
    }
}

fn parse_parser(s: &str) -> Result<ParserKind, String> {
    s.parse::<ParserKind>().map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces per-document INFO logs for batches.
    let show_progress = !cli.quiet && !cli.no_progress && cli.inputs.len() > 1;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let start = Instant::now();

    let rendered = if cli.emit == Emit::CleanMarkdown {
        emit_clean_markdown(&cli)?
    } else {
        let progress = show_progress.then(|| CliProgress::new(cli.inputs.len()));
        let config = build_config(&cli, progress.clone().map(|p| p as Observer))?;
        let (rendered, failed) = emit_json(&cli, &config, progress.as_deref()).await?;
        if let Some(ref p) = progress {
            p.bar.finish_and_clear();
        }
        if !cli.quiet {
            print_summary(&cli, failed, progress.as_deref(), start);
        }
        if failed == cli.inputs.len() {
            anyhow::bail!("No input could be processed");
        }
        rendered
    };

    // ── Write output ─────────────────────────────────────────────────────
    if let Some(ref output_path) = cli.output {
        write_output(output_path, &rendered)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        if !cli.quiet {
            eprintln!("   →  {}", bold(&output_path.display().to_string()));
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(rendered.as_bytes())
            .context("Failed to write to stdout")?;
        if !rendered.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    Ok(())
}

impl Cli {
    fn fallback_min_chars(&self) -> usize {
        self.fallback_min_chars
            .unwrap_or(DEFAULT_FALLBACK_MIN_CHARS.min(self.min_chars))
    }
}

/// Map CLI args to `ChunkerConfig`.
fn build_config(cli: &Cli, observer: Option<Observer>) -> Result<ChunkerConfig> {
    let mut builder = ChunkerConfig::builder()
        .parser(cli.parser)
        .extract_captions(!cli.no_captions)
        .min_paragraph_chars(cli.min_chars)
        .fallback_min_paragraph_chars(cli.fallback_min_chars())
        .concurrency(cli.concurrency);

    if let Some(obs) = observer {
        builder = builder.observer(obs);
    }

    builder.build().context("Invalid configuration")
}

/// Process every input and render `paragraphs` or `chunks` JSON.
///
/// Returns the JSON text and the number of inputs that failed.
async fn emit_json(
    cli: &Cli,
    config: &ChunkerConfig,
    progress: Option<&CliProgress>,
) -> Result<(String, usize)> {
    let results = process_files(&cli.inputs, config).await;

    let mut values = Vec::with_capacity(results.len());
    let mut failed = 0;
    for (path, result) in cli.inputs.iter().zip(results) {
        match result {
            Ok(output) => values.push(document_value(&output, cli.emit)?),
            Err(e) => {
                failed += 1;
                match progress {
                    Some(p) => p.failed(&path.display().to_string(), &e.to_string()),
                    None => eprintln!("{} {}: {}", red("✗"), path.display(), e),
                }
            }
        }
    }

    let value = if cli.inputs.len() == 1 {
        values
            .pop()
            .and_then(|mut v| v.get_mut(cli.emit.key()).map(Value::take))
            .unwrap_or(Value::Array(Vec::new()))
    } else {
        Value::Array(values)
    };

    let json = serde_json::to_string_pretty(&value).context("Failed to serialise output")?;
    Ok((json, failed))
}

fn document_value(output: &DocumentOutput, emit: Emit) -> Result<Value> {
    let body = match emit {
        Emit::Chunks => serde_json::to_value(&output.chunks),
        _ => serde_json::to_value(&output.paragraphs),
    }
    .context("Failed to serialise output")?;
    let mut map = Map::new();
    map.insert("document".into(), Value::String(output.document.clone()));
    map.insert(emit.key().into(), body);
    Ok(Value::Object(map))
}

/// Run only the structure extractor and return its markdown.
///
/// With several inputs the documents are concatenated, each preceded by an
/// HTML comment naming it.
fn emit_clean_markdown(cli: &Cli) -> Result<String> {
    let noop = NoopObserver;
    let mut parts = Vec::with_capacity(cli.inputs.len());
    for path in &cli.inputs {
        let doc = resolve_input(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let prepared = prepare_markdown(&doc, cli.parser, &noop);
        if prepared.extractor_fallback && !cli.quiet {
            eprintln!(
                "{} {}: not ACS-formatted, emitting the text unchanged",
                cyan("⚠"),
                doc.name
            );
        }
        if cli.inputs.len() > 1 {
            parts.push(format!("<!-- document: {} -->\n\n{}", doc.name, prepared.markdown));
        } else {
            parts.push(prepared.markdown);
        }
    }
    Ok(parts.join("\n\n"))
}

fn print_summary(cli: &Cli, failed: usize, progress: Option<&CliProgress>, start: Instant) {
    let total = cli.inputs.len();
    let ok = total - failed;
    let fallbacks = progress
        .map(|p| p.fallbacks.load(Ordering::SeqCst))
        .unwrap_or(0);
    let mark = if failed == 0 {
        green("✔")
    } else if ok == 0 {
        red("✘")
    } else {
        cyan("⚠")
    };
    let mut line = format!(
        "{}  {}/{} documents  {}ms",
        mark,
        bold(&ok.to_string()),
        total,
        start.elapsed().as_millis()
    );
    if fallbacks > 0 {
        line.push_str(&format!("  {}", dim(&format!("({fallbacks} chunked generically)"))));
    }
    eprintln!("{line}");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(args: &[&str]) -> Result<ChunkerConfig> {
        let cli = Cli::try_parse_from(std::iter::once("qachunk").chain(args.iter().copied()))?;
        build_config(&cli, None)
    }

    #[test]
    fn low_min_chars_lowers_default_fallback() {
        let config = config_for(&["--min-chars", "40", "paper.md"]).unwrap();
        assert_eq!(config.thresholds.min_paragraph_chars, 40);
        assert_eq!(config.thresholds.fallback_min_paragraph_chars, 40);
    }

    #[test]
    fn default_fallback_is_fifty() {
        let config = config_for(&["paper.md"]).unwrap();
        assert_eq!(config.thresholds.fallback_min_paragraph_chars, 50);
    }

    #[test]
    fn explicit_fallback_above_minimum_is_rejected() {
        assert!(config_for(&["--min-chars", "40", "--fallback-min-chars", "60", "paper.md"]).is_err());
    }
}
