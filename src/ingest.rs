//! Ingestion pipeline orchestration.
//!
//! Coordinates the per-document flow: read → extract → parse → chunk, and
//! the directory flow that runs documents concurrently on tokio's blocking
//! pool and writes the combined chunk list as JSONL.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use regchunk_core::chunk::BoundaryAwareChunker;
use regchunk_core::dialect::Dialect;
use regchunk_core::error::CollaboratorError;
use regchunk_core::models::{Chunk, Section};
use regchunk_core::parser::StructuralParser;
use regchunk_core::sentence::PunctuationSplitter;
use regchunk_core::store::ChunkSink;

use crate::config::{Config, IngestConfig};
use crate::export::JsonlSink;
use crate::extract;
use crate::tokenizer::build_estimator;

/// Chunks produced from one source document.
#[derive(Debug)]
pub struct DocumentChunks {
    pub path: PathBuf,
    pub dialect: Dialect,
    pub section_count: usize,
    pub chunks: Vec<Chunk>,
}

/// Parser and chunker built from one [`Config`].
pub struct Pipeline {
    parser: StructuralParser,
    chunker: BoundaryAwareChunker,
}

impl Pipeline {
    pub fn from_config(config: &Config) -> Result<Self> {
        let parser = StructuralParser::new(config.parser.dialect()?);
        let chunker = BoundaryAwareChunker::new(
            config.chunking.chunker_config(),
            Box::new(PunctuationSplitter),
            build_estimator(&config.chunking)?,
        )?;
        Ok(Self { parser, chunker })
    }

    pub fn parser(&self) -> &StructuralParser {
        &self.parser
    }

    pub fn chunker(&self) -> &BoundaryAwareChunker {
        &self.chunker
    }

    /// Raw text of `path`, extracting PDF/DOCX content when needed.
    pub fn read_text(&self, path: &Path) -> Result<String> {
        let bytes = read_bytes(path)?;
        let content_type = content_type(path)?;
        if extract::is_plain_text(content_type) {
            return String::from_utf8(bytes)
                .with_context(|| format!("{} is not valid UTF-8", path.display()));
        }
        extract::extract_text(&bytes, content_type)
            .with_context(|| format!("Failed to extract text from {}", path.display()))
    }

    pub fn sections_for_path(&self, path: &Path, dialect: Option<Dialect>) -> Result<Vec<Section>> {
        let bytes = read_bytes(path)?;
        let content_type = content_type(path)?;

        let sections = if extract::is_plain_text(content_type) {
            self.parser.parse_bytes(&bytes, dialect)
        } else {
            let text = extract::extract_text(&bytes, content_type)
                .with_context(|| format!("Failed to extract text from {}", path.display()))?;
            self.parser.parse(&text, dialect)
        };

        sections.with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn chunk_path(&self, path: &Path, dialect: Option<Dialect>) -> Result<DocumentChunks> {
        let sections = self.sections_for_path(path, dialect)?;
        let chunks = self
            .chunker
            .chunk_sections(&sections)
            .map_err(collaborator)
            .with_context(|| format!("Failed to chunk {}", path.display()))?;

        Ok(DocumentChunks {
            path: path.to_path_buf(),
            dialect: sections
                .first()
                .map(|s| s.dialect)
                .unwrap_or(self.parser.default_dialect()),
            section_count: sections.len(),
            chunks,
        })
    }
}

/// Lift a collaborator failure into the app's error type.
pub fn collaborator(err: CollaboratorError) -> anyhow::Error {
    anyhow::anyhow!(err)
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn content_type(path: &Path) -> Result<&'static str> {
    match extract::content_type_for_path(path) {
        Some(ct) => Ok(ct),
        None => bail!(
            "Unsupported file type: {} (expected .txt, .md, .pdf or .docx)",
            path.display()
        ),
    }
}

/// Files under `root` matching the ingest globs, sorted by relative path.
pub fn scan_directory(root: &Path, config: &IngestConfig) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        bail!("Ingest root is not a directory: {}", root.display());
    }

    let include_set = build_globset(&config.include_globs)?;

    let mut default_excludes = vec!["**/.git/**".to_string(), "**/target/**".to_string()];
    default_excludes.extend(config.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut paths = Vec::new();
    for entry in WalkDir::new(root).follow_links(config.follow_symlinks) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }
        if extract::content_type_for_path(path).is_none() {
            tracing::debug!(path = %rel_str, "skipping file with unsupported extension");
            continue;
        }
        paths.push(path.to_path_buf());
    }

    paths.sort();
    Ok(paths)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Outcome of a directory ingest, in path order.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub documents: Vec<DocumentChunks>,
    pub failures: Vec<(PathBuf, String)>,
}

impl IngestReport {
    pub fn chunk_count(&self) -> usize {
        self.documents.iter().map(|d| d.chunks.len()).sum()
    }
}

/// Chunk every matching document under `root`.
///
/// Each document runs in its own `spawn_blocking` task with its own
/// pipeline. A document that fails is reported and skipped; the others
/// still complete.
pub async fn ingest_directory(config: &Config, root: &Path) -> Result<IngestReport> {
    let paths = scan_directory(root, &config.ingest)?;
    tracing::info!(root = %root.display(), documents = paths.len(), "ingesting directory");

    // Fail fast on a bad config before spawning anything.
    Pipeline::from_config(config)?;

    let config = Arc::new(config.clone());
    let handles: Vec<_> = paths
        .into_iter()
        .map(|path| {
            let config = Arc::clone(&config);
            let task_path = path.clone();
            let handle = tokio::task::spawn_blocking(move || {
                Pipeline::from_config(&config)?.chunk_path(&task_path, None)
            });
            (path, handle)
        })
        .collect();

    let mut report = IngestReport::default();
    for (path, handle) in handles {
        match handle.await? {
            Ok(doc) => {
                tracing::debug!(
                    path = %path.display(),
                    dialect = %doc.dialect,
                    chunks = doc.chunks.len(),
                    "document chunked"
                );
                report.documents.push(doc);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %format!("{:#}", e), "skipping document");
                report.failures.push((path, format!("{:#}", e)));
            }
        }
    }

    Ok(report)
}

/// Run `regchunk ingest`: chunk a directory and write JSONL.
///
/// If `output` is `Some`, writes to that file path. Otherwise writes to
/// stdout for piping.
pub async fn run_ingest(config: &Config, root: &Path, output: Option<&Path>) -> Result<()> {
    let report = ingest_directory(config, root).await?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_report(&report, root, JsonlSink::new(std::io::BufWriter::new(file)))?;
        }
        None => {
            write_report(&report, root, JsonlSink::new(std::io::stdout().lock()))?;
        }
    }

    eprintln!("ingest {}", root.display());
    eprintln!("  documents: {}", report.documents.len());
    eprintln!("  chunks written: {}", report.chunk_count());
    if !report.failures.is_empty() {
        eprintln!("  failed: {}", report.failures.len());
        for (path, err) in &report.failures {
            eprintln!("    {}: {}", path.display(), err);
        }
    }
    if let Some(path) = output {
        eprintln!("  output: {}", path.display());
    }

    Ok(())
}

fn write_report<W: std::io::Write>(report: &IngestReport, root: &Path, mut sink: JsonlSink<W>) -> Result<()> {
    for doc in &report.documents {
        let relative = doc.path.strip_prefix(root).unwrap_or(&doc.path);
        sink.set_source(relative.to_string_lossy().to_string());
        for chunk in &doc.chunks {
            sink.store(chunk, &chunk.metadata()).map_err(collaborator)?;
        }
    }
    sink.finish().map_err(collaborator)?;
    Ok(())
}
