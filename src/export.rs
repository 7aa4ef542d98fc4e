//! Chunk export as text, JSON, or JSONL.
//!
//! The JSON and JSONL writers implement [`ChunkSink`], so they receive
//! exactly what an embedding or indexing collaborator would: each chunk in
//! order together with its flat metadata map.

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use regchunk_core::dialect::Dialect;
use regchunk_core::error::CollaboratorError;
use regchunk_core::models::Chunk;
use regchunk_core::store::{store_all, ChunkSink};

use crate::config::Config;
use crate::ingest::{collaborator, Pipeline};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable retrieval text, one block per chunk.
    Text,
    /// One pretty-printed JSON document with a header.
    Json,
    /// One JSON record per line.
    Jsonl,
}

/// One exported chunk.
#[derive(Debug, Serialize)]
pub struct ExportChunk {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub chunk_id: String,
    pub content: String,
    pub lead_context: String,
    pub trail_context: String,
    pub retrieval_text: String,
    pub metadata: serde_json::Value,
}

impl ExportChunk {
    fn new(source: Option<String>, chunk: &Chunk, metadata: &serde_json::Value) -> Self {
        Self {
            source,
            chunk_id: chunk.chunk_id.clone(),
            content: chunk.content.clone(),
            lead_context: chunk.lead_context.clone(),
            trail_context: chunk.trail_context.clone(),
            retrieval_text: chunk.retrieval_text(true),
            metadata: metadata.clone(),
        }
    }
}

/// Writes one JSON object per chunk, newline-delimited.
pub struct JsonlSink<W: Write> {
    writer: W,
    source: Option<String>,
}

impl<W: Write> JsonlSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            source: None,
        }
    }

    /// Tag subsequent records with the document they came from.
    pub fn set_source(&mut self, source: String) {
        self.source = Some(source);
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ChunkSink for JsonlSink<W> {
    fn store(&mut self, chunk: &Chunk, metadata: &serde_json::Value) -> Result<(), CollaboratorError> {
        let record = ExportChunk::new(self.source.clone(), chunk, metadata);
        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), CollaboratorError> {
        self.writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct ExportDocument {
    generated_at: String,
    source: Option<String>,
    dialect: Option<Dialect>,
    chunk_count: usize,
    chunks: Vec<ExportChunk>,
}

/// Buffers every chunk and writes a single JSON document on `finish`.
pub struct JsonSink<W: Write> {
    writer: W,
    source: Option<String>,
    dialect: Option<Dialect>,
    chunks: Vec<ExportChunk>,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W, source: Option<String>) -> Self {
        Self {
            writer,
            source,
            dialect: None,
            chunks: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ChunkSink for JsonSink<W> {
    fn store(&mut self, chunk: &Chunk, metadata: &serde_json::Value) -> Result<(), CollaboratorError> {
        self.dialect.get_or_insert(chunk.source_section.dialect);
        self.chunks.push(ExportChunk::new(None, chunk, metadata));
        Ok(())
    }

    fn finish(&mut self) -> Result<(), CollaboratorError> {
        let doc = ExportDocument {
            generated_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            source: self.source.clone(),
            dialect: self.dialect,
            chunk_count: self.chunks.len(),
            chunks: std::mem::take(&mut self.chunks),
        };
        serde_json::to_writer_pretty(&mut self.writer, &doc)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Render chunks as plain retrieval text.
pub fn render_text(chunks: &[Chunk]) -> String {
    let mut out = String::new();
    for chunk in chunks {
        out.push_str(&format!(
            "=== {} ({}, ~{} tokens, {} words)\n",
            chunk.chunk_id,
            chunk.chunk_type.as_str(),
            chunk.estimated_cost,
            chunk.word_count
        ));
        out.push_str(&chunk.retrieval_text(true));
        out.push_str("\n\n");
    }
    out
}

fn write_chunks<W: Write>(
    writer: W,
    chunks: &[Chunk],
    format: OutputFormat,
    source: &str,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            let mut writer = writer;
            writer.write_all(render_text(chunks).as_bytes())?;
            writer.flush()?;
        }
        OutputFormat::Json => {
            let mut sink = JsonSink::new(writer, Some(source.to_string()));
            store_all(&mut sink, chunks).map_err(collaborator)?;
        }
        OutputFormat::Jsonl => {
            let mut sink = JsonlSink::new(writer);
            sink.set_source(source.to_string());
            store_all(&mut sink, chunks).map_err(collaborator)?;
        }
    }
    Ok(())
}

/// Run `regchunk chunk`: parse and chunk one document.
///
/// If `output` is `Some`, writes to that file path. Otherwise writes to
/// stdout for piping.
pub fn run_chunk(
    config: &Config,
    path: &Path,
    dialect: Option<Dialect>,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let pipeline = Pipeline::from_config(config)?;
    let doc = pipeline.chunk_path(path, dialect)?;
    let source = path.to_string_lossy();

    match output {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::File::create(out)
                .with_context(|| format!("Failed to create {}", out.display()))?;
            write_chunks(std::io::BufWriter::new(file), &doc.chunks, format, &source)?;
            eprintln!(
                "Wrote {} chunks from {} sections ({}) to {}",
                doc.chunks.len(),
                doc.section_count,
                doc.dialect,
                out.display()
            );
        }
        None => {
            write_chunks(std::io::stdout().lock(), &doc.chunks, format, &source)?;
        }
    }

    Ok(())
}
