//! Chunk statistics for one document.
//!
//! Used by `regchunk stats` to check a chunking configuration against a
//! real regulation before running a full ingest: how many sections and
//! chunks it produces, how chunk sizes are distributed, and how many chunks
//! had to be split or exceed the size ceiling.

use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;

use regchunk_core::dialect::Dialect;
use regchunk_core::models::{Chunk, ChunkType};

use crate::config::Config;
use crate::ingest::Pipeline;

#[derive(Debug, Clone, PartialEq)]
pub struct ChunkStats {
    pub chunks: usize,
    pub full_sections: usize,
    pub partial_sections: usize,
    pub total_words: usize,
    pub avg_words: f64,
    pub min_words: usize,
    pub max_words: usize,
    pub avg_cost: f64,
    pub max_cost: usize,
    /// Chunks whose cost exceeds `max_size` (single oversized sentences).
    pub oversized: usize,
    pub with_seed: usize,
    /// Chunk counts per section type, keyed by type name.
    pub by_section_type: BTreeMap<String, usize>,
}

impl ChunkStats {
    pub fn compute(chunks: &[Chunk], max_size: usize) -> Self {
        let count = |t: ChunkType| chunks.iter().filter(|c| c.chunk_type == t).count();
        let total_words: usize = chunks.iter().map(|c| c.word_count).sum();
        let total_cost: usize = chunks.iter().map(|c| c.estimated_cost).sum();

        let mut by_section_type = BTreeMap::new();
        for chunk in chunks {
            *by_section_type
                .entry(chunk.source_section.section_type.as_str().to_string())
                .or_insert(0) += 1;
        }

        Self {
            chunks: chunks.len(),
            full_sections: count(ChunkType::FullSection),
            partial_sections: count(ChunkType::PartialSection),
            total_words,
            avg_words: mean(total_words, chunks.len()),
            min_words: chunks.iter().map(|c| c.word_count).min().unwrap_or(0),
            max_words: chunks.iter().map(|c| c.word_count).max().unwrap_or(0),
            avg_cost: mean(total_cost, chunks.len()),
            max_cost: chunks.iter().map(|c| c.estimated_cost).max().unwrap_or(0),
            oversized: chunks.iter().filter(|c| c.estimated_cost > max_size).count(),
            with_seed: chunks.iter().filter(|c| c.overlap_seed.is_some()).count(),
            by_section_type,
        }
    }
}

fn mean(total: usize, n: usize) -> f64 {
    if n == 0 {
        0.0
    } else {
        total as f64 / n as f64
    }
}

/// Run the stats command: chunk `path` and print a summary.
pub fn run_stats(config: &Config, path: &Path, dialect: Option<Dialect>) -> Result<()> {
    let pipeline = Pipeline::from_config(config)?;
    let doc = pipeline.chunk_path(path, dialect)?;
    let envelope = pipeline.chunker().config();
    let stats = ChunkStats::compute(&doc.chunks, envelope.max_size);

    println!("regchunk — Chunk Stats");
    println!("======================");
    println!();
    println!("  Document:    {}", path.display());
    println!(
        "  Dialect:     {} ({})",
        doc.dialect,
        doc.dialect.regulation().unwrap_or("unspecified regulation")
    );
    println!("  Sections:    {}", doc.section_count);
    println!(
        "  Envelope:    target {} / max {} / min {} / overlap {}",
        envelope.target_size, envelope.max_size, envelope.min_size, envelope.overlap_budget
    );
    println!();
    println!("  Chunks:      {}", stats.chunks);
    println!("    full:      {}", stats.full_sections);
    println!("    partial:   {}", stats.partial_sections);
    println!("    seeded:    {}", stats.with_seed);
    println!("    oversized: {}", stats.oversized);
    println!();
    println!("  Words:       {} total", stats.total_words);
    println!(
        "    per chunk: avg {:.1}, min {}, max {}",
        stats.avg_words, stats.min_words, stats.max_words
    );
    println!("  Cost:        avg {:.1}, max {}", stats.avg_cost, stats.max_cost);

    if !stats.by_section_type.is_empty() {
        println!();
        println!("  By section type:");
        println!("  {:<12} {:>8}", "TYPE", "CHUNKS");
        println!("  {}", "-".repeat(21));
        for (section_type, n) in &stats.by_section_type {
            println!("  {:<12} {:>8}", section_type, n);
        }
    }

    println!();
    Ok(())
}
