//! Boundary-aware section chunker.
//!
//! Splits each [`Section`] into [`Chunk`]s that respect a target/maximum
//! cost envelope, preferring sentence boundaries, and then borrows short
//! lead/trail context across neighboring chunks.
//!
//! # Algorithm
//!
//! 1. If the section's total cost is within `target_size`, emit one
//!    `full_section` chunk.
//! 2. Otherwise split the content into sentences and accumulate them
//!    greedily (state `ACCUMULATING`).
//! 3. Before adding a sentence, close the buffer (`FLUSHING`) when the
//!    joined cost would exceed `target_size` and the buffer already holds
//!    at least `min_size`, or when it would exceed `max_size` at all.
//! 4. After a close, when `overlap_budget > 0` and the closed buffer held
//!    more than one sentence, its last sentence seeds the new buffer
//!    (provided the seed fits the overlap budget and the seeded buffer
//!    still fits `max_size`). The seed counts toward the running cost.
//! 5. A sentence that alone exceeds `max_size` is emitted unsplit as its
//!    own chunk.
//! 6. The remaining buffer is always flushed at the end (`DONE`), even
//!    below `min_size`. Empty content yields zero chunks.
//!
//! With `respect_sentence_boundaries = false`, oversized sections fall back
//! to fixed character windows with a configured overlap, snapped to
//! whitespace and UTF-8 boundaries and shortened until they fit `max_size`.
//!
//! # Example
//!
//! ```rust
//! use regchunk_core::chunk::BoundaryAwareChunker;
//! use regchunk_core::parser::StructuralParser;
//!
//! let sections = StructuralParser::default()
//!     .parse("- (1) Whereas data protection is a fundamental right.", None)
//!     .unwrap();
//! let chunks = BoundaryAwareChunker::with_defaults().chunk_section(&sections[0]).unwrap();
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].chunk_id, "recital:1#0");
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cost::{CostEstimator, WordCostEstimator, CHARS_PER_TOKEN};
use crate::error::{CollaboratorError, ConfigError};
use crate::models::{Chunk, ChunkType, Section};
use crate::sentence::{PunctuationSplitter, SentenceSplitter};

/// Chunk size envelope, in cost-function units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Preferred chunk size; splitting starts once a section exceeds it.
    pub target_size: usize,
    /// Hard ceiling, exceeded only by a single oversized sentence.
    pub max_size: usize,
    /// Below this, keep accumulating rather than close a chunk.
    pub min_size: usize,
    /// Maximum cost of borrowed lead/trail context. `0` disables overlap.
    pub overlap_budget: usize,
    /// `false` falls back to fixed character windows.
    pub respect_sentence_boundaries: bool,
    /// Characters per cost unit, used to size character windows.
    pub chars_per_unit: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            target_size: 800,
            max_size: 1200,
            min_size: 200,
            overlap_budget: 100,
            respect_sentence_boundaries: true,
            chars_per_unit: CHARS_PER_TOKEN,
        }
    }
}

impl ChunkerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_size == 0 {
            return Err(ConfigError::Invalid("target_size must be > 0".to_string()));
        }
        if self.max_size < self.target_size {
            return Err(ConfigError::Invalid(format!(
                "max_size ({}) must be >= target_size ({})",
                self.max_size, self.target_size
            )));
        }
        if self.min_size > self.target_size {
            return Err(ConfigError::Invalid(format!(
                "min_size ({}) must be <= target_size ({})",
                self.min_size, self.target_size
            )));
        }
        if self.chars_per_unit == 0 {
            return Err(ConfigError::Invalid("chars_per_unit must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Turns sections into size-bounded chunks.
///
/// The sentence splitter and cost estimator are injected. Their errors are
/// returned unchanged from every chunking method.
pub struct BoundaryAwareChunker {
    config: ChunkerConfig,
    pub(crate) splitter: Box<dyn SentenceSplitter>,
    pub(crate) estimator: Box<dyn CostEstimator>,
}

impl std::fmt::Debug for BoundaryAwareChunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundaryAwareChunker")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Sentences collected for the chunk being built.
#[derive(Debug, Default)]
struct Buffer {
    sentences: Vec<String>,
    cost: usize,
    seed: Option<String>,
}

impl Buffer {
    fn single(sentence: &str, cost: usize) -> Self {
        Buffer {
            sentences: vec![sentence.to_string()],
            cost,
            seed: None,
        }
    }

    fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    fn joined_with(&self, sentence: &str) -> String {
        let mut joined = self.sentences.join(" ");
        if !joined.is_empty() {
            joined.push(' ');
        }
        joined.push_str(sentence);
        joined
    }
}

impl BoundaryAwareChunker {
    pub fn new(
        config: ChunkerConfig,
        splitter: Box<dyn SentenceSplitter>,
        estimator: Box<dyn CostEstimator>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            splitter,
            estimator,
        })
    }

    /// Default envelope with [`PunctuationSplitter`] and [`WordCostEstimator`].
    pub fn with_defaults() -> Self {
        Self {
            config: ChunkerConfig::default(),
            splitter: Box::new(PunctuationSplitter),
            estimator: Box::new(WordCostEstimator::default()),
        }
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    pub fn estimate(&self, text: &str) -> Result<usize, CollaboratorError> {
        self.estimator.estimate(text)
    }

    /// Chunk one section. Ids are derived from [`Section::key`].
    pub fn chunk_section(&self, section: &Section) -> Result<Vec<Chunk>, CollaboratorError> {
        let key = section.key();
        self.chunk_keyed(Arc::new(section.clone()), &key)
    }

    /// Chunk every section in order, then attach cross-chunk context.
    ///
    /// Repeated section keys get an `@{n}` suffix so chunk ids stay unique
    /// across the run.
    pub fn chunk_sections(&self, sections: &[Section]) -> Result<Vec<Chunk>, CollaboratorError> {
        tracing::info!(sections = sections.len(), "chunking document sections");

        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut chunks = Vec::new();

        for section in sections {
            let base = section.key();
            let occurrence = seen.entry(base.clone()).or_insert(0);
            *occurrence += 1;
            let key = if *occurrence == 1 {
                base
            } else {
                format!("{}@{}", base, occurrence)
            };

            let section_chunks = self.chunk_keyed(Arc::new(section.clone()), &key)?;
            tracing::debug!(
                section = %key,
                chunks = section_chunks.len(),
                "section chunked"
            );
            chunks.extend(section_chunks);
        }

        if self.config.overlap_budget > 0 {
            chunks = self.attach_cross_chunk_context(chunks)?;
        }

        log_chunk_stats(&chunks);
        Ok(chunks)
    }

    fn chunk_keyed(&self, section: Arc<Section>, key: &str) -> Result<Vec<Chunk>, CollaboratorError> {
        let content = section.content.trim();
        if content.is_empty() {
            return Ok(Vec::new());
        }

        let total_cost = self.estimator.estimate(content)?;
        if total_cost <= self.config.target_size {
            let sentence_count = self.splitter.split(content)?.len();
            return Ok(vec![Chunk::new(
                chunk_id(key, 0),
                &section,
                ChunkType::FullSection,
                0,
                content.to_string(),
                sentence_count,
                total_cost,
                None,
            )]);
        }

        let mut chunks = if self.config.respect_sentence_boundaries {
            self.split_by_sentences(&section, key, content)?
        } else {
            self.split_by_windows(&section, key, content)?
        };

        if chunks.len() == 1 && chunks[0].overlap_seed.is_none() {
            chunks[0].chunk_type = ChunkType::FullSection;
        }
        Ok(chunks)
    }

    fn split_by_sentences(
        &self,
        section: &Arc<Section>,
        key: &str,
        content: &str,
    ) -> Result<Vec<Chunk>, CollaboratorError> {
        let sentences = self.splitter.split(content)?;
        let mut chunks: Vec<Chunk> = Vec::new();
        let mut buffer = Buffer::default();

        for sentence in sentences.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
            let sentence_cost = self.estimator.estimate(sentence)?;

            if sentence_cost > self.config.max_size {
                if !buffer.is_empty() {
                    chunks.push(self.close(section, key, chunks.len(), std::mem::take(&mut buffer)));
                }
                chunks.push(self.close(
                    section,
                    key,
                    chunks.len(),
                    Buffer::single(sentence, sentence_cost),
                ));
                continue;
            }

            if buffer.is_empty() {
                buffer = Buffer::single(sentence, sentence_cost);
                continue;
            }

            let candidate_cost = self.estimator.estimate(&buffer.joined_with(sentence))?;
            let over_target =
                candidate_cost > self.config.target_size && buffer.cost >= self.config.min_size;
            let over_max = candidate_cost > self.config.max_size;

            if over_target || over_max {
                let closed = std::mem::take(&mut buffer);
                buffer = self.seeded_buffer(&closed, sentence, sentence_cost)?;
                chunks.push(self.close(section, key, chunks.len(), closed));
            } else {
                buffer.sentences.push(sentence.to_string());
                buffer.cost = candidate_cost;
            }
        }

        if !buffer.is_empty() {
            chunks.push(self.close(section, key, chunks.len(), buffer));
        }

        Ok(chunks)
    }

    /// Start a new buffer with `sentence`, carrying the closed buffer's
    /// last sentence as overlap when the envelope allows it.
    fn seeded_buffer(
        &self,
        closed: &Buffer,
        sentence: &str,
        sentence_cost: usize,
    ) -> Result<Buffer, CollaboratorError> {
        if self.config.overlap_budget > 0 && closed.sentences.len() > 1 {
            if let Some(seed) = closed.sentences.last() {
                let seed_cost = self.estimator.estimate(seed)?;
                if seed_cost <= self.config.overlap_budget {
                    let joined = format!("{} {}", seed, sentence);
                    let cost = self.estimator.estimate(&joined)?;
                    if cost <= self.config.max_size {
                        return Ok(Buffer {
                            sentences: vec![seed.clone(), sentence.to_string()],
                            cost,
                            seed: Some(seed.clone()),
                        });
                    }
                }
            }
        }
        Ok(Buffer::single(sentence, sentence_cost))
    }

    fn close(&self, section: &Arc<Section>, key: &str, index: usize, buffer: Buffer) -> Chunk {
        let sentence_count = buffer.sentences.len();
        Chunk::new(
            chunk_id(key, index),
            section,
            ChunkType::PartialSection,
            index,
            buffer.sentences.join(" "),
            sentence_count,
            buffer.cost,
            buffer.seed,
        )
    }

    /// Fixed-window fallback. Windows are `target_size × chars_per_unit`
    /// bytes, overlapping by `overlap_budget × chars_per_unit` bytes, and
    /// are pulled back to an earlier word break when their cost exceeds
    /// `max_size`.
    fn split_by_windows(
        &self,
        section: &Arc<Section>,
        key: &str,
        text: &str,
    ) -> Result<Vec<Chunk>, CollaboratorError> {
        let window = self.config.target_size * self.config.chars_per_unit;
        let overlap = (self.config.overlap_budget * self.config.chars_per_unit).min(window / 2);

        let mut chunks = Vec::new();
        let mut start = 0usize;
        let mut prev_end: Option<usize> = None;

        while start < text.len() {
            let remaining = &text[start..];
            if remaining.trim().is_empty() {
                break;
            }

            let end = self.fit_window(text, start, start + window_end(remaining, window))?;
            let piece = text[start..end].trim();

            let seed = prev_end
                .filter(|&pe| pe > start)
                .map(|pe| text[start..pe.min(end)].trim())
                .filter(|s| !s.is_empty() && piece.len() > s.len())
                .map(str::to_string);

            if !piece.is_empty() {
                let cost = self.estimator.estimate(piece)?;
                let sentence_count = self.splitter.split(piece)?.len();
                let index = chunks.len();
                chunks.push(Chunk::new(
                    chunk_id(key, index),
                    section,
                    ChunkType::PartialSection,
                    index,
                    piece.to_string(),
                    sentence_count,
                    cost,
                    seed,
                ));
            }

            if end >= text.len() {
                break;
            }
            prev_end = Some(end);
            start = next_window_start(text, start, end, overlap);
        }

        Ok(chunks)
    }

    /// Largest word break in `start..end` whose window still fits
    /// `max_size`. A single word over `max_size` is kept alone.
    fn fit_window(&self, text: &str, start: usize, end: usize) -> Result<usize, CollaboratorError> {
        if self.estimator.estimate(text[start..end].trim())? <= self.config.max_size {
            return Ok(end);
        }

        let breaks: Vec<usize> = text[start..end]
            .match_indices([' ', '\n'])
            .map(|(pos, _)| start + pos + 1)
            .filter(|&b| b < end)
            .collect();

        // Cost is monotonic in length, so binary search the break points.
        let (mut lo, mut hi) = (0usize, breaks.len());
        while lo < hi {
            let mid = (lo + hi).div_ceil(2);
            if self.estimator.estimate(text[start..breaks[mid - 1]].trim())? <= self.config.max_size {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }

        Ok(match lo {
            0 => breaks.first().copied().unwrap_or(end),
            n => breaks[n - 1],
        })
    }
}

/// Deterministic chunk id: `"{section key}#{index}"`.
pub fn chunk_id(section_key: &str, index: usize) -> String {
    format!("{}#{}", section_key, index)
}

/// Byte length of the next window, preferring to end after a newline or
/// space. Always at least one character.
fn window_end(remaining: &str, window: usize) -> usize {
    if remaining.len() <= window {
        return remaining.len();
    }
    let split_at = snap_to_char_boundary(remaining, window);
    let actual = remaining[..split_at]
        .rfind('\n')
        .or_else(|| remaining[..split_at].rfind(' '))
        .map(|pos| pos + 1)
        .unwrap_or(split_at);
    let actual = snap_to_char_boundary(remaining, actual);
    if actual == 0 {
        remaining
            .char_indices()
            .nth(1)
            .map(|(i, _)| i)
            .unwrap_or(remaining.len())
    } else {
        actual
    }
}

/// Step back `overlap` bytes from `end`, then forward to the next word
/// start. Always makes progress past `start`.
fn next_window_start(text: &str, start: usize, end: usize, overlap: usize) -> usize {
    if overlap == 0 {
        return end;
    }
    let back = snap_to_char_boundary(text, end.saturating_sub(overlap));
    let next = text[back..end]
        .find([' ', '\n'])
        .map(|pos| back + pos + 1)
        .unwrap_or(end);
    if next > start && next < end {
        next
    } else {
        end
    }
}

/// Snap a byte index back to the nearest valid UTF-8 char boundary.
fn snap_to_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn log_chunk_stats(chunks: &[Chunk]) {
    if chunks.is_empty() {
        tracing::info!("no chunks created");
        return;
    }
    let total_words: usize = chunks.iter().map(|c| c.word_count).sum();
    let min_words = chunks.iter().map(|c| c.word_count).min().unwrap_or(0);
    let max_words = chunks.iter().map(|c| c.word_count).max().unwrap_or(0);
    tracing::info!(
        chunks = chunks.len(),
        total_words,
        avg_words = total_words as f64 / chunks.len() as f64,
        min_words,
        max_words,
        "chunking complete"
    );
}
