//! Core data models shared by the parser and the chunker.
//!
//! A [`Section`] is produced once per parse and never mutated afterwards.
//! Every [`Chunk`] holds a shared, read-only handle to the section it was
//! cut from, so citation metadata travels with the text all the way to the
//! embedding sink.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::dialect::Dialect;

/// Structural role of a [`Section`] within its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    Title,
    Part,
    Subpart,
    Chapter,
    Article,
    Recital,
    Section,
    /// Synthetic root used when no heading is recognized.
    Document,
}

impl SectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::Title => "title",
            SectionType::Part => "part",
            SectionType::Subpart => "subpart",
            SectionType::Chapter => "chapter",
            SectionType::Article => "article",
            SectionType::Recital => "recital",
            SectionType::Section => "section",
            SectionType::Document => "document",
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metrics computed from a section's cleaned content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionMetrics {
    pub word_count: usize,
    pub sentence_count: usize,
    pub char_length: usize,
}

/// A contiguous, structurally typed unit of a regulatory document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Cleaned body text, including the heading line.
    pub content: String,
    pub section_type: SectionType,
    /// The document's own numbering, captured verbatim (`"160.101"`, `"IV"`).
    pub section_id: String,
    /// Heading text; empty when the heading carried none.
    pub title: String,
    /// Id (or `"{top}.{mid}"` composite) of the enclosing unit.
    pub parent_id: Option<String>,
    pub metrics: SectionMetrics,
    pub dialect: Dialect,
    /// 1-based line of the opening heading; 0 for the synthetic fallback.
    pub start_line: usize,
}

impl Section {
    /// Stable key used to derive chunk ids: `"{type}:{parent}/{id}"`.
    pub fn key(&self) -> String {
        match &self.parent_id {
            Some(parent) => format!("{}:{}/{}", self.section_type, parent, self.section_id),
            None => format!("{}:{}", self.section_type, self.section_id),
        }
    }

    /// Short citation label such as `ARTICLE 17` or `SECTION 160.101`.
    pub fn label(&self) -> String {
        format!(
            "{} {}",
            self.section_type.as_str().to_uppercase(),
            self.section_id
        )
    }
}

/// Whether a chunk covers its whole section or one piece of a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    FullSection,
    PartialSection,
}

impl ChunkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkType::FullSection => "full_section",
            ChunkType::PartialSection => "partial_section",
        }
    }
}

/// A size-bounded retrieval fragment derived from exactly one [`Section`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: String,
    pub source_section: Arc<Section>,
    pub chunk_type: ChunkType,
    pub chunk_index: usize,
    pub content: String,
    /// Borrowed tail of the previous chunk. Display/embedding only.
    pub lead_context: String,
    /// Borrowed head of the next chunk. Display/embedding only.
    pub trail_context: String,
    pub word_count: usize,
    pub sentence_count: usize,
    pub estimated_cost: usize,
    /// Text duplicated from the previous chunk at the front of `content`.
    pub overlap_seed: Option<String>,
    /// SHA-256 of `content`, hex encoded.
    pub hash: String,
}

impl Chunk {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        chunk_id: String,
        section: &Arc<Section>,
        chunk_type: ChunkType,
        chunk_index: usize,
        content: String,
        sentence_count: usize,
        estimated_cost: usize,
        overlap_seed: Option<String>,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        let hash = format!("{:x}", hasher.finalize());

        Chunk {
            chunk_id,
            source_section: Arc::clone(section),
            chunk_type,
            chunk_index,
            word_count: content.split_whitespace().count(),
            content,
            lead_context: String::new(),
            trail_context: String::new(),
            sentence_count,
            estimated_cost,
            overlap_seed,
            hash,
        }
    }

    /// `content` without the overlap seed carried over from the previous chunk.
    pub fn own_content(&self) -> &str {
        match &self.overlap_seed {
            Some(seed) => self
                .content
                .strip_prefix(seed.as_str())
                .map(str::trim_start)
                .unwrap_or(&self.content),
            None => &self.content,
        }
    }

    /// Flat metadata map handed to persistence sinks next to the chunk.
    pub fn metadata(&self) -> serde_json::Value {
        let section = &self.source_section;
        json!({
            "chunk_id": self.chunk_id,
            "chunk_index": self.chunk_index,
            "chunk_type": self.chunk_type.as_str(),
            "section_type": section.section_type.as_str(),
            "section_id": section.section_id,
            "section_title": section.title,
            "parent_section": section.parent_id,
            "document_type": section.dialect.as_str(),
            "regulation": section.dialect.regulation(),
            "estimated_tokens": self.estimated_cost,
            "word_count": self.word_count,
            "sentence_count": self.sentence_count,
            "hash": self.hash,
        })
    }

    /// Text rendered for retrieval: section header, borrowed context, content.
    pub fn retrieval_text(&self, include_context: bool) -> String {
        let section = &self.source_section;
        let mut parts: Vec<String> = Vec::with_capacity(4);

        if !section.title.is_empty() {
            parts.push(format!("[{}: {}]", section.label(), section.title));
        }
        if include_context && !self.lead_context.is_empty() {
            parts.push(format!("...{}", self.lead_context));
        }
        parts.push(self.content.clone());
        if include_context && !self.trail_context.is_empty() {
            parts.push(format!("{}...", self.trail_context));
        }

        parts.join("\n\n")
    }
}
