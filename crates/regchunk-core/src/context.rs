//! Cross-chunk context borrowing.
//!
//! Each chunk gets a short `lead_context` (tail of the previous chunk) and
//! `trail_context` (head of the next chunk), each bounded by the chunker's
//! `overlap_budget`. Chunk `content` is never modified.

use crate::chunk::BoundaryAwareChunker;
use crate::error::CollaboratorError;
use crate::models::Chunk;

const CONTEXT_SENTENCES: usize = 2;

#[derive(Clone, Copy)]
enum Edge {
    Head,
    Tail,
}

impl BoundaryAwareChunker {
    /// Fill `lead_context`/`trail_context` across the whole ordered list.
    ///
    /// Sentences already duplicated as an overlap seed are not borrowed a
    /// second time. With `overlap_budget == 0` the chunks come back as-is.
    pub fn attach_cross_chunk_context(
        &self,
        mut chunks: Vec<Chunk>,
    ) -> Result<Vec<Chunk>, CollaboratorError> {
        let budget = self.config().overlap_budget;
        if budget == 0 {
            return Ok(chunks);
        }

        for i in 0..chunks.len() {
            let lead = match i.checked_sub(1) {
                Some(prev) => {
                    let source = strip_seed_suffix(&chunks[prev].content, chunks[i].overlap_seed.as_deref());
                    self.bounded(source, Edge::Tail, budget)?
                }
                None => String::new(),
            };
            let trail = match chunks.get(i + 1) {
                Some(next) => self.bounded(next.own_content(), Edge::Head, budget)?,
                None => String::new(),
            };
            chunks[i].lead_context = lead;
            chunks[i].trail_context = trail;
        }

        Ok(chunks)
    }

    /// Up to two sentences from one edge of `text`, cut down to fit `budget`.
    fn bounded(&self, text: &str, edge: Edge, budget: usize) -> Result<String, CollaboratorError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(String::new());
        }

        let sentences = self.splitter.split(text)?;
        let picked: Vec<&str> = match edge {
            Edge::Head => sentences.iter().take(CONTEXT_SENTENCES).map(String::as_str).collect(),
            Edge::Tail => {
                let skip = sentences.len().saturating_sub(CONTEXT_SENTENCES);
                sentences.iter().skip(skip).map(String::as_str).collect()
            }
        };

        let joined = picked.join(" ");
        if picked.len() > 1 && self.estimator.estimate(&joined)? <= budget {
            return Ok(joined);
        }

        let single = match edge {
            Edge::Head => picked.first(),
            Edge::Tail => picked.last(),
        };
        let Some(single) = single.map(|s| s.trim()) else {
            return Ok(String::new());
        };
        if self.estimator.estimate(single)? <= budget {
            return Ok(single.to_string());
        }
        self.truncate_words(single, edge, budget)
    }

    /// Longest run of whole words from `edge` whose cost fits `budget`.
    fn truncate_words(&self, sentence: &str, edge: Edge, budget: usize) -> Result<String, CollaboratorError> {
        let words: Vec<&str> = sentence.split_whitespace().collect();
        let (mut lo, mut hi) = (0usize, words.len());

        // Cost is monotonic in length, so binary search the word count.
        while lo < hi {
            let mid = (lo + hi).div_ceil(2);
            if self.estimator.estimate(&take_words(&words, edge, mid))? <= budget {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        Ok(take_words(&words, edge, lo))
    }
}

fn take_words(words: &[&str], edge: Edge, n: usize) -> String {
    match edge {
        Edge::Head => words[..n].join(" "),
        Edge::Tail => words[words.len() - n..].join(" "),
    }
}

/// The previous chunk minus the trailing sentence the current chunk already
/// starts with.
fn strip_seed_suffix<'a>(content: &'a str, seed: Option<&str>) -> &'a str {
    match seed {
        Some(seed) => content
            .strip_suffix(seed)
            .map(str::trim_end)
            .unwrap_or(content),
        None => content,
    }
}
