//! Pluggable text cost functions.
//!
//! Chunk sizes are measured in "cost units", usually an approximate token
//! count. No tokenizer is mandated: anything implementing [`CostEstimator`]
//! can drive the chunker, including closures.

use crate::error::CollaboratorError;

/// Approximate characters-per-token ratio for English prose.
pub const CHARS_PER_TOKEN: usize = 4;

/// Approximate tokens-per-word ratio for English prose.
pub const TOKENS_PER_WORD: f64 = 1.3;

/// Maps text to a size-like cost.
///
/// Must be consistent (same input, same output) and monotonic in text
/// length for a fixed estimator.
pub trait CostEstimator: Send + Sync {
    fn estimate(&self, text: &str) -> Result<usize, CollaboratorError>;
}

impl<F> CostEstimator for F
where
    F: Fn(&str) -> Result<usize, CollaboratorError> + Send + Sync,
{
    fn estimate(&self, text: &str) -> Result<usize, CollaboratorError> {
        self(text)
    }
}

/// `⌊words × tokens_per_word⌋`.
#[derive(Debug, Clone, Copy)]
pub struct WordCostEstimator {
    pub tokens_per_word: f64,
}

impl Default for WordCostEstimator {
    fn default() -> Self {
        Self {
            tokens_per_word: TOKENS_PER_WORD,
        }
    }
}

impl CostEstimator for WordCostEstimator {
    fn estimate(&self, text: &str) -> Result<usize, CollaboratorError> {
        let words = text.split_whitespace().count();
        Ok((words as f64 * self.tokens_per_word) as usize)
    }
}

/// `⌈chars / chars_per_token⌉`.
#[derive(Debug, Clone, Copy)]
pub struct CharCostEstimator {
    pub chars_per_token: usize,
}

impl Default for CharCostEstimator {
    fn default() -> Self {
        Self {
            chars_per_token: CHARS_PER_TOKEN,
        }
    }
}

impl CostEstimator for CharCostEstimator {
    fn estimate(&self, text: &str) -> Result<usize, CollaboratorError> {
        let chars = text.chars().count();
        Ok(chars.div_ceil(self.chars_per_token.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_estimator() {
        let e = WordCostEstimator::default();
        assert_eq!(e.estimate("").unwrap(), 0);
        assert_eq!(e.estimate("one two three").unwrap(), 3);
        let fifty = vec!["word"; 50].join(" ");
        assert_eq!(e.estimate(&fifty).unwrap(), 65);
    }

    #[test]
    fn test_char_estimator_rounds_up() {
        let e = CharCostEstimator::default();
        assert_eq!(e.estimate("").unwrap(), 0);
        assert_eq!(e.estimate("abcd").unwrap(), 1);
        assert_eq!(e.estimate("abcde").unwrap(), 2);
        // Counts chars, not bytes.
        assert_eq!(e.estimate("§§§§").unwrap(), 1);
    }

    #[test]
    fn test_monotonic() {
        let e = WordCostEstimator::default();
        let mut text = String::new();
        let mut last = 0;
        for i in 0..40 {
            text.push_str(&format!(" w{}", i));
            let cost = e.estimate(&text).unwrap();
            assert!(cost >= last);
            last = cost;
        }
    }

    #[test]
    fn test_closure_estimator_error_propagates() {
        let failing = |_: &str| -> Result<usize, CollaboratorError> { Err("tokenizer offline".into()) };
        let err = failing.estimate("x").unwrap_err();
        assert_eq!(err.to_string(), "tokenizer offline");
    }
}
