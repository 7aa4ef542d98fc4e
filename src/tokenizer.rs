//! Cost estimators selected from configuration.
//!
//! `words` and `chars` map to the core heuristics. `tokenizer` loads a
//! HuggingFace `tokenizer.json` and counts real model tokens; it is only
//! available with the `hf-tokenizer` feature.

use anyhow::Result;
use regchunk_core::cost::{CharCostEstimator, CostEstimator, WordCostEstimator};

use crate::config::ChunkingConfig;

pub fn build_estimator(config: &ChunkingConfig) -> Result<Box<dyn CostEstimator>> {
    match config.estimator.as_str() {
        "words" => Ok(Box::new(WordCostEstimator::default())),
        "chars" => Ok(Box::new(CharCostEstimator {
            chars_per_token: config.chars_per_unit,
        })),
        "tokenizer" => tokenizer_estimator(config),
        other => anyhow::bail!("Unknown chunking estimator: '{}'", other),
    }
}

#[cfg(feature = "hf-tokenizer")]
fn tokenizer_estimator(config: &ChunkingConfig) -> Result<Box<dyn CostEstimator>> {
    let path = config
        .tokenizer_path
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("chunking.tokenizer_path is not set"))?;
    Ok(Box::new(TokenizerCostEstimator::from_file(path)?))
}

#[cfg(not(feature = "hf-tokenizer"))]
fn tokenizer_estimator(_config: &ChunkingConfig) -> Result<Box<dyn CostEstimator>> {
    anyhow::bail!("estimator 'tokenizer' requires building with the `hf-tokenizer` feature")
}

/// Counts tokens with a HuggingFace tokenizer, without special tokens.
#[cfg(feature = "hf-tokenizer")]
pub struct TokenizerCostEstimator {
    tokenizer: tokenizers::Tokenizer,
}

#[cfg(feature = "hf-tokenizer")]
impl TokenizerCostEstimator {
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let tokenizer = tokenizers::Tokenizer::from_file(path)
            .map_err(|e| anyhow::anyhow!("Load tokenizer {}: {}", path.display(), e))?;
        Ok(Self { tokenizer })
    }
}

#[cfg(feature = "hf-tokenizer")]
impl CostEstimator for TokenizerCostEstimator {
    fn estimate(&self, text: &str) -> Result<usize, regchunk_core::error::CollaboratorError> {
        let encoding = self.tokenizer.encode(text, false)?;
        Ok(encoding.get_ids().len())
    }
}
