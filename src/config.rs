use anyhow::{Context, Result};
use regchunk_core::chunk::ChunkerConfig;
use regchunk_core::dialect::Dialect;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ParserConfig {
    /// Used when detection finds no structural evidence.
    #[serde(default = "default_dialect")]
    pub default_dialect: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            default_dialect: default_dialect(),
        }
    }
}

fn default_dialect() -> String {
    "gdpr".to_string()
}

impl ParserConfig {
    pub fn dialect(&self) -> Result<Dialect> {
        self.default_dialect
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_target_size")]
    pub target_size: usize,
    #[serde(default = "default_max_size")]
    pub max_size: usize,
    #[serde(default = "default_min_size")]
    pub min_size: usize,
    #[serde(default = "default_overlap_budget")]
    pub overlap_budget: usize,
    #[serde(default = "default_respect_sentences")]
    pub respect_sentence_boundaries: bool,
    #[serde(default = "default_chars_per_unit")]
    pub chars_per_unit: usize,
    /// `words` (default), `chars`, or `tokenizer` (requires the `hf-tokenizer` feature).
    #[serde(default = "default_estimator")]
    pub estimator: String,
    /// Path to a `tokenizer.json`, used when `estimator = "tokenizer"`.
    #[serde(default)]
    pub tokenizer_path: Option<PathBuf>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_size: default_target_size(),
            max_size: default_max_size(),
            min_size: default_min_size(),
            overlap_budget: default_overlap_budget(),
            respect_sentence_boundaries: default_respect_sentences(),
            chars_per_unit: default_chars_per_unit(),
            estimator: default_estimator(),
            tokenizer_path: None,
        }
    }
}

fn default_target_size() -> usize {
    800
}
fn default_max_size() -> usize {
    1200
}
fn default_min_size() -> usize {
    200
}
fn default_overlap_budget() -> usize {
    100
}
fn default_respect_sentences() -> bool {
    true
}
fn default_chars_per_unit() -> usize {
    regchunk_core::cost::CHARS_PER_TOKEN
}
fn default_estimator() -> String {
    "words".to_string()
}

impl ChunkingConfig {
    pub fn chunker_config(&self) -> ChunkerConfig {
        ChunkerConfig {
            target_size: self.target_size,
            max_size: self.max_size,
            min_size: self.min_size,
            overlap_budget: self.overlap_budget,
            respect_sentence_boundaries: self.respect_sentence_boundaries,
            chars_per_unit: self.chars_per_unit,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

fn default_include_globs() -> Vec<String> {
    vec![
        "**/*.txt".to_string(),
        "**/*.md".to_string(),
        "**/*.pdf".to_string(),
        "**/*.docx".to_string(),
    ]
}

impl Config {
    /// Built-in defaults, used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to [`Config::minimal`].
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::minimal())
    }
}

fn validate(config: &Config) -> Result<()> {
    config
        .chunking
        .chunker_config()
        .validate()
        .map_err(|e| anyhow::anyhow!("chunking: {}", e))?;

    config.parser.dialect()?;

    match config.chunking.estimator.as_str() {
        "words" | "chars" => {}
        "tokenizer" => {
            if config.chunking.tokenizer_path.is_none() {
                anyhow::bail!("chunking.tokenizer_path must be set when estimator is 'tokenizer'");
            }
        }
        other => anyhow::bail!(
            "Unknown chunking estimator: '{}'. Must be words, chars, or tokenizer.",
            other
        ),
    }

    if config.ingest.include_globs.is_empty() {
        anyhow::bail!("ingest.include_globs must not be empty");
    }

    Ok(())
}
