//! Error types for the core pipeline.

use thiserror::Error;

/// A failure raised by an injected collaborator (sentence splitter, cost
/// estimator, chunk sink).
///
/// The core never wraps or swallows these: they propagate to the caller
/// exactly as the collaborator produced them.
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Raised by [`StructuralParser`](crate::parser::StructuralParser) only when
/// the input cannot be read at all. Unrecognized structure is never an error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("document is empty or contains only whitespace")]
    Empty,
    #[error("document is not valid UTF-8: {0}")]
    Unreadable(String),
}

/// Rejected chunker configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid chunker configuration: {0}")]
    Invalid(String),
}
