//! Persistence abstraction for chunk output.
//!
//! The chunker itself never persists anything. Callers hand the final chunk
//! list to a [`ChunkSink`] together with each chunk's flat metadata map;
//! embedding pipelines, vector databases, and file exporters all sit behind
//! this trait.

pub mod memory;

use crate::error::CollaboratorError;
use crate::models::Chunk;

/// Receives chunks in order, one call per chunk.
///
/// Errors propagate unchanged to the caller of [`store_all`].
pub trait ChunkSink {
    fn store(&mut self, chunk: &Chunk, metadata: &serde_json::Value) -> Result<(), CollaboratorError>;

    /// Called once after the last chunk. Buffered sinks flush here.
    fn finish(&mut self) -> Result<(), CollaboratorError> {
        Ok(())
    }
}

/// Store every chunk with its [`Chunk::metadata`], then finish the sink.
///
/// Returns the number of chunks stored.
pub fn store_all<S: ChunkSink + ?Sized>(sink: &mut S, chunks: &[Chunk]) -> Result<usize, CollaboratorError> {
    for chunk in chunks {
        sink.store(chunk, &chunk.metadata())?;
    }
    sink.finish()?;
    tracing::debug!(chunks = chunks.len(), "chunks stored");
    Ok(chunks.len())
}
