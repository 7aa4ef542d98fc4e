//! In-memory [`ChunkSink`] for tests and embedding callers that want the
//! chunk list back without touching the filesystem.

use crate::error::CollaboratorError;
use crate::models::Chunk;

use super::ChunkSink;

/// A chunk and the metadata map it was stored with.
#[derive(Debug, Clone)]
pub struct StoredChunk {
    pub chunk: Chunk,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Default)]
pub struct MemorySink {
    stored: Vec<StoredChunk>,
    finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(&self) -> &[StoredChunk] {
        &self.stored
    }

    pub fn len(&self) -> usize {
        self.stored.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stored.is_empty()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn get(&self, chunk_id: &str) -> Option<&StoredChunk> {
        self.stored.iter().find(|s| s.chunk.chunk_id == chunk_id)
    }

    pub fn into_chunks(self) -> Vec<Chunk> {
        self.stored.into_iter().map(|s| s.chunk).collect()
    }
}

impl ChunkSink for MemorySink {
    fn store(&mut self, chunk: &Chunk, metadata: &serde_json::Value) -> Result<(), CollaboratorError> {
        self.stored.push(StoredChunk {
            chunk: chunk.clone(),
            metadata: metadata.clone(),
        });
        Ok(())
    }

    fn finish(&mut self) -> Result<(), CollaboratorError> {
        self.finished = true;
        Ok(())
    }
}
