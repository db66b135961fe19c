//! Chunk storage traits.

use std::io::Write;

use bytes::Bytes;
use nebula_primitives::assemble::{Assembly, assemble_with_hash, ordered_chunks};
use nebula_primitives::hash::digest;
use nebula_primitives::{Chunk, ChunkId, FileMetadata, PrimitivesError};
use tracing::{debug, error};

use crate::error::{Result, StoreError};

/// A flat blob store for chunk payloads, keyed by chunk id.
///
/// Implementations are plain key/value stores: they neither hash nor
/// validate what they hold. Integrity checks live in [`ChunkStoreExt`].
pub trait ChunkStore: Send + Sync {
    /// Store a payload, replacing any previous one.
    fn put(&self, id: &ChunkId, data: &Bytes) -> Result<()>;

    /// Fetch a payload. Returns `None` if the chunk is not stored.
    fn get(&self, id: &ChunkId) -> Result<Option<Bytes>>;

    /// Whether a payload is stored for `id`.
    fn contains(&self, id: &ChunkId) -> Result<bool>;

    /// Remove a payload. Returns `true` if it existed.
    fn delete(&self, id: &ChunkId) -> Result<bool>;
}

/// Extension methods for [`ChunkStore`].
pub trait ChunkStoreExt: ChunkStore {
    /// Store every chunk payload of `metadata`, returning the number stored.
    ///
    /// Fails on the first chunk without a payload; chunks stored before that
    /// stay stored.
    fn save_chunks(&self, metadata: &FileMetadata) -> Result<usize> {
        for chunk in metadata.chunks() {
            let payload = chunk.payload().map_err(PrimitivesError::from)?;
            self.put(chunk.id(), payload)?;
        }
        debug!(file_id = %metadata.id(), chunks = metadata.chunks().len(), "saved chunks");
        Ok(metadata.chunks().len())
    }

    /// Fetch a chunk's payload and check it against the recorded digest.
    fn load_verified(&self, chunk: &Chunk) -> Result<Bytes> {
        let data = self
            .get(chunk.id())?
            .ok_or_else(|| StoreError::NotFound(chunk.id().clone()))?;

        let actual = digest(&data);
        if &actual != chunk.hash() {
            error!(chunk_id = %chunk.id(), expected = %chunk.hash(), %actual, "cached chunk is corrupt");
            return Err(StoreError::Corrupt {
                id: chunk.id().clone(),
                expected: *chunk.hash(),
                actual,
            });
        }
        Ok(data)
    }

    /// Attach verified payloads from the store to a descriptor-only record.
    fn hydrate(&self, metadata: FileMetadata) -> Result<FileMetadata> {
        let chunks = metadata
            .chunks()
            .iter()
            .map(|chunk| Ok(chunk.clone().with_payload(self.load_verified(chunk)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(metadata.with_chunks(chunks))
    }

    /// Rebuild the file described by `metadata` from stored payloads.
    ///
    /// Every payload is fetched and verified before the first byte is written.
    fn assemble_into<W: Write>(&self, metadata: &FileMetadata, sink: W) -> Result<Assembly> {
        ordered_chunks(metadata)?;
        let hydrated = self.hydrate(metadata.clone())?;
        Ok(assemble_with_hash(&hydrated, sink)?)
    }

    /// Remove every chunk of `metadata`, returning how many were present.
    fn delete_chunks(&self, metadata: &FileMetadata) -> Result<usize> {
        let mut removed = 0;
        for chunk in metadata.chunks() {
            if self.delete(chunk.id())? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

// Blanket implementation
impl<T: ChunkStore + ?Sized> ChunkStoreExt for T {}
