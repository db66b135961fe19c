//! In-memory chunk storage backend.

use std::collections::HashMap;

use bytes::Bytes;
use nebula_primitives::ChunkId;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::Result;
use crate::traits::ChunkStore;

/// In-memory chunk store backed by a `RwLock<HashMap>`.
///
/// Useful for tests and for runs that should leave nothing on disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    chunks: RwLock<HashMap<ChunkId, Bytes>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of payloads held
    pub fn len(&self) -> usize {
        self.chunks.read().len()
    }

    /// Whether the store holds nothing
    pub fn is_empty(&self) -> bool {
        self.chunks.read().is_empty()
    }

    /// Total payload bytes held
    pub fn used_bytes(&self) -> u64 {
        self.chunks.read().values().map(|v| v.len() as u64).sum()
    }
}

impl ChunkStore for MemoryStore {
    fn put(&self, id: &ChunkId, data: &Bytes) -> Result<()> {
        debug!(%id, size = data.len(), "storing chunk in memory");
        self.chunks.write().insert(id.clone(), data.clone());
        Ok(())
    }

    fn get(&self, id: &ChunkId) -> Result<Option<Bytes>> {
        Ok(self.chunks.read().get(id).cloned())
    }

    fn contains(&self, id: &ChunkId) -> Result<bool> {
        Ok(self.chunks.read().contains_key(id))
    }

    fn delete(&self, id: &ChunkId) -> Result<bool> {
        let removed = self.chunks.write().remove(id).is_some();
        if removed {
            debug!(%id, "deleted chunk from memory");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChunkStoreExt, StoreError};
    use nebula_primitives::{Chunker, FileDescriptor, FileId, FileMetadata, PrimitivesError};
    use proptest::prelude::*;

    fn sample(data: &[u8], size: usize) -> FileMetadata {
        Chunker::new(size)
            .unwrap()
            .chunk_bytes(data.to_vec(), FileDescriptor::new("m.bin").with_id(FileId::new("m")))
    }

    fn record(meta: &FileMetadata) -> FileMetadata {
        let json = serde_json::to_string(meta).unwrap();
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_put_replace_delete() {
        let store = MemoryStore::new();
        let id = ChunkId::new(&FileId::new("m"), 0);

        store.put(&id, &Bytes::from_static(b"one")).unwrap();
        store.put(&id, &Bytes::from_static(b"three")).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.used_bytes(), 5);
        assert_eq!(store.get(&id).unwrap().unwrap(), Bytes::from_static(b"three"));

        assert!(store.delete(&id).unwrap());
        assert!(!store.delete(&id).unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn test_hydrate_descriptor_only_record() {
        let store = MemoryStore::new();
        let meta = sample(b"0123456789abcdefghij", 6);
        store.save_chunks(&meta).unwrap();

        let loaded = record(&meta);
        assert!(!loaded.has_payloads());

        let hydrated = store.hydrate(loaded).unwrap();
        assert!(hydrated.has_payloads());
        assert_eq!(hydrated, meta);
    }

    #[test]
    fn test_missing_chunk_reported() {
        let store = MemoryStore::new();
        let meta = sample(b"0123456789", 4);
        store.save_chunks(&meta).unwrap();
        store.delete(meta.chunks()[2].id()).unwrap();

        let err = store.hydrate(record(&meta)).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(ref id) if id == meta.chunks()[2].id()));
    }

    #[test]
    fn test_save_without_payload_fails() {
        let store = MemoryStore::new();
        let meta = sample(b"0123456789", 4);

        let err = store.save_chunks(&record(&meta)).unwrap_err();
        assert!(matches!(err, StoreError::Primitives(PrimitivesError::Chunk(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_corrupt_payload_detected() {
        let store = MemoryStore::new();
        let meta = sample(b"0123456789", 4);
        store.save_chunks(&meta).unwrap();
        store
            .put(meta.chunks()[0].id(), &Bytes::from_static(b"9999"))
            .unwrap();

        let err = store.load_verified(&meta.chunks()[0]).unwrap_err();
        match err {
            StoreError::Corrupt { expected, .. } => assert_eq!(&expected, meta.chunks()[0].hash()),
            other => panic!("unexpected error: {other}"),
        }
    }

    proptest! {
        #[test]
        fn test_store_roundtrip(data in proptest::collection::vec(any::<u8>(), 0..2048), size in 1usize..256) {
            let store = MemoryStore::new();
            let meta = sample(&data, size);
            store.save_chunks(&meta).unwrap();

            let mut out = Vec::new();
            let assembly = store.assemble_into(&record(&meta), &mut out).unwrap();
            prop_assert_eq!(&out, &data);
            prop_assert!(assembly.matches(&meta));
            prop_assert_eq!(store.used_bytes(), data.len() as u64);
        }
    }
}
