//! Content-addressed chunk implementation
//!
//! A [`Chunk`] is one fixed-size window of a file together with the digest
//! of its payload. The payload travels with the chunk while it is in memory;
//! records read back from storage carry only the descriptor fields.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::hash::{ContentHash, digest};

use super::error::{ChunkError, Result};
use super::id::{ChunkId, FileId};

/// A content-addressed chunk.
///
/// Serializes as `{id, index, hash, size}`; the payload is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Identifier derived from the parent file id and the index
    id: ChunkId,
    /// Position in the parent file, 0-based
    index: u64,
    /// Digest of the payload at the time the chunk was produced
    hash: ContentHash,
    /// Payload length in bytes
    size: u64,
    /// The raw data, absent for descriptor-only records
    #[serde(skip)]
    data: Option<Bytes>,
}

impl Chunk {
    /// Create chunk `index` of `file` from its payload, hashing the payload.
    #[must_use = "this returns a new chunk without modifying the input"]
    pub fn new(file: &FileId, index: u64, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let hash = digest(&data);
        Self::from_parts(ChunkId::new(file, index), index, hash, data)
    }

    /// Assemble a chunk from parts that are already known.
    ///
    /// The hash is taken on trust; nothing is recomputed.
    #[must_use]
    pub fn from_parts(id: ChunkId, index: u64, hash: ContentHash, data: Bytes) -> Self {
        Self {
            id,
            index,
            hash,
            size: data.len() as u64,
            data: Some(data),
        }
    }

    /// Create a descriptor-only chunk with no payload attached.
    #[must_use]
    pub const fn descriptor(id: ChunkId, index: u64, hash: ContentHash, size: u64) -> Self {
        Self {
            id,
            index,
            hash,
            size,
            data: None,
        }
    }

    /// Attach a payload, keeping the recorded hash.
    ///
    /// The recorded size is left untouched as well, so a short payload
    /// stays visible to callers comparing `size()` with `data()`.
    #[must_use]
    pub fn with_payload(self, data: impl Into<Bytes>) -> Self {
        Self {
            data: Some(data.into()),
            ..self
        }
    }

    /// Get the identifier of this chunk
    pub const fn id(&self) -> &ChunkId {
        &self.id
    }

    /// Get the index of this chunk within its file
    pub const fn index(&self) -> u64 {
        self.index
    }

    /// Get the recorded payload digest
    pub const fn hash(&self) -> &ContentHash {
        &self.hash
    }

    /// Get the recorded payload size
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Get the payload, if attached
    pub const fn data(&self) -> Option<&Bytes> {
        self.data.as_ref()
    }

    /// Get the payload, failing when it is not attached
    pub fn payload(&self) -> Result<&Bytes> {
        self.data
            .as_ref()
            .ok_or_else(|| ChunkError::MissingPayload(self.id.clone()))
    }

    /// Recompute the payload digest and compare it with the recorded one.
    ///
    /// Returns `None` when no payload is attached.
    pub fn payload_matches(&self) -> Option<bool> {
        self.data.as_ref().map(|data| digest(data) == self.hash)
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Chunk[{}#{} {}]", self.id, self.index, &self.hash.to_hex()[..16])
    }
}
