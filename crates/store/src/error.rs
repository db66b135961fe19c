//! Error types for chunk storage operations.

use nebula_primitives::{ChunkId, ContentHash, PrimitivesError};

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during chunk storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested chunk was not found.
    #[error("chunk not found: {0}")]
    NotFound(ChunkId),

    /// The chunk id cannot be used as a storage key.
    #[error("invalid chunk key: {0:?}")]
    InvalidKey(ChunkId),

    /// An I/O error occurred.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Cached bytes do not hash to the digest recorded for the chunk.
    #[error("chunk corruption detected for {id}: expected {expected}, actual hash {actual}")]
    Corrupt {
        /// The chunk that was read.
        id: ChunkId,
        /// The digest recorded in the metadata.
        expected: ContentHash,
        /// The digest of the bytes actually stored.
        actual: ContentHash,
    },

    /// A remote collaborator refused the request.
    #[error("remote rejected request: {0}")]
    Remote(String),

    /// Errors from the core primitives (missing payloads, index gaps, ...).
    #[error(transparent)]
    Primitives(#[from] PrimitivesError),
}
