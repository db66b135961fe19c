use thiserror::Error;

use super::id::ChunkId;

/// Result type for chunk operations
pub(crate) type Result<T> = std::result::Result<T, ChunkError>;

/// Errors specific to chunk operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChunkError {
    /// The chunk carries no payload (e.g. it was deserialized from a record)
    #[error("chunk {0} has no payload attached")]
    MissingPayload(ChunkId),

    /// Chunk indices are not exactly `0..n-1`
    #[error("chunk index mismatch: expected {expected}, got {actual}")]
    IndexMismatch {
        /// The index the next chunk should carry.
        expected: u64,
        /// The index it actually carries.
        actual: u64,
    },
}

impl ChunkError {
    /// Shorthand for [`ChunkError::IndexMismatch`]
    pub const fn index_mismatch(expected: u64, actual: u64) -> Self {
        Self::IndexMismatch { expected, actual }
    }
}
