//! Chunk types and operations
//!
//! This module provides the chunk type, file and chunk identifiers, and the
//! chunkers that split byte streams into ordered fixed-size chunks.

mod chunker;
mod content;
pub(crate) mod error;
mod id;
mod stream;

pub use chunker::{Chunker, DEFAULT_CHUNK_SIZE};
pub use content::Chunk;
pub use error::ChunkError;
pub use id::{ChunkId, FileId};
pub use stream::{ChunkStream, StreamSummary};
