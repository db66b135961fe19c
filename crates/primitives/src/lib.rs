//! Core primitives for chunked, content-addressed file storage
//!
//! This crate splits byte streams into fixed-size chunks, digests each chunk
//! and the whole stream, folds the chunk digests into a Merkle root, puts
//! files back together from their chunks, and checks stored records against
//! their recorded roots.
//!
//! ## Key Components
//!
//! - **Digests**: SHA-256, hex-encoded ([`ContentHash`], [`hash::digest`], [`hash::stream_digest`])
//! - **Chunking**: fixed-size windows with stable ids ([`Chunker`], [`ChunkStream`], [`Chunk`])
//! - **Merkle roots**: pairwise fold over digest text with carry-forward ([`merkle::build_root`])
//! - **Metadata**: the serializable file record ([`FileMetadata`])
//! - **Assembly and verification**: [`assemble::assemble`], [`verify::verify`]
//!
//! ## Usage Examples
//!
//! ```
//! use nebula_primitives::{Chunker, FileDescriptor, assemble, verify};
//!
//! let content = b"This is a test file content for chunking.";
//! let chunker = Chunker::new(10).unwrap();
//! let metadata = chunker
//!     .chunk_reader(&content[..], FileDescriptor::new("test.txt"))
//!     .unwrap();
//!
//! assert_eq!(metadata.chunks().len(), 5);
//! assert!(verify::verify(&metadata));
//!
//! let mut rebuilt = Vec::new();
//! assemble::assemble(&metadata, &mut rebuilt).unwrap();
//! assert_eq!(rebuilt, content);
//! ```

// Re-export dependencies that are part of our public API
pub use bytes;

pub mod assemble;
pub mod chunk;
pub mod error;
pub mod hash;
pub mod merkle;
pub mod metadata;
pub mod mime;
pub mod verify;

// Re-export core types
pub use error::{PrimitivesError, Result, ValidationError};
pub use hash::ContentHash;

// Core chunk functionality
pub use chunk::{
    Chunk, ChunkError, ChunkId, ChunkStream, Chunker, DEFAULT_CHUNK_SIZE, FileId, StreamSummary,
};

// Merkle roots
pub use merkle::MerkleRoot;

// The metadata record
pub use metadata::{FileDescriptor, FileMetadata};
