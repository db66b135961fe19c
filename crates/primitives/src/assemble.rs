//! File assembler
//!
//! Rebuilds the original byte stream from a metadata record whose chunks
//! carry their payloads.
//!
//! Chunks are written in ascending index order regardless of the order they
//! are stored in. The indices must be exactly `0..n-1`; a gap or duplicate
//! is rejected before anything is written. A failure while writing leaves
//! whatever prefix was already written in the sink.

use std::io::Write;

use serde::Serialize;
use tracing::debug;

use crate::chunk::{Chunk, ChunkError};
use crate::error::Result;
use crate::hash::{ContentHash, HashingWriter};
use crate::metadata::FileMetadata;

/// Outcome of a successful assembly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Assembly {
    /// Bytes written to the sink
    pub bytes_written: u64,
    /// Digest of the bytes written
    pub hash: ContentHash,
}

impl Assembly {
    /// Whether the output reproduces the recorded size and whole-file digest
    pub fn matches(&self, metadata: &FileMetadata) -> bool {
        self.bytes_written == metadata.size() && &self.hash == metadata.hash()
    }
}

/// The chunks of `metadata` sorted by index.
///
/// Fails unless the indices are exactly `0..n-1`.
pub fn ordered_chunks(metadata: &FileMetadata) -> Result<Vec<&Chunk>> {
    let mut chunks: Vec<&Chunk> = metadata.chunks().iter().collect();
    chunks.sort_by_key(|chunk| chunk.index());

    for (expected, chunk) in (0u64..).zip(&chunks) {
        if chunk.index() != expected {
            return Err(ChunkError::index_mismatch(expected, chunk.index()).into());
        }
    }
    Ok(chunks)
}

/// Write the file described by `metadata` to `sink`, returning the byte count.
pub fn assemble<W: Write>(metadata: &FileMetadata, sink: W) -> Result<u64> {
    assemble_with_hash(metadata, sink).map(|assembly| assembly.bytes_written)
}

/// Like [`assemble`], also hashing the output on the way through.
pub fn assemble_with_hash<W: Write>(metadata: &FileMetadata, sink: W) -> Result<Assembly> {
    let chunks = ordered_chunks(metadata)?;
    let payloads = chunks
        .iter()
        .map(|chunk| chunk.payload())
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut writer = HashingWriter::new(sink);
    for payload in payloads {
        writer.write_all(payload)?;
    }
    writer.flush()?;

    let bytes_written = writer.written();
    let (_, hash) = writer.finish();
    debug!(file_id = %metadata.id(), bytes_written, %hash, "assembled file");

    Ok(Assembly {
        bytes_written,
        hash,
    })
}
