//! Fixed-size chunker
//!
//! Splits input into windows of `chunk_size` bytes; the last window may be
//! shorter. Every window becomes a [`Chunk`] whose index is its read order.
//! Empty input produces no chunks and the empty Merkle root.

use std::fs::File;
use std::io::Read;
use std::num::NonZeroUsize;
use std::path::Path;

use bytes::Bytes;
use tracing::debug;

use crate::error::{Result, ValidationError};
use crate::hash::digest;
use crate::merkle::build_root;
use crate::metadata::{FileDescriptor, FileMetadata};

use super::content::Chunk;
use super::id::FileId;
use super::stream::ChunkStream;

/// Chunk size used when none is configured (1 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

// Evaluated at compile time, so a zero default fails the build
const DEFAULT_WINDOW: NonZeroUsize = NonZeroUsize::new(DEFAULT_CHUNK_SIZE).unwrap();

/// Fixed-size chunker that splits data into chunks of a configured size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: NonZeroUsize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_WINDOW,
        }
    }
}

impl Chunker {
    /// Create a new chunker with the given chunk size in bytes.
    ///
    /// A zero chunk size is rejected here, before any input is touched.
    pub fn new(chunk_size: usize) -> Result<Self> {
        let chunk_size = NonZeroUsize::new(chunk_size).ok_or(ValidationError::ZeroChunkSize)?;
        Ok(Self { chunk_size })
    }

    /// The configured chunk size
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size.get()
    }

    /// Chunk a reader lazily; see [`ChunkStream`].
    pub fn stream<R: Read>(&self, reader: R, file_id: FileId) -> ChunkStream<R> {
        ChunkStream::new(reader, self.chunk_size(), file_id)
    }

    /// Read a stream to the end and describe it.
    ///
    /// All chunk payloads are held in the returned metadata. Nothing is
    /// persisted.
    pub fn chunk_reader<R: Read>(
        &self,
        reader: R,
        mut descriptor: FileDescriptor,
    ) -> Result<FileMetadata> {
        let file_id = descriptor.resolve_id();
        let mut stream = self.stream(reader, file_id);

        let mut chunks = Vec::new();
        for chunk in stream.by_ref() {
            chunks.push(chunk?);
        }
        let summary = stream.finish()?;
        let merkle_root = build_root(chunks.iter().map(Chunk::hash));

        debug!(
            filename = descriptor.filename(),
            size = summary.size,
            chunks = chunks.len(),
            chunk_size = self.chunk_size(),
            %merkle_root,
            "chunked stream"
        );

        Ok(descriptor.into_metadata(summary.size, summary.hash, merkle_root, chunks))
    }

    /// Chunk a file on disk.
    ///
    /// The filename is the path's last component, the timestamp the file's
    /// modification time.
    pub fn chunk_file(&self, path: impl AsRef<Path>) -> Result<FileMetadata> {
        let path = path.as_ref();
        let descriptor = FileDescriptor::for_path(path)?;
        self.chunk_reader(File::open(path)?, descriptor)
    }

    /// Chunk an in-memory buffer.
    ///
    /// Chunk payloads share the buffer's allocation. With the `parallel`
    /// feature the per-chunk digests are computed on the rayon pool; the
    /// result is identical either way.
    pub fn chunk_bytes(&self, data: impl Into<Bytes>, mut descriptor: FileDescriptor) -> FileMetadata {
        let data = data.into();
        let file_id = descriptor.resolve_id();
        let chunks = split(&data, self.chunk_size(), &file_id);
        let merkle_root = build_root(chunks.iter().map(Chunk::hash));

        debug!(
            filename = descriptor.filename(),
            size = data.len(),
            chunks = chunks.len(),
            chunk_size = self.chunk_size(),
            %merkle_root,
            "chunked buffer"
        );

        descriptor.into_metadata(data.len() as u64, digest(&data), merkle_root, chunks)
    }
}

#[cfg(feature = "parallel")]
fn split(data: &Bytes, chunk_size: usize, file_id: &FileId) -> Vec<Chunk> {
    use rayon::prelude::*;

    let count = data.len().div_ceil(chunk_size);
    (0..count)
        .into_par_iter()
        .map(|i| window(data, chunk_size, file_id, i))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn split(data: &Bytes, chunk_size: usize, file_id: &FileId) -> Vec<Chunk> {
    let count = data.len().div_ceil(chunk_size);
    (0..count)
        .map(|i| window(data, chunk_size, file_id, i))
        .collect()
}

#[inline]
fn window(data: &Bytes, chunk_size: usize, file_id: &FileId, i: usize) -> Chunk {
    let start = i * chunk_size;
    let end = start.saturating_add(chunk_size).min(data.len());
    Chunk::new(file_id, i as u64, data.slice(start..end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PrimitivesError;
    use crate::merkle::MerkleRoot;
    use proptest::prelude::*;
    use std::io::{self, Write};

    const SAMPLE: &[u8] = b"This is a test file content for chunking.";

    fn named(name: &str) -> FileDescriptor {
        FileDescriptor::new(name).with_id(FileId::new("file"))
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let err = Chunker::new(0).unwrap_err();
        assert!(matches!(
            err,
            PrimitivesError::Validation(ValidationError::ZeroChunkSize)
        ));
    }

    #[test]
    fn test_default_chunk_size() {
        assert_eq!(Chunker::default().chunk_size(), DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_chunk_size_larger_than_input() {
        let chunker = Chunker::new(usize::MAX).unwrap();

        let streamed = chunker.chunk_reader(&b"abc"[..], named("a.bin")).unwrap();
        assert_eq!(streamed.chunks().len(), 1);
        assert_eq!(streamed.chunks()[0].size(), 3);
        assert_eq!(streamed.merkle_root().hash(), Some(&digest(b"abc")));

        let buffered = chunker.chunk_bytes(b"abc".to_vec(), named("a.bin"));
        assert_eq!(buffered.chunks(), streamed.chunks());
        assert_eq!(buffered.merkle_root(), streamed.merkle_root());
    }

    #[test]
    fn test_sample_content() {
        let chunker = Chunker::new(10).unwrap();
        let meta = chunker.chunk_reader(SAMPLE, named("test.txt")).unwrap();

        assert_eq!(meta.size(), SAMPLE.len() as u64);
        assert_eq!(meta.filename(), "test.txt");
        assert_eq!(meta.mime_type(), "text/plain");

        let sizes: Vec<u64> = meta.chunks().iter().map(Chunk::size).collect();
        assert_eq!(sizes, vec![10, 10, 10, 10, 1]);
        let indices: Vec<u64> = meta.chunks().iter().map(Chunk::index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        assert_eq!(meta.chunks()[3].id().as_str(), "file_chunk_3");

        assert_eq!(
            meta.hash().to_string(),
            "0f5ab160925f8cb0c72b73ad1ce8c72f1b06392395e0e72a5f495045bee45d30"
        );
        assert_eq!(
            meta.chunks()[0].hash().to_string(),
            "00f1106159941c9235ab771844391e81085d2843f4948e719d2d359f6e0a4826"
        );
        assert_eq!(
            meta.merkle_root().to_string(),
            "b2dfb10e8c07e635da35e36b23de38a375b73ae07e3e7d2f96536ecf44bb1b98"
        );
    }

    #[test]
    fn test_empty_stream() {
        let meta = Chunker::new(10)
            .unwrap()
            .chunk_reader(io::empty(), named("empty.bin"))
            .unwrap();

        assert!(meta.chunks().is_empty());
        assert_eq!(meta.size(), 0);
        assert_eq!(meta.merkle_root(), &MerkleRoot::EMPTY);
        assert_eq!(meta.hash(), &digest(b""));
    }

    #[test]
    fn test_single_chunk_root_is_chunk_digest() {
        let meta = Chunker::new(64).unwrap().chunk_bytes(b"short".to_vec(), named("a"));
        assert_eq!(meta.chunks().len(), 1);
        assert_eq!(meta.merkle_root().hash(), Some(meta.chunks()[0].hash()));
    }

    #[test]
    fn test_exact_multiple_has_no_empty_tail() {
        let meta = Chunker::new(16).unwrap().chunk_bytes(vec![0xAB; 32], named("a"));
        assert_eq!(meta.chunks().len(), 2);
        assert!(meta.chunks().iter().all(|c| c.size() == 16));
    }

    #[test]
    fn test_chunk_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        let mut file = File::create(&path).unwrap();
        file.write_all(SAMPLE).unwrap();
        drop(file);

        let meta = Chunker::new(10).unwrap().chunk_file(&path).unwrap();
        assert_eq!(meta.filename(), "report.pdf");
        assert_eq!(meta.mime_type(), "application/pdf");
        assert_eq!(meta.chunks().len(), 5);
    }

    #[test]
    fn test_chunk_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = Chunker::default()
            .chunk_file(dir.path().join("absent.txt"))
            .unwrap_err();
        assert!(matches!(err, PrimitivesError::Io(_)));
    }

    proptest! {
        #[test]
        fn test_chunk_count_and_sizes(
            data in proptest::collection::vec(any::<u8>(), 0..3000),
            size in 1usize..300,
        ) {
            let meta = Chunker::new(size).unwrap().chunk_reader(data.as_slice(), named("p")).unwrap();
            let chunks = meta.chunks();

            prop_assert_eq!(chunks.len(), data.len().div_ceil(size));
            if let Some((last, body)) = chunks.split_last() {
                prop_assert!(body.iter().all(|c| c.size() == size as u64));
                prop_assert!(last.size() >= 1 && last.size() <= size as u64);
            }
            for (i, chunk) in chunks.iter().enumerate() {
                prop_assert_eq!(chunk.index(), i as u64);
            }
            prop_assert_eq!(meta.hash(), &digest(&data));
        }

        #[test]
        fn test_bytes_matches_reader(
            data in proptest::collection::vec(any::<u8>(), 0..3000),
            size in 1usize..300,
        ) {
            let chunker = Chunker::new(size).unwrap();
            let streamed = chunker.chunk_reader(data.as_slice(), named("p")).unwrap();
            let buffered = chunker.chunk_bytes(data.clone(), named("p"));

            prop_assert_eq!(streamed.chunks(), buffered.chunks());
            prop_assert_eq!(streamed.merkle_root(), buffered.merkle_root());
            prop_assert_eq!(streamed.hash(), buffered.hash());
            prop_assert_eq!(streamed.size(), buffered.size());
        }
    }
}
