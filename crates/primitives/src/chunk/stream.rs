//! Lazy chunking of a byte stream
//!
//! [`ChunkStream`] reads one window at a time and yields each chunk as soon
//! as it is complete, so peak memory is one window rather than the whole
//! input. The whole-stream digest is accumulated alongside and reported by
//! [`ChunkStream::finish`].

use std::io::{self, Read};

use crate::error::Result;
use crate::hash::{ContentHash, StreamHasher};

use super::content::Chunk;
use super::id::FileId;

/// Upper bound on the buffer reserved before a window is read
const MAX_WINDOW_RESERVE: usize = 64 * 1024;

/// Totals reported once a stream has been fully consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSummary {
    /// Number of bytes read
    pub size: u64,
    /// Digest of every byte read
    pub hash: ContentHash,
    /// Number of chunks produced
    pub chunks: u64,
}

/// Iterator over the fixed-size chunks of a reader.
///
/// The first read failure is yielded as an error and ends the iteration.
#[derive(Debug)]
pub struct ChunkStream<R> {
    reader: R,
    chunk_size: usize,
    file_id: FileId,
    next_index: u64,
    file_hasher: StreamHasher,
    state: State,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Reading,
    Exhausted,
    Failed,
}

impl<R: Read> ChunkStream<R> {
    pub(crate) fn new(reader: R, chunk_size: usize, file_id: FileId) -> Self {
        Self {
            reader,
            chunk_size,
            file_id,
            next_index: 0,
            file_hasher: StreamHasher::default(),
            state: State::Reading,
        }
    }

    /// Identifier of the file being chunked
    pub const fn file_id(&self) -> &FileId {
        &self.file_id
    }

    /// Consume the remaining input and report the totals.
    ///
    /// Chunks not yet pulled from the iterator are read and discarded. Fails
    /// if any read failed, so a digest of a partial stream is never returned.
    pub fn finish(mut self) -> Result<StreamSummary> {
        for chunk in self.by_ref() {
            chunk?;
        }
        if self.state == State::Failed {
            return Err(io::Error::other("chunk stream aborted by an earlier read failure").into());
        }

        Ok(StreamSummary {
            size: self.file_hasher.total(),
            hash: self.file_hasher.finalize(),
            chunks: self.next_index,
        })
    }

    /// Fill one window, stopping early only at end of input.
    ///
    /// The buffer grows with the bytes actually read, so a huge chunk size
    /// over a small input costs only the input.
    fn read_window(&mut self) -> io::Result<Vec<u8>> {
        let limit = u64::try_from(self.chunk_size).unwrap_or(u64::MAX);
        let mut buf = Vec::with_capacity(self.chunk_size.min(MAX_WINDOW_RESERVE));
        (&mut self.reader).take(limit).read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl<R: Read> Iterator for ChunkStream<R> {
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state != State::Reading {
            return None;
        }

        let window = match self.read_window() {
            Ok(window) => window,
            Err(e) => {
                self.state = State::Failed;
                return Some(Err(e.into()));
            }
        };

        if window.is_empty() {
            self.state = State::Exhausted;
            return None;
        }
        if window.len() < self.chunk_size {
            // A short window can only come from end of input
            self.state = State::Exhausted;
        }

        self.file_hasher.update(&window);
        let chunk = Chunk::new(&self.file_id, self.next_index, window);
        self.next_index += 1;
        Some(Ok(chunk))
    }
}
