//! Digest engine
//!
//! This module provides the [`ContentHash`] type, a 32-byte SHA-256 digest
//! whose canonical text form is 64 lowercase hex characters, together with
//! the functions that compute it over buffers and streams.
//!
//! ## Example Usage
//!
//! ```
//! use nebula_primitives::hash::{digest, stream_digest};
//!
//! let data = b"hello world";
//! let direct = digest(data);
//! let streamed = stream_digest(&data[..]).unwrap();
//!
//! assert_eq!(direct, streamed);
//! assert_eq!(
//!     direct.to_string(),
//!     "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
//! );
//! ```

use std::fmt;
use std::io::{self, Read, Write};
use std::ops::Deref;
use std::str::FromStr;

use alloy_primitives::{B256, hex};
use digest::{Digest, Output};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::Sha256;

use crate::error::{Result, ValidationError};

/// Digest size in bytes (SHA-256)
pub const HASH_SIZE: usize = 32;

/// Length of the hex text form of a digest
pub const HASH_HEX_LENGTH: usize = HASH_SIZE * 2;

/// The hash function behind every digest in this crate
pub type DigestEngine = Sha256;

/// A 256-bit content digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash(B256);

impl ContentHash {
    /// Creates a new hash from raw bytes
    pub fn new(bytes: [u8; HASH_SIZE]) -> Self {
        Self(B256::from(bytes))
    }

    /// Returns the underlying bytes
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }

    /// Lowercase hex encoding, the form used on the wire and inside the Merkle fold
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    fn from_output(output: Output<DigestEngine>) -> Self {
        Self(B256::from_slice(output.as_slice()))
    }
}

impl From<B256> for ContentHash {
    fn from(value: B256) -> Self {
        Self(value)
    }
}

impl From<ContentHash> for B256 {
    fn from(value: ContentHash) -> Self {
        value.0
    }
}

impl Deref for ContentHash {
    type Target = B256;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ContentHash {
    type Err = ValidationError;

    /// Parses exactly 64 lowercase hex characters.
    ///
    /// Uppercase and `0x`-prefixed forms are rejected: the Merkle fold hashes
    /// digest text, so two spellings of one digest would yield two roots.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.len() != HASH_HEX_LENGTH {
            return Err(ValidationError::malformed_digest(
                s,
                "expected 64 hex characters",
            ));
        }
        if !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(ValidationError::malformed_digest(
                s,
                "expected lowercase hex characters only",
            ));
        }
        let bytes = hex::decode_to_array::<_, HASH_SIZE>(s)
            .map_err(|_| ValidationError::malformed_digest(s, "invalid hex"))?;
        Ok(Self::new(bytes))
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Hashes a buffer.
#[must_use]
pub fn digest(data: impl AsRef<[u8]>) -> ContentHash {
    ContentHash::from_output(DigestEngine::digest(data.as_ref()))
}

/// Hashes a stream incrementally without holding it in memory.
///
/// A read failure is returned as is; no partial digest is ever produced.
pub fn stream_digest(mut reader: impl Read) -> Result<ContentHash> {
    let mut writer = HashingWriter::new(io::sink());
    io::copy(&mut reader, &mut writer)?;
    let (_, hash) = writer.finish();
    Ok(hash)
}

/// A writer that hashes everything it forwards to an inner writer.
///
/// Only bytes the inner writer accepted are hashed, so the digest always
/// describes what actually reached the sink.
#[derive(Debug)]
pub struct HashingWriter<W> {
    inner: W,
    hasher: DigestEngine,
    written: u64,
}

impl<W: Write> HashingWriter<W> {
    /// Wrap a writer
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: DigestEngine::new(),
            written: 0,
        }
    }

    /// Number of bytes forwarded so far
    pub const fn written(&self) -> u64 {
        self.written
    }

    /// Consume the writer, returning the inner writer and the digest of the bytes written
    pub fn finish(self) -> (W, ContentHash) {
        (self.inner, ContentHash::from_output(self.hasher.finalize()))
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        Digest::update(&mut self.hasher, &buf[..n]);
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Incremental hasher for callers that feed data window by window.
#[derive(Debug, Clone, Default)]
pub(crate) struct StreamHasher {
    hasher: DigestEngine,
    total: u64,
}

impl StreamHasher {
    pub(crate) fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.hasher, data);
        self.total += data.len() as u64;
    }

    pub(crate) const fn total(&self) -> u64 {
        self.total
    }

    pub(crate) fn finalize(self) -> ContentHash {
        ContentHash::from_output(self.hasher.finalize())
    }
}
