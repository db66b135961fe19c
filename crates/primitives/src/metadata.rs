//! The file metadata record
//!
//! [`FileMetadata`] is produced once per chunking run and is read-only from
//! then on. Its serialized form is the record exchanged with collaborators:
//!
//! ```json
//! {
//!   "id": "…", "filename": "…", "size": 41, "mime_type": "text/plain",
//!   "hash": "…", "merkle_root": "…",
//!   "chunks": [{ "id": "…_chunk_0", "index": 0, "hash": "…", "size": 10 }],
//!   "uploaded_at": "2024-01-01T00:00:00Z", "user_id": "anonymous", "is_public": false
//! }
//! ```

use std::fs;
use std::path::Path;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::chunk::{Chunk, FileId};
use crate::error::Result;
use crate::hash::ContentHash;
use crate::merkle::MerkleRoot;
use crate::mime::detect_mime_type;

/// Owner recorded when none is supplied
pub const ANONYMOUS_USER: &str = "anonymous";

/// Descriptor of a chunked file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub(crate) id: FileId,
    pub(crate) filename: String,
    pub(crate) size: u64,
    pub(crate) mime_type: String,
    pub(crate) hash: ContentHash,
    pub(crate) merkle_root: MerkleRoot,
    pub(crate) chunks: Vec<Chunk>,
    #[serde(with = "rfc3339_seconds")]
    pub(crate) uploaded_at: DateTime<Utc>,
    pub(crate) user_id: String,
    pub(crate) is_public: bool,
}

impl FileMetadata {
    /// File identifier
    pub const fn id(&self) -> &FileId {
        &self.id
    }

    /// Original filename
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Total size in bytes
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Media type derived from the filename extension
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Digest of the whole stream
    pub const fn hash(&self) -> &ContentHash {
        &self.hash
    }

    /// Merkle root over the chunk digests
    pub const fn merkle_root(&self) -> &MerkleRoot {
        &self.merkle_root
    }

    /// Chunks in stored order
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Creation timestamp
    pub const fn uploaded_at(&self) -> &DateTime<Utc> {
        &self.uploaded_at
    }

    /// Owner identifier
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Visibility flag
    pub const fn is_public(&self) -> bool {
        self.is_public
    }

    /// Whether every chunk carries its payload
    pub fn has_payloads(&self) -> bool {
        self.chunks.iter().all(|chunk| chunk.data().is_some())
    }

    /// Replace the chunk list, e.g. after attaching payloads read from a cache.
    ///
    /// Everything else, including the recorded root, is kept as is.
    #[must_use]
    pub fn with_chunks(self, chunks: Vec<Chunk>) -> Self {
        Self { chunks, ..self }
    }
}

/// Caller-supplied attributes of a file about to be chunked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    id: Option<FileId>,
    filename: String,
    user_id: String,
    is_public: bool,
    uploaded_at: Option<DateTime<Utc>>,
}

impl FileDescriptor {
    /// Describe a file by name; owner is anonymous, visibility private.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            id: None,
            filename: filename.into(),
            user_id: ANONYMOUS_USER.to_owned(),
            is_public: false,
            uploaded_at: None,
        }
    }

    /// Describe a file on disk: its last path component and modification time.
    pub fn for_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let modified = fs::metadata(path)?.modified().ok();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut descriptor = Self::new(filename);
        descriptor.uploaded_at = modified.map(DateTime::<Utc>::from);
        Ok(descriptor)
    }

    /// Use a fixed file identifier instead of a random one
    #[must_use]
    pub fn with_id(mut self, id: FileId) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the owner
    #[must_use]
    pub fn owned_by(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    /// Set the visibility flag
    #[must_use]
    pub fn public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    /// Use a fixed timestamp instead of the current time
    #[must_use]
    pub fn uploaded_at(mut self, at: DateTime<Utc>) -> Self {
        self.uploaded_at = Some(at);
        self
    }

    /// The filename
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Resolve the file identifier, generating one if none was set
    pub(crate) fn resolve_id(&mut self) -> FileId {
        self.id.get_or_insert_with(FileId::generate).clone()
    }

    pub(crate) fn into_metadata(
        mut self,
        size: u64,
        hash: ContentHash,
        merkle_root: MerkleRoot,
        chunks: Vec<Chunk>,
    ) -> FileMetadata {
        let id = self.resolve_id();
        FileMetadata {
            id,
            mime_type: detect_mime_type(&self.filename).to_owned(),
            filename: self.filename,
            size,
            hash,
            merkle_root,
            chunks,
            uploaded_at: self.uploaded_at.unwrap_or_else(Utc::now).trunc_subsecs(0),
            user_id: self.user_id,
            is_public: self.is_public,
        }
    }
}

/// Timestamps travel as RFC 3339 with whole seconds, e.g. `2024-05-01T12:00:00Z`.
mod rfc3339_seconds {
    use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(
        at: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|at| at.with_timezone(&Utc).trunc_subsecs(0))
            .map_err(serde::de::Error::custom)
    }
}
