//! File and chunk identifiers
//!
//! A file identifier is an opaque token (a random UUID when generated here).
//! A chunk identifier is derived from its parent: `{file_id}_chunk_{index}`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

const CHUNK_SEPARATOR: &str = "_chunk_";

/// Opaque identifier of a chunked file
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    /// Wrap an existing token
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The identifier as text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identifier of a chunk, unique across files
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkId(String);

impl ChunkId {
    /// Derive the identifier of chunk `index` of `file`
    pub fn new(file: &FileId, index: u64) -> Self {
        Self(format!("{file}{CHUNK_SEPARATOR}{index}"))
    }

    /// The identifier as text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into parent file id and index, if the identifier is well formed
    pub fn parts(&self) -> Option<(FileId, u64)> {
        let (file, index) = self.0.rsplit_once(CHUNK_SEPARATOR)?;
        if file.is_empty() || index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some((FileId::new(file), index.parse().ok()?))
    }

    /// The parent file identifier
    pub fn file_id(&self) -> Option<FileId> {
        self.parts().map(|(file, _)| file)
    }

    /// The index encoded in the identifier
    pub fn index(&self) -> Option<u64> {
        self.parts().map(|(_, index)| index)
    }

    /// True when the identifier can be used verbatim as a single path component.
    pub fn is_path_safe(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ChunkId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = Self(s.to_owned());
        match id.parts() {
            Some(_) => Ok(id),
            None => Err(ValidationError::MalformedChunkId(s.to_owned())),
        }
    }
}
