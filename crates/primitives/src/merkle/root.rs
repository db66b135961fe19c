//! The Merkle root value and its empty sentinel

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;
use crate::hash::ContentHash;

/// Root of the chunk-digest fold.
///
/// An empty digest list has no root; its text form is the empty string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MerkleRoot(Option<ContentHash>);

impl MerkleRoot {
    /// The sentinel for zero chunks
    pub const EMPTY: Self = Self(None);

    /// Wrap a computed root
    pub const fn new(hash: ContentHash) -> Self {
        Self(Some(hash))
    }

    /// Whether this is the empty sentinel
    pub const fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// The root digest, if any
    pub const fn hash(&self) -> Option<&ContentHash> {
        self.0.as_ref()
    }
}

impl From<ContentHash> for MerkleRoot {
    fn from(hash: ContentHash) -> Self {
        Self::new(hash)
    }
}

impl From<Option<ContentHash>> for MerkleRoot {
    fn from(hash: Option<ContentHash>) -> Self {
        Self(hash)
    }
}

impl fmt::Display for MerkleRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(hash) => fmt::Display::fmt(hash, f),
            None => Ok(()),
        }
    }
}

impl FromStr for MerkleRoot {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::EMPTY);
        }
        s.parse().map(Self::new)
    }
}

impl Serialize for MerkleRoot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MerkleRoot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
