//! File-based chunk cache.
//!
//! Stores one flat file per chunk at `{data_dir}/chunks/{chunk_id}`.
//!
//! Writes go straight to the final path with no temp-file-and-rename step,
//! so a crash mid-write can leave a truncated blob behind. Readers that care
//! should go through [`crate::ChunkStoreExt::load_verified`].

use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use nebula_primitives::ChunkId;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::traits::ChunkStore;

/// Name of the blob directory under the data directory
pub const CHUNKS_DIR: &str = "chunks";

/// File-based chunk store with a flat directory layout.
#[derive(Debug, Clone)]
pub struct FileStore {
    chunks_dir: PathBuf,
}

impl FileStore {
    /// Create a new file store rooted at the given data directory.
    ///
    /// The `chunks` subdirectory is created if it does not exist.
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        let chunks_dir = data_dir.as_ref().join(CHUNKS_DIR);
        std::fs::create_dir_all(&chunks_dir)?;
        Ok(Self { chunks_dir })
    }

    /// Directory holding the chunk blobs
    pub fn chunks_dir(&self) -> &Path {
        &self.chunks_dir
    }

    /// Compute the full file path for a chunk ID.
    ///
    /// Ids that are not a single safe path component are refused.
    pub fn chunk_path(&self, id: &ChunkId) -> Result<PathBuf> {
        if !id.is_path_safe() {
            return Err(StoreError::InvalidKey(id.clone()));
        }
        Ok(self.chunks_dir.join(id.as_str()))
    }
}

impl ChunkStore for FileStore {
    fn put(&self, id: &ChunkId, data: &Bytes) -> Result<()> {
        let path = self.chunk_path(id)?;
        std::fs::write(&path, data)?;

        debug!(%id, path = %path.display(), size = data.len(), "stored chunk to file");
        Ok(())
    }

    fn get(&self, id: &ChunkId) -> Result<Option<Bytes>> {
        let path = self.chunk_path(id)?;
        match std::fs::read(&path) {
            Ok(data) => {
                debug!(%id, size = data.len(), "read chunk from file");
                Ok(Some(Bytes::from(data)))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn contains(&self, id: &ChunkId) -> Result<bool> {
        let path = self.chunk_path(id)?;
        match std::fs::metadata(&path) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn delete(&self, id: &ChunkId) -> Result<bool> {
        let path = self.chunk_path(id)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(%id, "deleted chunk file");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}
