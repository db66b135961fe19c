//! Remote collaborators.
//!
//! A chunked file leaves the node through two doors: every chunk payload is
//! uploaded to an external [`ObjectStore`], and the file digest plus Merkle
//! root are recorded with a [`Notary`]. Both are plain traits so a real
//! network client can slot in; the in-memory implementations here stand in
//! for them in tests and offline runs.

use std::collections::HashMap;

use bytes::Bytes;
use nebula_primitives::assemble::ordered_chunks;
use nebula_primitives::hash::digest;
use nebula_primitives::{ChunkId, ContentHash, FileId, FileMetadata, MerkleRoot, PrimitivesError};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::error::Result;

/// Where an uploaded chunk ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    /// The chunk uploaded
    pub chunk_id: ChunkId,
    /// Address the object store assigned to the payload
    pub address: String,
}

/// What gets recorded for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotaryRecord {
    /// The file recorded
    pub file_id: FileId,
    /// Original file name
    pub filename: String,
    /// Total size in bytes
    pub size: u64,
    /// Whole-file digest
    pub file_hash: ContentHash,
    /// Root over the chunk digests
    pub merkle_root: MerkleRoot,
}

impl From<&FileMetadata> for NotaryRecord {
    fn from(metadata: &FileMetadata) -> Self {
        Self {
            file_id: metadata.id().clone(),
            filename: metadata.filename().to_owned(),
            size: metadata.size(),
            file_hash: *metadata.hash(),
            merkle_root: *metadata.merkle_root(),
        }
    }
}

/// Proof that a record was accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotaryReceipt {
    /// The record as accepted
    pub record: NotaryRecord,
    /// Reference returned by the notary
    pub reference: String,
}

/// External content-addressed object storage.
pub trait ObjectStore: Send + Sync {
    /// Upload one chunk payload, returning its address.
    fn upload(&self, id: &ChunkId, data: &Bytes) -> Result<String>;
}

/// External ledger recording file digests and Merkle roots.
pub trait Notary: Send + Sync {
    /// Record a file, returning a receipt.
    fn notarize(&self, record: NotaryRecord) -> Result<NotaryReceipt>;
}

/// Everything [`publish`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    /// One receipt per chunk, in index order
    pub uploads: Vec<UploadReceipt>,
    /// The notary's receipt
    pub receipt: NotaryReceipt,
}

/// Upload every chunk of `metadata` in index order, then notarize the file.
///
/// The record must carry payloads; hydrate it from a chunk store first if
/// it was loaded from disk. Chunks uploaded before a failure stay uploaded.
pub fn publish<O, N>(metadata: &FileMetadata, objects: &O, notary: &N) -> Result<PublishReport>
where
    O: ObjectStore + ?Sized,
    N: Notary + ?Sized,
{
    let chunks = ordered_chunks(metadata)?;
    let mut uploads = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        let payload = chunk.payload().map_err(PrimitivesError::from)?;
        let address = objects.upload(chunk.id(), payload)?;
        debug!(chunk_id = %chunk.id(), %address, "uploaded chunk");
        uploads.push(UploadReceipt {
            chunk_id: chunk.id().clone(),
            address,
        });
    }

    let receipt = notary.notarize(NotaryRecord::from(metadata))?;
    info!(
        file_id = %metadata.id(),
        chunks = uploads.len(),
        reference = %receipt.reference,
        "published file"
    );

    Ok(PublishReport { uploads, receipt })
}

/// Object store that keeps payloads in memory, addressed by their digest.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, Bytes>>,
}

impl MemoryObjectStore {
    /// Create an empty object store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a payload by the address [`ObjectStore::upload`] returned.
    pub fn fetch(&self, address: &str) -> Option<Bytes> {
        self.objects.read().get(address).cloned()
    }

    /// Number of distinct objects held
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    /// Whether nothing has been uploaded
    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn upload(&self, _id: &ChunkId, data: &Bytes) -> Result<String> {
        let address = digest(data).to_hex();
        self.objects
            .write()
            .entry(address.clone())
            .or_insert_with(|| data.clone());
        Ok(address)
    }
}

/// Notary that appends records to an in-memory log.
#[derive(Debug, Default)]
pub struct MemoryNotary {
    records: Mutex<Vec<NotaryRecord>>,
}

impl MemoryNotary {
    /// Create an empty notary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record accepted so far, oldest first
    pub fn records(&self) -> Vec<NotaryRecord> {
        self.records.lock().clone()
    }

    /// The latest record for `file_id`, if any
    pub fn lookup(&self, file_id: &FileId) -> Option<NotaryRecord> {
        self.records
            .lock()
            .iter()
            .rev()
            .find(|record| &record.file_id == file_id)
            .cloned()
    }
}

impl Notary for MemoryNotary {
    fn notarize(&self, record: NotaryRecord) -> Result<NotaryReceipt> {
        let mut records = self.records.lock();
        let sequence = records.len();
        let reference = digest(format!(
            "{sequence}:{}:{}:{}",
            record.file_id, record.file_hash, record.merkle_root
        ))
        .to_hex();

        records.push(record.clone());
        Ok(NotaryReceipt { record, reference })
    }
}
