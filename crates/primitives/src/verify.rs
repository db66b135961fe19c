//! Integrity verification
//!
//! [`verify`] recomputes the Merkle root from the digest recorded on each
//! chunk, in stored order, and compares it with the recorded root. It does
//! not look at payload bytes: a payload altered behind an unchanged digest
//! passes. That weaker contract is what audit consumers rely on today.
//! [`verify_payloads`] is the separate, stricter check that re-hashes every
//! attached payload.

use serde::Serialize;
use tracing::warn;

use crate::chunk::{ChunkId, FileId};
use crate::merkle::{MerkleRoot, build_root};
use crate::metadata::FileMetadata;

/// Recorded and recomputed roots of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    /// The file audited
    pub file_id: FileId,
    /// Root stored in the record
    pub recorded_root: MerkleRoot,
    /// Root recomputed from the recorded chunk digests
    pub computed_root: MerkleRoot,
}

impl IntegrityReport {
    /// Whether both roots agree
    pub fn is_valid(&self) -> bool {
        self.recorded_root == self.computed_root
    }
}

/// Chunks whose payload no longer matches the recorded digest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PayloadReport {
    /// Payload present, digest differs
    pub corrupt: Vec<ChunkId>,
    /// No payload attached, nothing to check
    pub missing: Vec<ChunkId>,
}

impl PayloadReport {
    /// Every chunk had a payload and every payload matched
    pub fn is_clean(&self) -> bool {
        self.corrupt.is_empty() && self.missing.is_empty()
    }
}

/// Recompute the root over the recorded chunk digests and compare.
pub fn audit(metadata: &FileMetadata) -> IntegrityReport {
    let computed_root = build_root(metadata.chunks().iter().map(|chunk| chunk.hash()));
    let report = IntegrityReport {
        file_id: metadata.id().clone(),
        recorded_root: *metadata.merkle_root(),
        computed_root,
    };

    if !report.is_valid() {
        warn!(
            file_id = %report.file_id,
            recorded = %report.recorded_root,
            computed = %report.computed_root,
            "merkle root mismatch"
        );
    }
    report
}

/// True when the recorded root matches the recorded chunk digests.
pub fn verify(metadata: &FileMetadata) -> bool {
    audit(metadata).is_valid()
}

/// Re-hash every attached payload against its recorded digest.
pub fn verify_payloads(metadata: &FileMetadata) -> PayloadReport {
    let mut report = PayloadReport::default();
    for chunk in metadata.chunks() {
        match chunk.payload_matches() {
            Some(true) => {}
            Some(false) => {
                warn!(chunk_id = %chunk.id(), "chunk payload does not match its digest");
                report.corrupt.push(chunk.id().clone());
            }
            None => report.missing.push(chunk.id().clone()),
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{Chunk, Chunker};
    use crate::hash::digest;
    use crate::metadata::FileDescriptor;
    use proptest::prelude::*;

    fn sample(data: &[u8], size: usize) -> FileMetadata {
        Chunker::new(size)
            .unwrap()
            .chunk_bytes(data.to_vec(), FileDescriptor::new("f.bin").with_id(FileId::new("f")))
    }

    #[test]
    fn test_fresh_metadata_verifies() {
        let meta = sample(b"This is a test file content for chunking.", 10);
        let report = audit(&meta);
        assert!(report.is_valid());
        assert_eq!(report.computed_root, *meta.merkle_root());
        assert!(verify(&meta));
        assert!(verify_payloads(&meta).is_clean());
    }

    #[test]
    fn test_empty_file_verifies() {
        assert!(verify(&sample(b"", 4)));
    }

    #[test]
    fn test_reordered_list_fails() {
        let meta = sample(b"0123456789abcdefghij", 5);
        let mut chunks = meta.chunks().to_vec();
        chunks.swap(0, 1);
        assert!(!verify(&meta.with_chunks(chunks)));
    }

    #[test]
    fn test_substituted_digest_fails() {
        let meta = sample(b"0123456789abcdefghij", 5);
        let mut chunks = meta.chunks().to_vec();
        let victim = &chunks[2];
        chunks[2] = Chunk::from_parts(
            victim.id().clone(),
            victim.index(),
            digest(b"forged"),
            victim.data().cloned().unwrap_or_default(),
        );
        assert!(!verify(&meta.with_chunks(chunks)));
    }

    #[test]
    fn test_wrong_recorded_root_fails() {
        let mut meta = sample(b"0123456789", 5);
        meta.merkle_root = MerkleRoot::new(digest(b"elsewhere"));
        let report = audit(&meta);
        assert!(!report.is_valid());
        assert_ne!(report.recorded_root, report.computed_root);
    }

    #[test]
    fn test_payload_tampering_passes_root_check() {
        let meta = sample(b"0123456789abcdefghij", 5);
        let mut chunks = meta.chunks().to_vec();
        chunks[1] = chunks[1].clone().with_payload(b"XXXXX".to_vec());
        let tampered = meta.with_chunks(chunks);

        assert!(verify(&tampered));

        let payloads = verify_payloads(&tampered);
        assert_eq!(payloads.corrupt, vec![ChunkId::new(&FileId::new("f"), 1)]);
        assert!(payloads.missing.is_empty());
    }

    #[test]
    fn test_descriptor_only_record() {
        let meta = sample(b"0123456789", 5);
        let record: FileMetadata =
            serde_json::from_str(&serde_json::to_string(&meta).unwrap()).unwrap();

        assert!(verify(&record));
        let payloads = verify_payloads(&record);
        assert_eq!(payloads.missing.len(), 2);
        assert!(!payloads.is_clean());
    }

    proptest! {
        #[test]
        fn test_self_consistency(data in proptest::collection::vec(any::<u8>(), 0..4096), size in 1usize..512) {
            prop_assert!(verify(&sample(&data, size)));
        }
    }
}
