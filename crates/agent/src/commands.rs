//! Command implementations.
//!
//! Each command takes the resolved configuration and writes its human or
//! JSON output to the given sink, so the binary and the tests drive the same
//! code.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use nebula_primitives::merkle::build_root_from_hex;
use nebula_primitives::verify::{audit, verify_payloads};
use nebula_primitives::{Chunker, FileDescriptor, FileMetadata};
use nebula_store::{ChunkStore, ChunkStoreExt, FileStore};
use tracing::{info, warn};

use crate::config::AgentConfig;

/// Options for `chunk`.
#[derive(Debug, Default)]
pub(crate) struct ChunkOptions {
    /// Cache payloads in the local chunk store.
    pub(crate) save: bool,
    /// Owner recorded in the metadata.
    pub(crate) owner: Option<String>,
    /// Mark the file public.
    pub(crate) public: bool,
    /// Write the record here instead of `out`.
    pub(crate) record_path: Option<PathBuf>,
}

/// Chunk a file and emit its metadata record as JSON.
pub(crate) fn chunk(
    config: &AgentConfig,
    path: &Path,
    options: ChunkOptions,
    out: &mut dyn Write,
) -> Result<FileMetadata> {
    let size = fs::metadata(path)
        .with_context(|| format!("failed to stat {}", path.display()))?
        .len();
    if size > config.storage.max_file_size {
        bail!(
            "{} is {size} bytes, larger than the {} byte limit",
            path.display(),
            config.storage.max_file_size
        );
    }

    let mut descriptor = FileDescriptor::for_path(path)?.public(options.public);
    if let Some(owner) = options.owner {
        descriptor = descriptor.owned_by(owner);
    }

    let chunker = Chunker::new(config.storage.chunk_size)?;
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let metadata = chunker.chunk_reader(BufReader::new(file), descriptor)?;

    if options.save {
        let store = FileStore::new(&config.storage.data_dir)?;
        store.save_chunks(&metadata)?;
    }

    match options.record_path {
        Some(record_path) => {
            write_record(&metadata, &record_path)?;
            writeln!(out, "{}", record_path.display())?;
        }
        None => {
            serde_json::to_writer_pretty(&mut *out, &metadata)?;
            writeln!(out)?;
        }
    }

    info!(
        file_id = %metadata.id(),
        size = metadata.size(),
        chunks = metadata.chunks().len(),
        root = %metadata.merkle_root(),
        saved = options.save,
        "chunked file"
    );
    Ok(metadata)
}

/// Rebuild a file from a record and the local chunk store.
///
/// The bytes are staged under the temp directory and only moved to `output`
/// once their size and digest match the record.
pub(crate) fn assemble(config: &AgentConfig, record: &Path, output: &Path) -> Result<u64> {
    let metadata = read_record(record)?;
    let store = FileStore::new(&config.storage.data_dir)?;

    fs::create_dir_all(&config.storage.temp_dir)?;
    // Unique per run; removed on drop unless persisted
    let mut staged = tempfile::Builder::new()
        .prefix("assemble-")
        .suffix(".partial")
        .tempfile_in(&config.storage.temp_dir)
        .with_context(|| {
            format!("failed to stage under {}", config.storage.temp_dir.display())
        })?;

    let assembly = {
        let mut sink = BufWriter::new(staged.as_file_mut());
        let assembly = store.assemble_into(&metadata, &mut sink)?;
        sink.flush()?;
        assembly
    };

    if !assembly.matches(&metadata) {
        bail!(
            "assembled {} bytes with digest {}, record says {} bytes with digest {}",
            assembly.bytes_written,
            assembly.hash,
            metadata.size(),
            metadata.hash()
        );
    }

    if let Err(e) = staged.persist(output) {
        // Different filesystems
        fs::copy(e.file.path(), output)
            .with_context(|| format!("failed to write {}", output.display()))?;
    }

    info!(file_id = %metadata.id(), bytes = assembly.bytes_written, output = %output.display(), "assembled file");
    Ok(assembly.bytes_written)
}

/// Check a record's Merkle root, and optionally the cached payloads.
///
/// Returns whether everything checked out.
pub(crate) fn verify(
    config: &AgentConfig,
    record: &Path,
    payloads: bool,
    out: &mut dyn Write,
) -> Result<bool> {
    let metadata = read_record(record)?;
    let report = audit(&metadata);

    writeln!(out, "file:     {}", report.file_id)?;
    writeln!(out, "recorded: {}", report.recorded_root)?;
    writeln!(out, "computed: {}", report.computed_root)?;
    writeln!(out, "root:     {}", if report.is_valid() { "ok" } else { "MISMATCH" })?;

    let mut ok = report.is_valid();
    if payloads {
        let store = FileStore::new(&config.storage.data_dir)?;
        let cached = attach_cached(&store, metadata)?;
        let payload_report = verify_payloads(&cached);

        for id in &payload_report.corrupt {
            writeln!(out, "corrupt:  {id}")?;
        }
        for id in &payload_report.missing {
            writeln!(out, "missing:  {id}")?;
        }
        if !payload_report.is_clean() {
            warn!(
                corrupt = payload_report.corrupt.len(),
                missing = payload_report.missing.len(),
                "cached payloads do not match the record"
            );
        }
        ok &= payload_report.is_clean();
    }

    Ok(ok)
}

/// Fold hex digests into a Merkle root and print it.
pub(crate) fn root(digests: &[String], out: &mut dyn Write) -> Result<()> {
    let root = build_root_from_hex(digests)?;
    writeln!(out, "{root}")?;
    Ok(())
}

fn read_record(path: &Path) -> Result<FileMetadata> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse record {}", path.display()))
}

fn write_record(metadata: &FileMetadata, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, metadata)?;
    writer.flush()?;
    Ok(())
}

/// Attach whatever the store holds for each chunk, without verifying it.
fn attach_cached(store: &FileStore, metadata: FileMetadata) -> Result<FileMetadata> {
    let mut chunks = Vec::with_capacity(metadata.chunks().len());
    for chunk in metadata.chunks() {
        chunks.push(match store.get(chunk.id())? {
            Some(data) => chunk.clone().with_payload(data),
            None => chunk.clone(),
        });
    }
    Ok(metadata.with_chunks(chunks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    const SAMPLE: &[u8] = b"This is a test file content for chunking.";

    struct Workspace {
        dir: tempfile::TempDir,
        config: AgentConfig,
    }

    impl Workspace {
        fn new(chunk_size: usize) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let mut config = AgentConfig::default()
                .with_overrides(Some(chunk_size), Some(dir.path().join("data")));
            config.storage.temp_dir = dir.path().join("temp");
            Self { dir, config }
        }

        fn file(&self, name: &str, content: &[u8]) -> PathBuf {
            let path = self.dir.path().join(name);
            fs::write(&path, content).unwrap();
            path
        }

        fn chunk_saved(&self, input: &Path) -> (FileMetadata, PathBuf) {
            let record = self.dir.path().join("record.json");
            let options = ChunkOptions {
                save: true,
                record_path: Some(record.clone()),
                ..Default::default()
            };
            let meta = chunk(&self.config, input, options, &mut io::sink()).unwrap();
            (meta, record)
        }
    }

    #[test]
    fn test_chunk_prints_record() {
        let ws = Workspace::new(10);
        let input = ws.file("test.txt", SAMPLE);

        let mut out: Vec<u8> = Vec::new();
        let options = ChunkOptions {
            owner: Some("alice".into()),
            public: true,
            ..Default::default()
        };
        let meta = chunk(&ws.config, &input, options, &mut out).unwrap();

        let printed: FileMetadata = serde_json::from_slice(&out).unwrap();
        assert_eq!(printed.id(), meta.id());
        assert_eq!(printed.chunks().len(), 5);
        assert_eq!(printed.user_id(), "alice");
        assert!(printed.is_public());
        assert_eq!(printed.filename(), "test.txt");
        assert_eq!(printed.mime_type(), "text/plain");
        assert_eq!(
            printed.merkle_root().to_string(),
            "b2dfb10e8c07e635da35e36b23de38a375b73ae07e3e7d2f96536ecf44bb1b98"
        );
    }

    #[test]
    fn test_chunk_rejects_oversized_file() {
        let mut ws = Workspace::new(10);
        ws.config.storage.max_file_size = 8;
        let input = ws.file("big.bin", SAMPLE);

        let err = chunk(&ws.config, &input, ChunkOptions::default(), &mut io::sink()).unwrap_err();
        assert!(err.to_string().contains("limit"));
    }

    #[test]
    fn test_assemble_roundtrip() {
        let ws = Workspace::new(7);
        let input = ws.file("doc.pdf", SAMPLE);
        let (meta, record) = ws.chunk_saved(&input);

        let output = ws.dir.path().join("rebuilt.pdf");
        let written = assemble(&ws.config, &record, &output).unwrap();

        assert_eq!(written, meta.size());
        assert_eq!(fs::read(&output).unwrap(), SAMPLE);
        assert_eq!(fs::read_dir(&ws.config.storage.temp_dir).unwrap().count(), 0);
    }

    #[test]
    fn test_assemble_same_file_name_does_not_share_staging() {
        let ws = Workspace::new(7);
        let input = ws.file("doc.bin", SAMPLE);
        let (_, record) = ws.chunk_saved(&input);

        // Another run targeting a different directory but the same name
        fs::create_dir_all(&ws.config.storage.temp_dir).unwrap();
        let foreign = ws.config.storage.temp_dir.join("out.bin.partial");
        fs::write(&foreign, b"in flight").unwrap();

        for dir in ["a", "b"] {
            let target = ws.dir.path().join(dir);
            fs::create_dir_all(&target).unwrap();
            let output = target.join("out.bin");
            assemble(&ws.config, &record, &output).unwrap();
            assert_eq!(fs::read(&output).unwrap(), SAMPLE);
        }

        assert_eq!(fs::read(&foreign).unwrap(), b"in flight");
        assert_eq!(fs::read_dir(&ws.config.storage.temp_dir).unwrap().count(), 1);
    }

    #[test]
    fn test_assemble_missing_chunk_leaves_no_output() {
        let ws = Workspace::new(7);
        let input = ws.file("doc.bin", SAMPLE);
        let (meta, record) = ws.chunk_saved(&input);
        FileStore::new(&ws.config.storage.data_dir)
            .unwrap()
            .delete(meta.chunks()[3].id())
            .unwrap();

        let output = ws.dir.path().join("rebuilt.bin");
        assert!(assemble(&ws.config, &record, &output).is_err());
        assert!(!output.exists());
        assert_eq!(fs::read_dir(&ws.config.storage.temp_dir).unwrap().count(), 0);
    }

    #[test]
    fn test_verify_detects_tampered_cache() {
        let ws = Workspace::new(10);
        let input = ws.file("notes.md", SAMPLE);
        let (meta, record) = ws.chunk_saved(&input);

        let mut out: Vec<u8> = Vec::new();
        assert!(verify(&ws.config, &record, true, &mut out).unwrap());

        let store = FileStore::new(&ws.config.storage.data_dir).unwrap();
        fs::write(store.chunk_path(meta.chunks()[2].id()).unwrap(), b"tampered!!").unwrap();

        // The root check alone trusts the recorded digests
        assert!(verify(&ws.config, &record, false, &mut io::sink()).unwrap());

        let mut out: Vec<u8> = Vec::new();
        assert!(!verify(&ws.config, &record, true, &mut out).unwrap());
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(&format!("corrupt:  {}", meta.chunks()[2].id())));
    }

    #[test]
    fn test_verify_detects_edited_record() {
        let ws = Workspace::new(10);
        let input = ws.file("notes.md", SAMPLE);
        let (_, record) = ws.chunk_saved(&input);

        let text = fs::read_to_string(&record).unwrap();
        let edited = text.replace(
            "b2dfb10e8c07e635da35e36b23de38a375b73ae07e3e7d2f96536ecf44bb1b98",
            "58c89d709329eb37285837b042ab6ff72c7c8f74de0446b091b6a0131c102cfd",
        );
        fs::write(&record, edited).unwrap();

        let mut out: Vec<u8> = Vec::new();
        assert!(!verify(&ws.config, &record, false, &mut out).unwrap());
        assert!(String::from_utf8(out).unwrap().contains("MISMATCH"));
    }

    #[test]
    fn test_root_command() {
        let digests = [
            "ca978112ca1bbdcafac231b39a23dc4da786eff8147c4e72b9807785afee48bb",
            "3e23e8160039594a33894f6564e1b1348bbd7a0088d42c4acb73eeaed59c009d",
            "2e7d2c03a9507ae265ecf5b5356885a53393a2029d241394997265a1a25aefc6",
            "18ac3e7343f016890c510e93f935261169d9e3f565436429830faf0934f4f8e4",
        ]
        .map(String::from);

        let mut out: Vec<u8> = Vec::new();
        root(&digests, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "58c89d709329eb37285837b042ab6ff72c7c8f74de0446b091b6a0131c102cfd\n"
        );

        let mut out: Vec<u8> = Vec::new();
        root(&[], &mut out).unwrap();
        assert_eq!(out, b"\n");

        assert!(root(&["XYZ".to_string()], &mut io::sink()).is_err());
    }
}
