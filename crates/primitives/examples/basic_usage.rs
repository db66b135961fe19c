//! Basic usage example for the primitives crate

use nebula_primitives::{Chunker, FileDescriptor, assemble, error::Result, verify};

fn main() -> Result<()> {
    // Create some test data
    let data = b"This is a test file content for chunking.";

    // Split it into 10-byte chunks
    println!("Chunking {} bytes...", data.len());
    let chunker = Chunker::new(10)?;
    let metadata = chunker.chunk_reader(&data[..], FileDescriptor::new("test.txt"))?;
    for chunk in metadata.chunks() {
        println!("  {chunk}");
    }
    println!("File hash:   {}", metadata.hash());
    println!("Merkle root: {}", metadata.merkle_root());

    // Verify the record
    println!("Verifying chunk list integrity...");
    assert!(verify::verify(&metadata));

    // Put the file back together
    let mut rebuilt = Vec::new();
    let written = assemble::assemble(&metadata, &mut rebuilt)?;
    println!("Reassembled {written} bytes");
    assert_eq!(rebuilt, data);

    Ok(())
}
