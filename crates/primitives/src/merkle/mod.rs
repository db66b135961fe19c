//! Merkle root over an ordered list of chunk digests.
//!
//! The fold works level by level, left to right. Each adjacent pair is
//! combined by hashing the concatenation of the two digests' lowercase hex
//! text (not their raw bytes). An odd element at the end of a level is
//! carried forward to the next level unchanged rather than paired with
//! itself. Both rules are part of the external format: roots recorded by
//! other parties depend on them bit for bit.

pub mod builder;
pub mod root;

pub use builder::{build_levels, build_root, build_root_from_hex, combine};
pub use root::MerkleRoot;
