//! Iterative Merkle fold with carry-forward of unpaired nodes

use std::borrow::Borrow;

use crate::error::Result;
use crate::hash::{ContentHash, StreamHasher};

use super::root::MerkleRoot;

/// Combine two sibling digests into their parent.
///
/// The parent is the digest of `hex(left) ++ hex(right)`, i.e. 128 ASCII
/// bytes, not of the 64 raw digest bytes.
#[inline]
pub fn combine(left: &ContentHash, right: &ContentHash) -> ContentHash {
    let mut hasher = StreamHasher::default();
    hasher.update(left.to_hex().as_bytes());
    hasher.update(right.to_hex().as_bytes());
    hasher.finalize()
}

/// Fold an ordered digest list into its root.
///
/// - no digests: [`MerkleRoot::EMPTY`]
/// - one digest: that digest, unhashed
/// - otherwise: pairwise levels until one value remains
pub fn build_root<I>(digests: I) -> MerkleRoot
where
    I: IntoIterator,
    I::Item: Borrow<ContentHash>,
{
    let mut level: Vec<ContentHash> = digests.into_iter().map(|h| *h.borrow()).collect();
    while level.len() > 1 {
        fold_level(&mut level);
    }
    MerkleRoot::from(level.pop())
}

/// Parse hex digests, then fold them.
///
/// Fails with a validation error on the first malformed digest.
pub fn build_root_from_hex<I>(digests: I) -> Result<MerkleRoot>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let parsed = digests
        .into_iter()
        .map(|s| s.as_ref().parse::<ContentHash>())
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(build_root(parsed))
}

/// Every level of the fold, leaves first and root last.
///
/// Returns no levels for an empty input.
pub fn build_levels<I>(digests: I) -> Vec<Vec<ContentHash>>
where
    I: IntoIterator,
    I::Item: Borrow<ContentHash>,
{
    let mut level: Vec<ContentHash> = digests.into_iter().map(|h| *h.borrow()).collect();
    if level.is_empty() {
        return Vec::new();
    }

    let mut levels = vec![level.clone()];
    while level.len() > 1 {
        fold_level(&mut level);
        levels.push(level.clone());
    }
    levels
}

/// Replace `level` by the next level up, reusing its buffer.
///
/// Slot `i` of the next level is written only after slots `2i` and `2i + 1`
/// have been read, so the fold can run in place.
fn fold_level(level: &mut Vec<ContentHash>) {
    let len = level.len();
    let mut write = 0;
    let mut read = 0;

    while read < len {
        level[write] = if read + 1 < len {
            combine(&level[read], &level[read + 1])
        } else {
            // Unpaired: carried forward, not hashed with itself
            level[read]
        };
        write += 1;
        read += 2;
    }

    level.truncate(write);
}
