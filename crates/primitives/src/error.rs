//! Error types for the nebula-primitives crate
//!
//! This module provides error types and helper functions for handling
//! errors that occur in various components of the crate.
//!
//! ## Error Structure
//!
//! The crate uses a two-level error hierarchy:
//!
//! - `PrimitivesError`: The top-level error type that wraps all other errors
//! - Component-specific errors: More detailed errors from specific subsystems
//!   (like `ValidationError` and `ChunkError`)
//!
//! Integrity mismatches are deliberately absent: verification reports them as
//! values ([`crate::verify::IntegrityReport`]) and leaves the disposition to
//! the caller.
//!
//! ## Example Usage
//!
//! ```
//! use nebula_primitives::error::{PrimitivesError, Result};
//! use nebula_primitives::Chunker;
//!
//! fn handle_errors() {
//!     match Chunker::new(0) {
//!         Ok(_) => println!("Chunker created"),
//!         Err(e) => match e {
//!             PrimitivesError::Validation(err) => println!("Rejected: {}", err),
//!             PrimitivesError::Chunk(err) => println!("Chunk error: {}", err),
//!             _ => println!("Other error: {}", e),
//!         },
//!     }
//! }
//! ```

use thiserror::Error;

/// Result type for operations in the primitives crate
pub type Result<T> = std::result::Result<T, PrimitivesError>;

/// Main error type for the primitives crate
///
/// This enum represents all the possible errors that can occur when using
/// the nebula-primitives crate. It wraps component-specific errors like
/// `ValidationError` and `ChunkError` to provide a unified error interface.
#[derive(Error, Debug)]
pub enum PrimitivesError {
    /// Invalid parameters, raised before any I/O takes place
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Errors from chunk operations
    #[error(transparent)]
    Chunk(#[from] crate::chunk::ChunkError),

    /// Input/output errors from the underlying stream or sink
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rejected parameters.
///
/// These are never retried: the same input always fails the same way.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Chunk size must be strictly positive
    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,

    /// A digest string is not 64 lowercase hex characters
    #[error("malformed digest {value:?}: {reason}")]
    MalformedDigest {
        /// The offending input.
        value: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// A chunk identifier does not follow `{file_id}_chunk_{index}`
    #[error("malformed chunk id: {0:?}")]
    MalformedChunkId(String),
}

impl ValidationError {
    pub(crate) fn malformed_digest(value: impl Into<String>, reason: &'static str) -> Self {
        Self::MalformedDigest {
            value: value.into(),
            reason,
        }
    }
}
