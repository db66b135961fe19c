//! Chunk storage for nebula.
//!
//! Defines the [`ChunkStore`] trait for caching chunk payloads by id, with
//! two backends:
//!
//! - [`FileStore`]: one flat file per chunk under `{data_dir}/chunks`.
//! - [`MemoryStore`]: a `RwLock<HashMap>`, for tests and throwaway runs.
//!
//! Integrity checks on the way out of a store live in [`ChunkStoreExt`].
//! The [`remote`] module holds the interfaces to the external object store
//! and notary, plus [`remote::publish`].

mod error;
mod file_store;
mod memory_store;
pub mod remote;
mod traits;

pub use error::{Result, StoreError};
pub use file_store::{CHUNKS_DIR, FileStore};
pub use memory_store::MemoryStore;
pub use remote::{MemoryNotary, MemoryObjectStore, Notary, ObjectStore, publish};
pub use traits::{ChunkStore, ChunkStoreExt};
