//! Storage backend abstraction for `KeyNest`.
//!
//! This crate defines the [`StorageBackend`] trait, a plain key-value
//! interface for the small amount of client-local state `KeyNest` keeps
//! (the plan flag and other preferences). It knows nothing about plans,
//! API keys, or encryption.
//!
//! Two implementations are provided:
//!
//! - [`RedbBackend`] — durable single-file store on redb (feature `redb-backend`)
//! - [`MemoryBackend`] — in-memory, for tests and throwaway sessions

mod error;
mod memory;
#[cfg(feature = "redb-backend")]
mod redb_backend;

pub use error::StorageError;
pub use memory::MemoryBackend;
#[cfg(feature = "redb-backend")]
pub use redb_backend::RedbBackend;

/// A pluggable key-value slot store.
///
/// Keys are UTF-8 strings using `/` as a separator (e.g. `keynest/plan`).
/// Values are opaque byte arrays. Slots are only ever read or overwritten.
///
/// Implementations must be safe to share across async tasks (`Send + Sync`).
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Retrieve a value by key.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the underlying backend fails.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Store a key-value pair, overwriting any existing value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Write`] if the underlying backend fails.
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;
}
