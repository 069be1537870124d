//! In-memory slot store.
//!
//! Nothing survives the process. Used by tests, by `KEYNEST_STORAGE=memory`
//! sessions, and as the fallback when the durable store cannot be opened.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{StorageBackend, StorageError};

/// Slots held in a shared `HashMap`.
///
/// Clones share the same map, so a clone handed to one component observes
/// writes made through another.
///
/// # Examples
///
/// ```
/// # use keynest_storage::{MemoryBackend, StorageBackend};
/// # #[tokio::main]
/// # async fn main() {
/// let backend = MemoryBackend::new();
/// backend.put("keynest/plan", b"pro").await.unwrap();
/// assert_eq!(backend.get("keynest/plan").await.unwrap(), Some(b"pro".to_vec()));
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    slots: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.slots.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.slots
            .write()
            .await
            .insert(key.to_owned(), value.to_vec());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unset_slot_reads_none() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.get("keynest/plan").await.unwrap(), None);
    }

    #[tokio::test]
    async fn put_overwrites_previous_value() {
        let backend = MemoryBackend::new();
        backend.put("keynest/plan", b"free").await.unwrap();
        backend.put("keynest/plan", b"pro").await.unwrap();
        assert_eq!(
            backend.get("keynest/plan").await.unwrap(),
            Some(b"pro".to_vec())
        );
    }

    #[tokio::test]
    async fn slots_are_independent() {
        let backend = MemoryBackend::new();
        backend.put("keynest/plan", b"pro").await.unwrap();
        assert_eq!(backend.get("keynest/other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn clone_shares_state() {
        let backend = MemoryBackend::new();
        let clone = backend.clone();
        backend.put("keynest/plan", b"pro").await.unwrap();
        assert_eq!(
            clone.get("keynest/plan").await.unwrap(),
            Some(b"pro".to_vec())
        );
    }
}
