//! Durable redb storage backend.
//!
//! A single-file, pure-Rust B-tree store. Every operation runs in its own
//! transaction on the Tokio blocking pool, so a crash never leaves a
//! half-written slot behind.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};

use crate::{StorageBackend, StorageError};

/// All slots live in one table; namespacing is done with key prefixes.
const SLOTS: TableDefinition<&str, &[u8]> = TableDefinition::new("slots");

/// A storage backend backed by a redb database file.
///
/// # Examples
///
/// ```no_run
/// # use keynest_storage::RedbBackend;
/// let backend = RedbBackend::open("/home/me/.keynest/keynest.redb").unwrap();
/// ```
#[derive(Clone)]
pub struct RedbBackend {
    db: Arc<Database>,
    path: PathBuf,
}

impl std::fmt::Debug for RedbBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbBackend")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RedbBackend {
    /// Open or create a redb database at `path`, creating parent directories
    /// as needed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the directory or database file cannot
    /// be created, or [`StorageError::Transaction`] if the slot table cannot
    /// be initialized.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let open_err = |reason: String| StorageError::Open {
            path: path.display().to_string(),
            reason,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| open_err(e.to_string()))?;
        }

        let db = Database::create(path).map_err(|e| open_err(e.to_string()))?;

        // Opening the table inside a write transaction creates it.
        let txn = db.begin_write().map_err(txn_err)?;
        txn.open_table(SLOTS).map_err(table_err)?;
        txn.commit().map_err(txn_err)?;

        tracing::debug!(path = %path.display(), "opened redb storage");

        Ok(Self {
            db: Arc::new(db),
            path: path.to_path_buf(),
        })
    }
}

fn txn_err(e: impl std::fmt::Display) -> StorageError {
    StorageError::Transaction {
        reason: e.to_string(),
    }
}

fn table_err(e: impl std::fmt::Display) -> StorageError {
    StorageError::MissingTable {
        name: format!("slots: {e}"),
    }
}

/// Run a blocking redb operation off the async executor.
async fn blocking<T, F>(op: F) -> Result<T, StorageError>
where
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| StorageError::Transaction {
            reason: format!("blocking task panicked: {e}"),
        })?
}

#[async_trait::async_trait]
impl StorageBackend for RedbBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let db = Arc::clone(&self.db);
        let key = key.to_owned();
        blocking(move || {
            let txn = db.begin_read().map_err(txn_err)?;
            let table = txn.open_table(SLOTS).map_err(table_err)?;
            let value = table
                .get(key.as_str())
                .map_err(|e| StorageError::Read {
                    key: key.clone(),
                    reason: e.to_string(),
                })?
                .map(|v| v.value().to_vec());
            Ok(value)
        })
        .await
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let db = Arc::clone(&self.db);
        let key = key.to_owned();
        let value = value.to_vec();
        blocking(move || {
            let txn = db.begin_write().map_err(txn_err)?;
            {
                let mut table = txn.open_table(SLOTS).map_err(table_err)?;
                table
                    .insert(key.as_str(), value.as_slice())
                    .map_err(|e| StorageError::Write {
                        key: key.clone(),
                        reason: e.to_string(),
                    })?;
            }
            txn.commit().map_err(txn_err)
        })
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = RedbBackend::open(dir.path().join("slots.redb")).unwrap();

        assert_eq!(backend.get("keynest/plan").await.unwrap(), None);
        backend.put("keynest/plan", b"free").await.unwrap();
        backend.put("keynest/plan", b"pro").await.unwrap();
        assert_eq!(
            backend.get("keynest/plan").await.unwrap(),
            Some(b"pro".to_vec())
        );
    }

    #[tokio::test]
    async fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("slots.redb");

        {
            let backend = RedbBackend::open(&path).unwrap();
            backend.put("keynest/plan", b"pro").await.unwrap();
        }

        let reopened = RedbBackend::open(&path).unwrap();
        assert_eq!(
            reopened.get("keynest/plan").await.unwrap(),
            Some(b"pro".to_vec())
        );
    }

    #[test]
    fn opening_a_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = RedbBackend::open(dir.path()).unwrap_err();
        assert!(matches!(err, StorageError::Open { .. }));
    }
}
