//! Awaitable record and list helpers over a [`RecordStore`].
//!
//! Everything here turns the store's primitive calls into operations with
//! explicit failure: existence checks fail with `NotFound`/`AlreadyExists`,
//! list additions skip duplicates, and deletions treat an already absent
//! path as done.

use std::sync::Arc;

use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::store::{DocumentHandle, ListHandle, RecordStore};

/// Add `entry` to `list` unless it is already there.
///
/// Returns whether the entry was added. A locally visible entry skips the
/// write; otherwise the store re-checks when the write is applied, so
/// overlapping calls for the same entry add it once.
pub async fn add_entry<L: ListHandle + ?Sized>(list: &L, entry: &str) -> Result<bool> {
    if list.entries().iter().any(|e| e == entry) {
        return Ok(false);
    }
    list.add_entry(entry).await
}

/// Record-level operations for one client.
pub struct Records<S: RecordStore> {
    pub(crate) store: Arc<S>,
    pub(crate) config: Arc<ClientConfig>,
}

impl<S: RecordStore> Clone for Records<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: RecordStore> Records<S> {
    pub fn new(store: Arc<S>, config: Arc<ClientConfig>) -> Self {
        Self { store, config }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Succeeds only if something exists at `path`.
    pub async fn has(&self, path: &str) -> Result<()> {
        if self.store.has(path).await? {
            Ok(())
        } else {
            Err(Error::NotFound(path.to_string()))
        }
    }

    /// Succeeds only if nothing exists at `path`.
    pub async fn ensure_absent(&self, path: &str) -> Result<()> {
        if self.store.has(path).await? {
            Err(Error::AlreadyExists(path.to_string()))
        } else {
            Ok(())
        }
    }

    /// Fetch a record, creating it if absent.
    pub async fn get_record(&self, path: &str) -> Result<S::Record> {
        self.store.get_record(path).await
    }

    /// Fetch a list, creating it if absent.
    pub async fn get_list(&self, path: &str) -> Result<S::List> {
        self.store.get_list(path).await
    }

    /// Fetch a record that must already exist.
    pub async fn get_existing_record(&self, path: &str) -> Result<S::Record> {
        self.has(path).await?;
        self.store.get_record(path).await
    }

    /// Fetch a list that must already exist.
    pub async fn get_existing_list(&self, path: &str) -> Result<S::List> {
        self.has(path).await?;
        self.store.get_list(path).await
    }

    /// Read a record without holding a handle.
    pub async fn snapshot(&self, path: &str) -> Result<Value> {
        self.store.snapshot(path).await
    }

    /// Write a whole record, or a single field of it.
    pub async fn set_data(&self, path: &str, key: Option<&str>, value: Value) -> Result<()> {
        self.store.set_data(path, key, value).await
    }

    /// Delete the record at `path`; a missing record counts as deleted.
    pub async fn delete_record_at(&self, path: &str) -> Result<()> {
        match self.get_existing_record(path).await {
            Ok(record) => {
                record.delete().await?;
                tracing::debug!(path = %path, "record deleted");
                Ok(())
            }
            Err(Error::NotFound(_)) => {
                tracing::warn!(path = %path, "record already absent, nothing to delete");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Delete the list at `path`; a missing list counts as deleted.
    pub async fn delete_list_at(&self, path: &str) -> Result<()> {
        match self.get_existing_list(path).await {
            Ok(list) => {
                list.delete().await?;
                tracing::debug!(path = %path, "list deleted");
                Ok(())
            }
            Err(Error::NotFound(_)) => {
                tracing::warn!(path = %path, "list already absent, nothing to delete");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Add entries to a list, skipping ones already present.
    pub async fn add_to_list(&self, path: &str, entries: &[&str]) -> Result<S::List> {
        let list = self.store.get_list(path).await?;
        for entry in entries {
            add_entry(&list, entry).await?;
        }
        Ok(list)
    }

    /// Remove entries from a list; absent entries are ignored.
    pub async fn remove_from_list(&self, path: &str, entries: &[&str]) -> Result<S::List> {
        let list = self.store.get_list(path).await?;
        for entry in entries {
            list.remove_entry(entry).await?;
        }
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use serde_json::json;

    fn records() -> (MemoryStore, Records<MemoryStore>) {
        let store = MemoryStore::new();
        let records = Records::new(Arc::new(store.clone()), Arc::new(ClientConfig::default()));
        (store, records)
    }

    #[tokio::test]
    async fn has_and_ensure_absent() {
        let (store, records) = records();
        store.insert("users/1", json!({"id": "1"}));

        records.has("users/1").await.unwrap();
        assert_eq!(
            records.has("users/2").await.unwrap_err(),
            Error::NotFound("users/2".into())
        );

        records.ensure_absent("users/2").await.unwrap();
        assert_eq!(
            records.ensure_absent("users/1").await.unwrap_err(),
            Error::AlreadyExists("users/1".into())
        );
    }

    #[tokio::test]
    async fn get_existing_does_not_create() {
        let (store, records) = records();

        assert!(records.get_existing_record("ghost").await.is_err());
        assert!(records.get_existing_list("ghosts").await.is_err());
        assert!(!store.contains("ghost"));
        assert!(!store.contains("ghosts"));
    }

    #[tokio::test]
    async fn add_entry_is_idempotent() {
        let (store, records) = records();

        let list = records.add_to_list("users", &["a", "b"]).await.unwrap();
        assert!(!add_entry(&list, "a").await.unwrap());
        records.add_to_list("users", &["b", "c"]).await.unwrap();

        assert_eq!(store.entries("users"), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn remove_from_list_ignores_absent_entries() {
        let (store, records) = records();
        store.insert("users", json!(["a", "b"]));

        let list = records.remove_from_list("users", &["a", "zzz"]).await.unwrap();
        assert_eq!(list.entries(), vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn delete_missing_record_is_a_no_op() {
        let (store, records) = records();
        store.insert("users/1", json!({"id": "1"}));

        records.delete_record_at("users/1").await.unwrap();
        assert!(!store.contains("users/1"));
        records.delete_record_at("users/1").await.unwrap();

        store.insert("users", json!([]));
        records.delete_list_at("users").await.unwrap();
        records.delete_list_at("users").await.unwrap();
        assert!(!store.contains("users"));
    }

    #[tokio::test]
    async fn delete_surfaces_transport_errors() {
        let (store, records) = records();
        store.insert("users/1", json!({"id": "1"}));
        store.fail_next_delete();

        assert!(matches!(
            records.delete_record_at("users/1").await,
            Err(Error::Transport(_))
        ));
        assert!(store.contains("users/1"));
    }

    #[tokio::test]
    async fn snapshot_and_set_data() {
        let (_store, records) = records();

        records
            .set_data("users/1", None, json!({"name": "A"}))
            .await
            .unwrap();
        records
            .set_data("users/1", Some("age"), json!(3))
            .await
            .unwrap();

        assert_eq!(
            records.snapshot("users/1").await.unwrap(),
            json!({"name": "A", "age": 3})
        );
        assert!(records.snapshot("users/2").await.unwrap_err().is_not_found());
    }
}
