//! Listed records: a list used as an index plus one record per entry.
//!
//! A listed record lives at `<list_path><split_char><id>`. The list holds
//! either that full path or the bare id, depending on
//! [`ClientConfig::full_paths`](crate::ClientConfig). Both operations here
//! are safe to retry: list membership is idempotent, a record is initialised
//! only while empty, and deleting an absent record is a no-op.

use serde_json::{Map, Value};

use crate::error::Result;
use crate::records::{add_entry, Records};
use crate::store::{is_blank, DocumentHandle, RecordStore};

impl<S: RecordStore> Records<S> {
    /// Get (creating if needed) the record `id` of the list at `list_path`.
    ///
    /// Without an id a fresh one is generated. The record is added to the
    /// list if missing and, if it is still empty, initialised with its id
    /// under the identity field overlaid by `initiation`, so a key in
    /// `initiation` overrides the generated id. Both handles are returned
    /// open; the caller decides when to discard them.
    pub async fn get_dataset_record(
        &self,
        list_path: &str,
        id: Option<&str>,
        initiation: Option<Value>,
    ) -> Result<(S::List, S::Record)> {
        let init = match initiation {
            None => Map::new(),
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(tether_engine::Error::mismatch("initiation", "object", &other).into())
            }
        };

        let id = match id {
            Some(id) => id.to_string(),
            None => self.store.new_uid(),
        };
        let record_path = self.config.record_path(list_path, &id);

        let (list, record) = futures::try_join!(
            self.store.get_list(list_path),
            self.store.get_record(&record_path),
        )?;

        let entry = self.config.list_entry(&record_path, &id);
        if add_entry(&list, entry).await? {
            tracing::debug!(list = %list_path, entry = %entry, "added list entry");
        }

        if is_blank(&record.get()) {
            let mut doc = Map::new();
            if let Some(id_key) = &self.config.id_key {
                doc.insert(id_key.clone(), Value::String(id.clone()));
            }
            doc.extend(init);
            // Only the first of overlapping initialisations lands
            if record.set_if_blank(Value::Object(doc)).await? {
                tracing::info!(path = %record_path, "listed record created");
            }
        }

        Ok((list, record))
    }

    /// Delete the record `id` and remove it from the list at `list_path`.
    ///
    /// Both halves run concurrently and both are always attempted; the first
    /// error is returned once they have settled. Retrying after a partial
    /// failure finishes the missing half.
    pub async fn delete_dataset_record(&self, list_path: &str, id: &str) -> Result<S::List> {
        let record_path = self.config.record_path(list_path, id);
        let entries = [self.config.list_entry(&record_path, id)];

        let (deleted, list) = futures::join!(
            self.delete_record_at(&record_path),
            self.remove_from_list(list_path, &entries),
        );
        deleted?;
        let list = list?;

        tracing::info!(path = %record_path, "listed record deleted");
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::error::ErrorKind;
    use crate::memory::MemoryStore;
    use crate::store::ListHandle;
    use serde_json::json;
    use std::sync::Arc;

    fn records_with(config: ClientConfig) -> (MemoryStore, Records<MemoryStore>) {
        let store = MemoryStore::new();
        let records = Records::new(Arc::new(store.clone()), Arc::new(config));
        (store, records)
    }

    #[tokio::test]
    async fn creates_record_and_entry() {
        let (store, records) = records_with(ClientConfig::default());

        let (list, record) = records
            .get_dataset_record("acme/users", Some("u1"), Some(json!({"name": "A"})))
            .await
            .unwrap();

        assert_eq!(list.entries(), vec!["acme/users/u1".to_string()]);
        assert_eq!(record.name(), "acme/users/u1");
        assert_eq!(
            store.value("acme/users/u1").unwrap(),
            json!({"id": "u1", "name": "A"})
        );
    }

    #[tokio::test]
    async fn generates_an_id_when_none_given() {
        let (store, records) = records_with(ClientConfig::default().with_full_paths(false));

        let (list, record) = records.get_dataset_record("users", None, None).await.unwrap();

        let entries = list.entries();
        assert_eq!(entries.len(), 1);
        let id = &entries[0];
        assert_eq!(record.name(), format!("users/{}", id));
        assert_eq!(store.value(record.name()).unwrap(), json!({"id": id}));
    }

    #[tokio::test]
    async fn initiation_overrides_identity_field() {
        let (store, records) = records_with(ClientConfig::default().with_id_key(Some("_id")));

        records
            .get_dataset_record("users", Some("u1"), Some(json!({"_id": "other", "n": 1})))
            .await
            .unwrap();

        assert_eq!(
            store.value("users/u1").unwrap(),
            json!({"_id": "other", "n": 1})
        );
        assert_eq!(store.entries("users"), vec!["users/u1"]);
    }

    #[tokio::test]
    async fn overlapping_ensures_of_one_id_apply_once() {
        let (store, records) = records_with(ClientConfig::default());

        let (a, b) = futures::join!(
            records.get_dataset_record("todos", Some("t1"), Some(json!({"title": "A"}))),
            records.get_dataset_record("todos", Some("t1"), Some(json!({"title": "B"}))),
        );
        a.unwrap();
        b.unwrap();

        assert_eq!(store.entries("todos"), vec!["todos/t1"]);
        assert_eq!(
            store.value("todos/t1").unwrap(),
            json!({"id": "t1", "title": "A"})
        );
    }

    #[tokio::test]
    async fn concurrent_deletes_of_sibling_records() {
        let (store, records) = records_with(ClientConfig::default());
        records.get_dataset_record("todos", Some("t1"), None).await.unwrap();
        records.get_dataset_record("todos", Some("t2"), None).await.unwrap();

        let (first, second) = futures::join!(
            records.delete_dataset_record("todos", "t1"),
            records.delete_dataset_record("todos", "t2"),
        );
        first.unwrap();
        second.unwrap();

        assert!(store.entries("todos").is_empty());
        assert!(!store.contains("todos/t1"));
        assert!(!store.contains("todos/t2"));
    }

    #[tokio::test]
    async fn existing_record_is_not_reinitialised() {
        let (store, records) = records_with(ClientConfig::default());
        store.insert("users/u1", json!({"id": "u1", "name": "kept"}));

        records
            .get_dataset_record("users", Some("u1"), Some(json!({"name": "new"})))
            .await
            .unwrap();

        assert_eq!(
            store.value("users/u1").unwrap(),
            json!({"id": "u1", "name": "kept"})
        );
        assert_eq!(store.entries("users"), vec!["users/u1"]);
    }

    #[tokio::test]
    async fn rejects_non_object_initiation() {
        let (store, records) = records_with(ClientConfig::default());

        let err = records
            .get_dataset_record("users", Some("u1"), Some(json!([1])))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert!(!store.contains("users/u1"));
        assert!(!store.contains("users"));
    }

    #[tokio::test]
    async fn delete_removes_record_and_bare_id_entry() {
        let (store, records) =
            records_with(ClientConfig::default().with_full_paths(false).with_split_char(':'));

        records.get_dataset_record("users", Some("u1"), None).await.unwrap();
        records.get_dataset_record("users", Some("u2"), None).await.unwrap();
        assert_eq!(store.entries("users"), vec!["u1", "u2"]);

        let list = records.delete_dataset_record("users", "u1").await.unwrap();
        assert_eq!(list.entries(), vec!["u2".to_string()]);
        assert!(!store.contains("users:u1"));
        assert!(store.contains("users:u2"));
    }

    #[tokio::test]
    async fn delete_of_missing_record_still_cleans_list() {
        let (store, records) = records_with(ClientConfig::default());
        store.insert("users", json!(["users/ghost"]));

        let list = records.delete_dataset_record("users", "ghost").await.unwrap();
        assert!(list.is_empty());
    }
}
