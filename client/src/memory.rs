//! In-memory record store.
//!
//! Keeps every record and list in one path-keyed map, the way the realtime
//! backend does: a list is a record whose value is an array of strings.
//! Useful for tests and for running the record layer without a server.
//!
//! Writes go through a small tracker that counts concurrent in-flight writes,
//! so tests can check that same-document writes were issued one at a time.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};

use crate::error::{Error, Result};
use crate::store::{is_blank, DocumentHandle, ListHandle, RecordStore};

/// Handler for a registered remote procedure.
pub type RpcHandler = Arc<dyn Fn(Value) -> std::result::Result<Value, String> + Send + Sync>;

/// A write the store has applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteEvent {
    pub path: String,
    /// The field written, `None` for whole-value writes
    pub field: Option<String>,
}

#[derive(Default)]
struct Inner {
    data: DashMap<String, Value>,
    rpcs: DashMap<String, RpcHandler>,
    users: DashMap<String, String>,
    fail_next_delete: AtomicBool,
    fail_next_list_write: AtomicBool,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    writes: Mutex<Vec<WriteEvent>>,
}

impl Inner {
    /// Run a write, yielding once so concurrent writers can overlap.
    async fn write<T>(&self, event: WriteEvent, apply: impl FnOnce() -> T) -> T {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::task::yield_now().await;
        let out = apply();

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        tracing::debug!(path = %event.path, field = ?event.field, "store write");
        self.writes.lock().push(event);
        out
    }

    fn set_field(&self, path: &str, key: &str, value: Value) {
        let mut entry = self
            .data
            .entry(path.to_string())
            .or_insert_with(|| json!({}));
        match entry.value_mut() {
            Value::Object(map) => {
                map.insert(key.to_string(), value);
            }
            other => {
                let mut map = Map::new();
                map.insert(key.to_string(), value);
                *other = Value::Object(map);
            }
        }
    }

    fn entries(&self, path: &str) -> Vec<String> {
        self.data
            .get(path)
            .and_then(|v| {
                v.as_array().map(|items| {
                    items
                        .iter()
                        .filter_map(|item| item.as_str().map(str::to_string))
                        .collect()
                })
            })
            .unwrap_or_default()
    }

    /// Edit a list in place, at the moment the write is applied.
    fn update_entries<T>(&self, path: &str, edit: impl FnOnce(&mut Vec<String>) -> T) -> T {
        let mut entries = self.entries(path);
        let out = edit(&mut entries);
        self.data.insert(path.to_string(), json!(entries));
        out
    }

    fn check_list_write(&self, path: &str) -> Result<()> {
        if self.fail_next_list_write.swap(false, Ordering::SeqCst) {
            return Err(Error::Transport(format!("list write to '{}' failed", path)));
        }
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<()> {
        if self.fail_next_delete.swap(false, Ordering::SeqCst) {
            return Err(Error::Transport(format!("delete of '{}' failed", path)));
        }
        self.data.remove(path);
        Ok(())
    }
}

/// A cloneable, shared in-memory store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value at a path.
    pub fn insert(&self, path: impl Into<String>, value: Value) {
        self.inner.data.insert(path.into(), value);
    }

    /// Current value at a path.
    pub fn value(&self, path: &str) -> Option<Value> {
        self.inner.data.get(path).map(|v| v.value().clone())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.inner.data.contains_key(path)
    }

    /// Entries of the list at a path (empty if absent).
    pub fn entries(&self, path: &str) -> Vec<String> {
        self.inner.entries(path)
    }

    /// Register a remote procedure.
    pub fn register_rpc<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(Value) -> std::result::Result<Value, String> + Send + Sync + 'static,
    {
        self.inner.rpcs.insert(name.into(), Arc::new(handler));
    }

    /// Accept `{"username", "password"}` credentials for a user.
    pub fn add_user(&self, username: impl Into<String>, password: impl Into<String>) {
        self.inner.users.insert(username.into(), password.into());
    }

    /// Make the next record or list deletion fail with a transport error.
    pub fn fail_next_delete(&self) {
        self.inner.fail_next_delete.store(true, Ordering::SeqCst);
    }

    /// Make the next list entry write fail with a transport error.
    pub fn fail_next_list_write(&self) {
        self.inner.fail_next_list_write.store(true, Ordering::SeqCst);
    }

    /// Highest number of writes that were in flight at the same time.
    pub fn max_concurrent_writes(&self) -> usize {
        self.inner.max_in_flight.load(Ordering::SeqCst)
    }

    /// Every write applied so far, in completion order.
    pub fn writes(&self) -> Vec<WriteEvent> {
        self.inner.writes.lock().clone()
    }
}

/// Record handle into a [`MemoryStore`].
#[derive(Clone)]
pub struct MemoryRecord {
    name: String,
    inner: Arc<Inner>,
}

impl fmt::Debug for MemoryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryRecord")
            .field("name", &self.name)
            .finish()
    }
}

#[async_trait]
impl DocumentHandle for MemoryRecord {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self) -> Value {
        self.inner
            .data
            .get(&self.name)
            .map(|v| v.value().clone())
            .unwrap_or_else(|| json!({}))
    }

    async fn set(&self, value: Value) -> Result<()> {
        let event = WriteEvent {
            path: self.name.clone(),
            field: None,
        };
        self.inner
            .write(event, || {
                self.inner.data.insert(self.name.clone(), value);
            })
            .await;
        Ok(())
    }

    async fn set_field(&self, key: &str, value: Value) -> Result<()> {
        let event = WriteEvent {
            path: self.name.clone(),
            field: Some(key.to_string()),
        };
        self.inner
            .write(event, || self.inner.set_field(&self.name, key, value))
            .await;
        Ok(())
    }

    async fn set_if_blank(&self, value: Value) -> Result<bool> {
        let event = WriteEvent {
            path: self.name.clone(),
            field: None,
        };
        let written = self
            .inner
            .write(event, || {
                let mut slot = self
                    .inner
                    .data
                    .entry(self.name.clone())
                    .or_insert_with(|| json!({}));
                if !is_blank(slot.value()) {
                    return false;
                }
                *slot.value_mut() = value;
                true
            })
            .await;
        Ok(written)
    }

    async fn delete(&self) -> Result<()> {
        self.inner.delete(&self.name)
    }

    fn discard(&self) {
        tracing::trace!(path = %self.name, "record handle discarded");
    }
}

/// List handle into a [`MemoryStore`].
#[derive(Clone)]
pub struct MemoryList {
    name: String,
    inner: Arc<Inner>,
}

impl fmt::Debug for MemoryList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryList")
            .field("name", &self.name)
            .finish()
    }
}

impl MemoryList {
    fn event(&self) -> WriteEvent {
        WriteEvent {
            path: self.name.clone(),
            field: None,
        }
    }
}

#[async_trait]
impl ListHandle for MemoryList {
    fn name(&self) -> &str {
        &self.name
    }

    fn entries(&self) -> Vec<String> {
        self.inner.entries(&self.name)
    }

    async fn add_entry(&self, entry: &str) -> Result<bool> {
        self.inner.check_list_write(&self.name)?;
        let added = self
            .inner
            .write(self.event(), || {
                self.inner.update_entries(&self.name, |entries| {
                    if entries.iter().any(|e| e == entry) {
                        return false;
                    }
                    entries.push(entry.to_string());
                    true
                })
            })
            .await;
        Ok(added)
    }

    async fn remove_entry(&self, entry: &str) -> Result<()> {
        self.inner.check_list_write(&self.name)?;
        self.inner
            .write(self.event(), || {
                self.inner
                    .update_entries(&self.name, |entries| entries.retain(|e| e != entry))
            })
            .await;
        Ok(())
    }

    async fn delete(&self) -> Result<()> {
        self.inner.delete(&self.name)
    }

    fn discard(&self) {
        tracing::trace!(path = %self.name, "list handle discarded");
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    type Record = MemoryRecord;
    type List = MemoryList;

    async fn has(&self, name: &str) -> Result<bool> {
        Ok(self.inner.data.contains_key(name))
    }

    async fn get_record(&self, name: &str) -> Result<MemoryRecord> {
        self.inner
            .data
            .entry(name.to_string())
            .or_insert_with(|| json!({}));
        Ok(MemoryRecord {
            name: name.to_string(),
            inner: self.inner.clone(),
        })
    }

    async fn get_list(&self, name: &str) -> Result<MemoryList> {
        self.inner
            .data
            .entry(name.to_string())
            .or_insert_with(|| json!([]));
        Ok(MemoryList {
            name: name.to_string(),
            inner: self.inner.clone(),
        })
    }

    async fn snapshot(&self, name: &str) -> Result<Value> {
        self.value(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    async fn set_data(&self, name: &str, key: Option<&str>, value: Value) -> Result<()> {
        let event = WriteEvent {
            path: name.to_string(),
            field: key.map(str::to_string),
        };
        self.inner
            .write(event, || match key {
                Some(key) => self.inner.set_field(name, key, value),
                None => {
                    self.inner.data.insert(name.to_string(), value);
                }
            })
            .await;
        Ok(())
    }

    async fn make_rpc(&self, name: &str, payload: Value) -> Result<Value> {
        let handler = self
            .inner
            .rpcs
            .get(name)
            .map(|h| h.value().clone())
            .ok_or_else(|| Error::Remote(format!("no provider for rpc '{}'", name)))?;
        handler(payload).map_err(Error::Remote)
    }

    async fn login(&self, credentials: Value) -> Result<Value> {
        let username = credentials
            .get("username")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Auth("missing username".to_string()))?;
        let password = credentials.get("password").and_then(Value::as_str);

        let accepted = self
            .inner
            .users
            .get(username)
            .is_some_and(|expected| Some(expected.value().as_str()) == password);
        if !accepted {
            return Err(Error::Auth("invalid credentials".to_string()));
        }
        Ok(json!({ "username": username }))
    }

    fn new_uid(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_record_creates_empty_document() {
        let store = MemoryStore::new();
        assert!(!store.has("users/1").await.unwrap());

        let record = store.get_record("users/1").await.unwrap();
        assert_eq!(record.get(), json!({}));
        assert!(store.has("users/1").await.unwrap());
    }

    #[tokio::test]
    async fn set_field_on_record() {
        let store = MemoryStore::new();
        store.insert("users/1", json!({"name": "Alice"}));

        let record = store.get_record("users/1").await.unwrap();
        record.set_field("age", json!(30)).await.unwrap();
        assert_eq!(record.get(), json!({"name": "Alice", "age": 30}));
    }

    #[tokio::test]
    async fn list_entries() {
        let store = MemoryStore::new();
        let list = store.get_list("users").await.unwrap();
        assert!(list.is_empty());

        list.add_entry("a").await.unwrap();
        list.add_entry("b").await.unwrap();
        list.remove_entry("a").await.unwrap();
        list.remove_entry("missing").await.unwrap();
        assert_eq!(list.entries(), vec!["b".to_string()]);
        assert_eq!(store.value("users"), Some(json!(["b"])));
    }

    #[tokio::test]
    async fn overlapping_adds_of_one_entry_apply_once() {
        let store = MemoryStore::new();
        let list = store.get_list("users").await.unwrap();

        let (a, b) = futures::join!(list.add_entry("a"), list.add_entry("a"));
        assert!(a.unwrap() ^ b.unwrap());
        assert_eq!(store.entries("users"), vec!["a".to_string()]);
        assert!(!list.add_entry("a").await.unwrap());
    }

    #[tokio::test]
    async fn set_if_blank_only_writes_empty_records() {
        let store = MemoryStore::new();
        let record = store.get_record("users/1").await.unwrap();

        let (a, b) = futures::join!(
            record.set_if_blank(json!({"n": 1})),
            record.set_if_blank(json!({"n": 2})),
        );
        assert!(a.unwrap());
        assert!(!b.unwrap());
        assert_eq!(record.get(), json!({"n": 1}));

        store.insert("users/2", json!(null));
        let other = store.get_record("users/2").await.unwrap();
        assert!(other.set_if_blank(json!({"n": 3})).await.unwrap());
        assert_eq!(store.value("users/2"), Some(json!({"n": 3})));
    }

    #[tokio::test]
    async fn handles_debug_by_path() {
        let store = MemoryStore::new();
        let record = store.get_record("users/1").await.unwrap();
        let list = store.get_list("users").await.unwrap();

        assert_eq!(format!("{:?}", record), r#"MemoryRecord { name: "users/1" }"#);
        assert_eq!(format!("{:?}", list), r#"MemoryList { name: "users" }"#);
    }

    #[tokio::test]
    async fn snapshot_of_missing_path() {
        let store = MemoryStore::new();
        let err = store.snapshot("nope").await.unwrap_err();
        assert_eq!(err, Error::NotFound("nope".into()));
    }

    #[tokio::test]
    async fn injected_failures_fire_once() {
        let store = MemoryStore::new();
        let record = store.get_record("r").await.unwrap();

        store.fail_next_delete();
        assert!(matches!(record.delete().await, Err(Error::Transport(_))));
        assert!(store.contains("r"));
        record.delete().await.unwrap();
        assert!(!store.contains("r"));

        let list = store.get_list("l").await.unwrap();
        store.fail_next_list_write();
        assert!(list.add_entry("x").await.is_err());
        list.add_entry("x").await.unwrap();
        assert_eq!(list.entries(), vec!["x".to_string()]);
    }

    #[tokio::test]
    async fn rpc_and_login() {
        let store = MemoryStore::new();
        store.register_rpc("add", |payload| {
            let a = payload["a"].as_i64().ok_or("missing a")?;
            let b = payload["b"].as_i64().ok_or("missing b")?;
            Ok(json!(a + b))
        });
        store.add_user("alice", "secret");

        assert_eq!(
            store.make_rpc("add", json!({"a": 1, "b": 2})).await.unwrap(),
            json!(3)
        );
        assert_eq!(
            store.make_rpc("add", json!({})).await.unwrap_err(),
            Error::Remote("missing a".into())
        );
        assert!(matches!(
            store.make_rpc("nope", json!({})).await,
            Err(Error::Remote(_))
        ));

        let session = store
            .login(json!({"username": "alice", "password": "secret"}))
            .await
            .unwrap();
        assert_eq!(session, json!({"username": "alice"}));
        assert!(matches!(
            store
                .login(json!({"username": "alice", "password": "wrong"}))
                .await,
            Err(Error::Auth(_))
        ));
    }

    #[test]
    fn uids_are_unique() {
        let store = MemoryStore::new();
        assert_ne!(store.new_uid(), store.new_uid());
    }
}
