//! The external record store the client is layered on.
//!
//! A store exposes records (JSON documents) and lists (ordered string
//! entries) by path, plus RPC and login. Handles returned by `get_record` and
//! `get_list` are local proxies; their value may be stale if other writers
//! touch the same path.

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Whether a record holds no data yet: null, `{}` or `[]`.
pub(crate) fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// A handle to one record.
#[async_trait]
pub trait DocumentHandle: Send + Sync {
    /// Path of the record.
    fn name(&self) -> &str;

    /// Last known value of the record.
    fn get(&self) -> Value;

    /// Replace the whole record.
    async fn set(&self, value: Value) -> Result<()>;

    /// Replace one top-level field.
    async fn set_field(&self, key: &str, value: Value) -> Result<()>;

    /// Replace the whole record if it still holds no data when the write is
    /// applied. Returns whether the value was written.
    async fn set_if_blank(&self, value: Value) -> Result<bool>;

    /// Delete the record; resolves once the store confirms the deletion.
    async fn delete(&self) -> Result<()>;

    /// Release the handle.
    fn discard(&self);
}

/// A handle to one list.
#[async_trait]
pub trait ListHandle: Send + Sync {
    fn name(&self) -> &str;

    /// Current entries, in order.
    fn entries(&self) -> Vec<String>;

    fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Append an entry unless it is present when the write is applied.
    /// Returns whether the entry was added.
    async fn add_entry(&self, entry: &str) -> Result<bool>;

    /// Remove every occurrence of an entry; absent entries are a no-op.
    async fn remove_entry(&self, entry: &str) -> Result<()>;

    async fn delete(&self) -> Result<()>;

    fn discard(&self);
}

/// Callback-free view of the realtime backend.
#[async_trait]
pub trait RecordStore: Send + Sync {
    type Record: DocumentHandle + 'static;
    type List: ListHandle + 'static;

    /// Whether anything is stored at `name`.
    async fn has(&self, name: &str) -> Result<bool>;

    /// Fetch a record, creating an empty one if absent.
    async fn get_record(&self, name: &str) -> Result<Self::Record>;

    /// Fetch a list, creating an empty one if absent.
    async fn get_list(&self, name: &str) -> Result<Self::List>;

    /// Read a record without creating a handle. Fails with `NotFound`.
    async fn snapshot(&self, name: &str) -> Result<Value>;

    /// Write a record, or one field of it when `key` is given, without a handle.
    async fn set_data(&self, name: &str, key: Option<&str>, value: Value) -> Result<()>;

    /// Invoke a remote procedure. Fails with `Remote`.
    async fn make_rpc(&self, name: &str, payload: Value) -> Result<Value>;

    /// Authenticate the session. Fails with `Auth`.
    async fn login(&self, credentials: Value) -> Result<Value>;

    /// A fresh unique id.
    fn new_uid(&self) -> String;
}
