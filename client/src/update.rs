//! Record update controller.
//!
//! Applies a partial update to a record that must already exist:
//!
//! 1. Validate the payload shape for the mode (no I/O yet)
//! 2. Check the record exists, failing with `NotFound`
//! 3. Lock the identity field
//! 4. Write, using the strategy of the mode:
//!    - `shallow`: one field write per unlocked key, awaited one at a time
//!    - `overwrite`: one whole-record write, guarded if any key is guarded
//!    - `removeKeys` and the deep modes: read, merge, guard, write, discard
//!
//! Same-record field writes are never issued concurrently: the backend does
//! not guarantee their acknowledgement order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tether_engine::{apply_guards, key_list, merge, KeyPolicy, UpdateMode};

use crate::error::Result;
use crate::records::Records;
use crate::store::{DocumentHandle, RecordStore};

/// A partial update for one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordUpdate {
    /// The values to apply, or a list of keys for `removeKeys`
    pub payload: Value,
    #[serde(default)]
    pub mode: UpdateMode,
    #[serde(default)]
    pub locked_keys: Vec<String>,
    #[serde(default)]
    pub protected_keys: Vec<String>,
}

impl RecordUpdate {
    /// A `shallow` update with no guarded keys.
    pub fn new(payload: Value) -> Self {
        Self {
            payload,
            mode: UpdateMode::default(),
            locked_keys: Vec::new(),
            protected_keys: Vec::new(),
        }
    }

    pub fn mode(mut self, mode: UpdateMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the mode from its tag, e.g. `"deepConcat"`.
    pub fn mode_tag(self, tag: &str) -> Result<Self> {
        Ok(self.mode(tag.parse()?))
    }

    pub fn lock(mut self, key: impl Into<String>) -> Self {
        self.locked_keys.push(key.into());
        self
    }

    pub fn protect(mut self, key: impl Into<String>) -> Self {
        self.protected_keys.push(key.into());
        self
    }

    fn policy(&self, id_key: Option<&str>) -> KeyPolicy {
        let policy = KeyPolicy::from_keys(&self.locked_keys, &self.protected_keys);
        match id_key {
            Some(key) => policy.lock(key),
            None => policy,
        }
    }

    /// Reject payloads the mode cannot interpret.
    fn validate(&self) -> Result<()> {
        match self.mode {
            UpdateMode::RemoveKeys => {
                key_list(&self.payload)?;
            }
            UpdateMode::Overwrite
            | UpdateMode::Shallow
            | UpdateMode::Deep
            | UpdateMode::DeepConcat
            | UpdateMode::DeepConcatAll
            | UpdateMode::DeepIgnore
            | UpdateMode::DeepConcatIgnore => {
                payload_fields(&self.payload)?;
            }
        }
        Ok(())
    }
}

fn payload_fields(payload: &Value) -> Result<&Map<String, Value>> {
    payload
        .as_object()
        .ok_or_else(|| tether_engine::Error::mismatch("$", "object", payload).into())
}

impl<S: RecordStore> Records<S> {
    /// Update the record at `path`, which must exist.
    pub async fn update_existing_record(&self, path: &str, update: RecordUpdate) -> Result<()> {
        update.validate()?;
        self.has(path).await?;

        let policy = update.policy(self.config.id_key.as_deref());
        tracing::debug!(path = %path, mode = %update.mode, "updating record");

        match update.mode {
            UpdateMode::Shallow => self.update_shallow(path, &update.payload, &policy).await,
            UpdateMode::Overwrite => self.update_overwrite(path, update.payload, &policy).await,
            UpdateMode::RemoveKeys => {
                self.update_remove_keys(path, &update.payload, &policy)
                    .await
            }
            UpdateMode::Deep
            | UpdateMode::DeepConcat
            | UpdateMode::DeepConcatAll
            | UpdateMode::DeepIgnore
            | UpdateMode::DeepConcatIgnore => {
                self.update_deep(path, update.mode, &update.payload, &policy)
                    .await
            }
        }
    }

    async fn update_shallow(&self, path: &str, payload: &Value, policy: &KeyPolicy) -> Result<()> {
        for (key, value) in payload_fields(payload)? {
            if policy.is_locked(key) {
                continue;
            }
            self.store
                .set_data(path, Some(key), value.clone())
                .await?;
        }
        Ok(())
    }

    async fn update_overwrite(&self, path: &str, payload: Value, policy: &KeyPolicy) -> Result<()> {
        if policy.is_empty() {
            return self.store.set_data(path, None, payload).await;
        }

        self.rewrite(path, |current| {
            let mut next = payload;
            apply_guards(&mut next, current, policy);
            Ok(next)
        })
        .await
    }

    async fn update_remove_keys(
        &self,
        path: &str,
        payload: &Value,
        policy: &KeyPolicy,
    ) -> Result<()> {
        let removable: Vec<&str> = key_list(payload)?
            .into_iter()
            .filter(|key| !policy.is_guarded(key))
            .collect();

        self.rewrite(path, |current| {
            Ok(merge(
                UpdateMode::RemoveKeys,
                current,
                &Value::from(removable),
            )?)
        })
        .await
    }

    async fn update_deep(
        &self,
        path: &str,
        mode: UpdateMode,
        payload: &Value,
        policy: &KeyPolicy,
    ) -> Result<()> {
        self.rewrite(path, |current| {
            let mut next = merge(mode, current, payload)?;
            apply_guards(&mut next, current, policy);
            Ok(next)
        })
        .await
    }

    /// Read the record fresh, compute its next value, write it back and
    /// release the handle, on success or failure.
    async fn rewrite<F>(&self, path: &str, compute: F) -> Result<()>
    where
        F: FnOnce(&Value) -> Result<Value>,
    {
        let record = self.store.get_record(path).await?;
        let result = match compute(&record.get()) {
            Ok(next) => record.set(next).await,
            Err(e) => Err(e),
        };
        record.discard();
        result
    }
}
