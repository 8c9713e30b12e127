//! Field guards: locked and protected keys.
//!
//! Guards run after a merge and compare the result with the document as it
//! was before the update:
//!
//! - a **locked** key always gets its previous value back
//! - a **protected** key gets its previous value back only if the result has
//!   no entry for it
//!
//! A key with no previous value is left as the merge produced it.

use crate::FieldName;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// The set of guarded top-level keys for one update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPolicy {
    /// Keys restored unconditionally
    pub locked: BTreeSet<FieldName>,
    /// Keys restored when the update omits them
    pub protected: BTreeSet<FieldName>,
}

impl KeyPolicy {
    /// An empty policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a policy from explicit key lists.
    pub fn from_keys<L, P>(locked: L, protected: P) -> Self
    where
        L: IntoIterator,
        L::Item: Into<FieldName>,
        P: IntoIterator,
        P::Item: Into<FieldName>,
    {
        Self {
            locked: locked.into_iter().map(Into::into).collect(),
            protected: protected.into_iter().map(Into::into).collect(),
        }
    }

    /// Add a locked key.
    pub fn lock(mut self, key: impl Into<FieldName>) -> Self {
        self.locked.insert(key.into());
        self
    }

    /// Add a protected key.
    pub fn protect(mut self, key: impl Into<FieldName>) -> Self {
        self.protected.insert(key.into());
        self
    }

    pub fn is_locked(&self, key: &str) -> bool {
        self.locked.contains(key)
    }

    pub fn is_protected(&self, key: &str) -> bool {
        self.protected.contains(key)
    }

    /// Locked or protected.
    pub fn is_guarded(&self, key: &str) -> bool {
        self.is_locked(key) || self.is_protected(key)
    }

    /// No key is guarded at all.
    pub fn is_empty(&self) -> bool {
        self.locked.is_empty() && self.protected.is_empty()
    }
}

/// Restore guarded keys in `result` from `previous`.
///
/// Locked keys win over protected keys and over whatever the update tried to
/// set. Non-mapping values have no keys to guard and are left untouched.
pub fn apply_guards(result: &mut Value, previous: &Value, policy: &KeyPolicy) {
    let (Value::Object(out), Value::Object(before)) = (result, previous) else {
        return;
    };

    for key in &policy.locked {
        if let Some(value) = before.get(key) {
            out.insert(key.clone(), value.clone());
        }
    }

    for key in &policy.protected {
        if out.contains_key(key) {
            continue;
        }
        if let Some(value) = before.get(key) {
            out.insert(key.clone(), value.clone());
        }
    }
}
