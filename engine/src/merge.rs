//! Deep-merge engine.
//!
//! Every mode is a pure function of `(current, update)`. Deep modes share one
//! recursive walk, [`deep_merge_with`], and differ only in the [`Combiner`]
//! consulted at each position.
//!
//! # Mismatched shapes
//!
//! Both top-level values must be mappings (documents); anything else is a
//! [`Error::TypeMismatch`]. Below the top level the update wins whenever the
//! two sides are not both mappings, so merging `{a: {x: 1}}` into `{a: 5}`
//! yields `{a: {x: 1}}`.

use crate::error::{kind_of, Result};
use crate::{Error, UpdateMode};
use serde_json::{Map, Value};

/// Marker string that keeps the current value in the ignore modes.
pub const IGNORE_SENTINEL: &str = "%IGNORE%";

/// A per-position merge strategy.
///
/// `combine` is tried before the default rule. Returning `None` means "no
/// opinion": mappings are then merged key by key and any other update value
/// replaces the current one.
pub trait Combiner: Send + Sync {
    fn combine(&self, current: &Value, update: &Value) -> Option<Value>;
}

/// Never has an opinion; plain deep merge.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpinion;

impl Combiner for NoOpinion {
    fn combine(&self, _current: &Value, _update: &Value) -> Option<Value> {
        None
    }
}

/// Appends when both sides are sequences and the current one holds only scalars.
///
/// `[1, 2] + [3] -> [1, 2, 3]`, `[{a: 1}] + [{a: 2}] -> [{a: 2}]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcatScalars;

impl Combiner for ConcatScalars {
    fn combine(&self, current: &Value, update: &Value) -> Option<Value> {
        concat_scalars(current, update)
    }
}

/// Appends to every current sequence, whatever its elements.
///
/// A non-sequence update is appended as a single element.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcatAll;

impl Combiner for ConcatAll {
    fn combine(&self, current: &Value, update: &Value) -> Option<Value> {
        let Value::Array(items) = current else {
            return None;
        };
        let mut out = items.clone();
        match update {
            Value::Array(more) => out.extend(more.iter().cloned()),
            other => out.push(other.clone()),
        }
        Some(Value::Array(out))
    }
}

/// Keeps the current value wherever the update holds [`IGNORE_SENTINEL`].
///
/// Sequences are overlaid position by position so the sentinel can address a
/// single element: `[10, 20] + ["%IGNORE%", 30] -> [10, 30]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreSentinel;

impl Combiner for IgnoreSentinel {
    fn combine(&self, current: &Value, update: &Value) -> Option<Value> {
        ignore_or_overlay(current, update, self)
    }
}

/// [`ConcatScalars`] when it applies, otherwise [`IgnoreSentinel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcatIgnore;

impl Combiner for ConcatIgnore {
    fn combine(&self, current: &Value, update: &Value) -> Option<Value> {
        concat_scalars(current, update).or_else(|| ignore_or_overlay(current, update, self))
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

fn concat_scalars(current: &Value, update: &Value) -> Option<Value> {
    match (current, update) {
        (Value::Array(items), Value::Array(more)) if items.iter().all(is_scalar) => {
            let mut out = items.clone();
            out.extend(more.iter().cloned());
            Some(Value::Array(out))
        }
        _ => None,
    }
}

fn ignore_or_overlay(current: &Value, update: &Value, combiner: &dyn Combiner) -> Option<Value> {
    match (current, update) {
        (_, Value::String(s)) if s == IGNORE_SENTINEL => Some(current.clone()),
        (Value::Array(items), Value::Array(more)) => Some(Value::Array(overlay(items, more, combiner))),
        _ => None,
    }
}

/// Positional merge of two sequences; trailing current elements are kept.
fn overlay(current: &[Value], update: &[Value], combiner: &dyn Combiner) -> Vec<Value> {
    let len = current.len().max(update.len());
    (0..len)
        .filter_map(|i| match (current.get(i), update.get(i)) {
            (Some(c), Some(u)) => Some(deep_merge_with(c, u, combiner)),
            (None, Some(u)) => Some(u.clone()),
            (Some(c), None) => Some(c.clone()),
            (None, None) => None,
        })
        .collect()
}

/// Recursively merge `update` into `current`.
///
/// Keys only present in `update` are copied as-is without consulting the
/// combiner, so a sentinel at a brand new key is stored literally.
pub fn deep_merge_with(current: &Value, update: &Value, combiner: &dyn Combiner) -> Value {
    if let Some(combined) = combiner.combine(current, update) {
        return combined;
    }

    match (current, update) {
        (Value::Object(cur), Value::Object(upd)) => {
            let mut out = cur.clone();
            for (key, value) in upd {
                let merged = match cur.get(key) {
                    Some(existing) => deep_merge_with(existing, value, combiner),
                    None => value.clone(),
                };
                out.insert(key.clone(), merged);
            }
            Value::Object(out)
        }
        _ => update.clone(),
    }
}

fn as_document<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| Error::mismatch(path, "object", value))
}

/// Compute the document that results from applying `update` under `mode`.
///
/// For [`UpdateMode::RemoveKeys`] the update must be a sequence of key names;
/// only top-level keys are removed. Field guards are not applied here, see
/// [`crate::apply_guards`].
pub fn merge(mode: UpdateMode, current: &Value, update: &Value) -> Result<Value> {
    match mode {
        UpdateMode::Overwrite => {
            as_document(update, "$")?;
            Ok(update.clone())
        }
        UpdateMode::Shallow => {
            let mut out = as_document(current, "$")?.clone();
            for (key, value) in as_document(update, "$")? {
                out.insert(key.clone(), value.clone());
            }
            Ok(Value::Object(out))
        }
        UpdateMode::RemoveKeys => {
            let mut out = as_document(current, "$")?.clone();
            for key in key_list(update)? {
                out.remove(key);
            }
            Ok(Value::Object(out))
        }
        UpdateMode::Deep
        | UpdateMode::DeepConcat
        | UpdateMode::DeepConcatAll
        | UpdateMode::DeepIgnore
        | UpdateMode::DeepConcatIgnore => {
            as_document(current, "$")?;
            as_document(update, "$")?;
            Ok(deep_merge_with(current, update, mode.combiner()))
        }
    }
}

/// Read a removal payload as a list of key names.
pub fn key_list(update: &Value) -> Result<Vec<&str>> {
    let Value::Array(items) = update else {
        return Err(Error::mismatch("$", "array of keys", update));
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_str().ok_or_else(|| Error::TypeMismatch {
                path: format!("$[{i}]"),
                expected: "string".into(),
                got: kind_of(item).into(),
            })
        })
        .collect()
}
