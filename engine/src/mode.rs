//! Update modes.

use crate::merge::{Combiner, ConcatAll, ConcatIgnore, ConcatScalars, IgnoreSentinel, NoOpinion};
use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How an update payload is applied to an existing document.
///
/// The set is closed: parsing any other tag fails with
/// [`Error::UnsupportedMode`] before any I/O happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UpdateMode {
    /// Replace the whole document with the payload
    Overwrite,
    /// Replace top-level keys present in the payload (default)
    #[default]
    Shallow,
    /// Recursive merge of mappings, everything else replaced
    Deep,
    /// Deep merge, appending to sequences of scalars
    DeepConcat,
    /// Deep merge, appending to every sequence
    DeepConcatAll,
    /// Deep merge, keeping values where the payload holds the ignore sentinel
    DeepIgnore,
    /// Scalar-sequence concat first, then the ignore sentinel
    DeepConcatIgnore,
    /// Payload is a list of top-level keys to delete
    RemoveKeys,
}

impl UpdateMode {
    /// Every supported mode, in declaration order.
    pub const ALL: [UpdateMode; 8] = [
        UpdateMode::Overwrite,
        UpdateMode::Shallow,
        UpdateMode::Deep,
        UpdateMode::DeepConcat,
        UpdateMode::DeepConcatAll,
        UpdateMode::DeepIgnore,
        UpdateMode::DeepConcatIgnore,
        UpdateMode::RemoveKeys,
    ];

    /// The wire tag of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateMode::Overwrite => "overwrite",
            UpdateMode::Shallow => "shallow",
            UpdateMode::Deep => "deep",
            UpdateMode::DeepConcat => "deepConcat",
            UpdateMode::DeepConcatAll => "deepConcatAll",
            UpdateMode::DeepIgnore => "deepIgnore",
            UpdateMode::DeepConcatIgnore => "deepConcatIgnore",
            UpdateMode::RemoveKeys => "removeKeys",
        }
    }

    /// Whether this mode recurses into nested mappings.
    pub fn is_deep(&self) -> bool {
        matches!(
            self,
            UpdateMode::Deep
                | UpdateMode::DeepConcat
                | UpdateMode::DeepConcatAll
                | UpdateMode::DeepIgnore
                | UpdateMode::DeepConcatIgnore
        )
    }

    /// The combiner strategy consulted at every merged position.
    ///
    /// Non-deep modes never recurse, so they get [`NoOpinion`].
    pub fn combiner(&self) -> &'static dyn Combiner {
        match self {
            UpdateMode::Overwrite
            | UpdateMode::Shallow
            | UpdateMode::Deep
            | UpdateMode::RemoveKeys => &NoOpinion,
            UpdateMode::DeepConcat => &ConcatScalars,
            UpdateMode::DeepConcatAll => &ConcatAll,
            UpdateMode::DeepIgnore => &IgnoreSentinel,
            UpdateMode::DeepConcatIgnore => &ConcatIgnore,
        }
    }
}

impl fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpdateMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UpdateMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| Error::UnsupportedMode(s.to_string()))
    }
}
