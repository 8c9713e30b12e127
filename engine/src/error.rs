//! Error types for the tether engine.

use thiserror::Error;

/// All possible errors from the merge engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unsupported update mode: {0}")]
    UnsupportedMode(String),

    #[error("type mismatch at '{path}': expected {expected}, got {got}")]
    TypeMismatch {
        path: String,
        expected: String,
        got: String,
    },
}

impl Error {
    /// Build a [`Error::TypeMismatch`] from the offending value.
    pub fn mismatch(path: &str, expected: &str, got: &serde_json::Value) -> Self {
        Error::TypeMismatch {
            path: path.to_string(),
            expected: expected.to_string(),
            got: kind_of(got).to_string(),
        }
    }
}

/// Short JSON type name, used in error messages.
pub(crate) fn kind_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
