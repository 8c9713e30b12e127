//! Configuration for listed-record paths and identity fields.

use serde::{Deserialize, Serialize};
use std::env;

/// Client options, read once when a [`crate::Client`] is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Separator between a list path and a record id
    #[serde(rename = "splitChar")]
    pub split_char: char,
    /// Store full record paths in lists instead of bare ids
    #[serde(rename = "datasetRecordFullPaths")]
    pub full_paths: bool,
    /// Field holding a record's own id; `None` disables the identity field
    #[serde(rename = "datasetRecordIdKey")]
    pub id_key: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            split_char: '/',
            full_paths: true,
            id_key: Some("id".to_string()),
        }
    }
}

impl ClientConfig {
    pub fn with_split_char(mut self, split_char: char) -> Self {
        self.split_char = split_char;
        self
    }

    pub fn with_full_paths(mut self, full_paths: bool) -> Self {
        self.full_paths = full_paths;
        self
    }

    pub fn with_id_key(mut self, id_key: Option<&str>) -> Self {
        self.id_key = id_key.map(str::to_string);
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Unset variables keep their defaults. An empty `TETHER_ID_KEY`
    /// disables the identity field.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(raw) = env::var("TETHER_SPLIT_CHAR") {
            let mut chars = raw.chars();
            config.split_char = match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => return Err(ConfigError::InvalidSplitChar(raw)),
            };
        }

        if let Ok(raw) = env::var("TETHER_FULL_PATHS") {
            config.full_paths = raw
                .parse()
                .map_err(|_| ConfigError::InvalidFullPaths(raw.clone()))?;
        }

        if let Ok(raw) = env::var("TETHER_ID_KEY") {
            config.id_key = (!raw.is_empty()).then_some(raw);
        }

        Ok(config)
    }

    /// Load a `.env` file if present, then read the environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// `<list_path><split_char><id>`
    pub fn record_path(&self, list_path: &str, id: &str) -> String {
        format!("{}{}{}", list_path, self.split_char, id)
    }

    /// The list entry that tracks a record: its full path or its bare id.
    pub fn list_entry<'a>(&self, record_path: &'a str, id: &'a str) -> &'a str {
        if self.full_paths {
            record_path
        } else {
            id
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("TETHER_SPLIT_CHAR must be a single character, got '{0}'")]
    InvalidSplitChar(String),

    #[error("TETHER_FULL_PATHS must be 'true' or 'false', got '{0}'")]
    InvalidFullPaths(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.split_char, '/');
        assert!(config.full_paths);
        assert_eq!(config.id_key.as_deref(), Some("id"));
    }

    #[test]
    fn paths_and_entries() {
        let config = ClientConfig::default();
        let path = config.record_path("acme/users", "u1");
        assert_eq!(path, "acme/users/u1");
        assert_eq!(config.list_entry(&path, "u1"), "acme/users/u1");

        let config = config.with_split_char('.').with_full_paths(false);
        let path = config.record_path("users", "u1");
        assert_eq!(path, "users.u1");
        assert_eq!(config.list_entry(&path, "u1"), "u1");
    }

    #[test]
    fn deserialize_with_partial_options() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"splitChar": ":", "datasetRecordIdKey": "_id"}"#).unwrap();
        assert_eq!(config.split_char, ':');
        assert!(config.full_paths);
        assert_eq!(config.id_key.as_deref(), Some("_id"));
    }

    // Single test touching the process environment, so no other test races it.
    #[test]
    fn from_env_overrides_and_validation() {
        env::set_var("TETHER_SPLIT_CHAR", "|");
        env::set_var("TETHER_FULL_PATHS", "false");
        env::set_var("TETHER_ID_KEY", "");
        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.split_char, '|');
        assert!(!config.full_paths);
        assert_eq!(config.id_key, None);

        env::set_var("TETHER_SPLIT_CHAR", "::");
        assert_eq!(
            ClientConfig::from_env(),
            Err(ConfigError::InvalidSplitChar("::".into()))
        );

        env::set_var("TETHER_SPLIT_CHAR", "/");
        env::set_var("TETHER_FULL_PATHS", "yes");
        assert_eq!(
            ClientConfig::from_env(),
            Err(ConfigError::InvalidFullPaths("yes".into()))
        );

        env::remove_var("TETHER_SPLIT_CHAR");
        env::remove_var("TETHER_FULL_PATHS");
        env::remove_var("TETHER_ID_KEY");
    }
}
