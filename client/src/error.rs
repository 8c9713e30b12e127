//! Unified error handling for the client.

use crate::config::ConfigError;

/// Client error type.
///
/// Transport, remote and auth failures are passed through from the store
/// unchanged; nothing in this crate retries.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Remote procedure error: {0}")]
    Remote(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Engine error: {0}")]
    Engine(#[from] tether_engine::Error),
}

/// Flat classification of [`Error`], including the engine's variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    TypeMismatch,
    UnsupportedMode,
    Transport,
    Remote,
    Auth,
    Config,
}

impl Error {
    /// The kind of failure, for callers that branch on it.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Error::Transport(_) => ErrorKind::Transport,
            Error::Remote(_) => ErrorKind::Remote,
            Error::Auth(_) => ErrorKind::Auth,
            Error::Config(_) => ErrorKind::Config,
            Error::Engine(tether_engine::Error::TypeMismatch { .. }) => ErrorKind::TypeMismatch,
            Error::Engine(tether_engine::Error::UnsupportedMode(_)) => ErrorKind::UnsupportedMode,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;
