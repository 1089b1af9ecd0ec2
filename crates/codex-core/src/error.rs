//! Error types for the codex core

use thiserror::Error;

/// Result type alias for codex operations
pub type CodexResult<T> = Result<T, CodexError>;

/// Errors surfaced by resolution, lookup and configuration.
#[derive(Error, Debug)]
pub enum CodexError {
    /// A collection name outside the fixed set was requested.
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    /// The remote document could not be fetched and no other tier had data.
    #[error("Data unavailable for {collection}: {reason}")]
    DataUnavailable { collection: String, reason: String },

    #[error("Entity {id} not found in {collection}")]
    EntityNotFound { collection: String, id: String },

    #[error("Override store error: {0}")]
    Store(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for CodexError {
    fn from(err: config::ConfigError) -> Self {
        CodexError::Config(err.to_string())
    }
}

impl CodexError {
    pub(crate) fn unavailable(collection: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        CodexError::DataUnavailable {
            collection: collection.to_string(),
            reason: reason.to_string(),
        }
    }
}
