//! Storage error types.

use thiserror::Error;

/// Failure while moving the registry to or from its stored document.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Malformed group document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid {entity} entry: {source}")]
    InvalidEntry {
        entity: &'static str,
        #[source]
        source: validator::ValidationErrors,
    },

    #[error("Failed to serialize group document: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl StorageError {
    pub(crate) fn invalid(entity: &'static str, source: validator::ValidationErrors) -> Self {
        StorageError::InvalidEntry { entity, source }
    }
}
