//! Error types for the credential store.

use std::path::PathBuf;

/// Errors that can occur while reading or writing the store files.
///
/// None of these are fatal to the server. Reads cascade
/// primary → backup → defaults, and a failed write leaves the in-memory
/// state serving requests. The errors exist so callers can log them
/// with context.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A filesystem operation failed on the given path.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store document could not be turned into JSON.
    #[error("failed to serialize store: {0}")]
    Serialize(#[source] serde_json::Error),

    /// A store file exists but is not a valid store document
    /// (truncated write, hand-edit gone wrong, etc.).
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
