/// Errors from file store operations.
///
/// Absence of a file is not an error: lookups return `Ok(None)` instead.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The caller-supplied name failed validation. Raised before any
    /// filesystem access.
    #[error("invalid file name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    /// A file with this name exists and the store rejects overwrites.
    #[error("file already exists: {0}")]
    AlreadyExists(String),

    /// I/O error from the underlying storage medium.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the error was caused by the caller rather than the medium.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidName { .. } | Self::AlreadyExists(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
