use thiserror::Error;

/// Errors that can occur while storing or removing media files.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("media file not found: {0}")]
    NotFound(String),
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The relative media path escapes the store root or is otherwise malformed.
    #[error("invalid media path: {0}")]
    InvalidPath(String),
    #[error("media file exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },
}
