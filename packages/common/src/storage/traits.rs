use async_trait::async_trait;

use super::error::StorageError;

/// Storage for uploaded media files, addressed by relative paths such as
/// `plants/main/<sha256>.png`.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store `data` inside `folder` and return the relative path it is reachable at.
    ///
    /// Identical content stored in the same folder resolves to the same path.
    async fn save(&self, folder: &str, extension: &str, data: &[u8])
    -> Result<String, StorageError>;

    /// Read a stored file back.
    async fn read(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    async fn exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Delete a stored file.
    ///
    /// Returns `true` if the file was deleted, `false` if it did not exist.
    async fn delete(&self, path: &str) -> Result<bool, StorageError>;
}
