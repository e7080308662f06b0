//! Blob stores holding uploaded proof images.

pub mod filesystem;
pub mod http;

pub use crate::error::StorageError;
pub use filesystem::FilesystemBlobStore;
pub use http::HttpBlobStore;

/// Read access to stored proof images.
///
/// Implementations block; the pipeline bounds each call with its own timeout.
pub trait BlobStore: Send + Sync {
    /// Fetches the object at `path` (relative to the store's root or bucket).
    fn download(&self, path: &str) -> Result<Vec<u8>, StorageError>;
}

/// Rejects paths that could escape the store root.
pub(crate) fn validate_object_path(path: &str) -> Result<(), StorageError> {
    let invalid = |reason: &str| StorageError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    if path.trim().is_empty() {
        return Err(invalid("empty path"));
    }
    if path.starts_with('/') || path.starts_with('\\') || path.contains(':') {
        return Err(invalid("absolute paths are not allowed"));
    }
    if path.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(invalid("parent directory segments are not allowed"));
    }
    Ok(())
}
