use std::path::{Path, PathBuf};

use super::{validate_object_path, BlobStore, StorageError};

/// Serves objects from a local directory tree.
pub struct FilesystemBlobStore {
    root: PathBuf,
}

impl FilesystemBlobStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl BlobStore for FilesystemBlobStore {
    fn download(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        validate_object_path(path)?;
        let full_path = self.root.join(path);

        std::fs::read(&full_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(path.to_string())
            } else {
                StorageError::ReadFile {
                    path: full_path,
                    source: e,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_existing_object() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("athletes/a1")).unwrap();
        std::fs::write(dir.path().join("athletes/a1/proof.jpg"), b"bytes").unwrap();

        let store = FilesystemBlobStore::new(dir.path());
        assert_eq!(store.download("athletes/a1/proof.jpg").unwrap(), b"bytes");
    }

    #[test]
    fn test_download_missing_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemBlobStore::new(dir.path());
        assert!(matches!(
            store.download("nope.jpg"),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_download_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemBlobStore::new(dir.path().join("root"));
        assert!(matches!(
            store.download("../outside.jpg"),
            Err(StorageError::InvalidPath { .. })
        ));
    }
}
