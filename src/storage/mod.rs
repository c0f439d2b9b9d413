/// Disk-based blob storage
///
/// Persists binary payloads under a configurable base directory. Each
/// payload gets a UUID-named file; derived thumbnails are written as
/// sibling files next to their original.
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    /// Create a new disk storage rooted at `root`. The directory is
    /// created lazily on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist a new payload under a generated UUID name and return the
    /// blob location.
    pub async fn write_new(&self, data: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| Error::Storage(format!("Failed to create storage root: {}", e)))?;

        let path = self.root.join(Uuid::new_v4().to_string());
        fs::write(&path, data)
            .await
            .map_err(|e| Error::Storage(format!("Failed to write blob {}: {}", path.display(), e)))?;

        Ok(path)
    }

    /// Write a derived blob (thumbnail) at an explicit location.
    /// Overwriting an existing derivation is expected and idempotent.
    pub async fn write_at(&self, path: &Path, data: &[u8]) -> Result<()> {
        fs::write(path, data)
            .await
            .map_err(|e| Error::Storage(format!("Failed to write blob {}: {}", path.display(), e)))
    }

    /// Read a blob back; `None` when the file does not exist
    pub async fn read(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match fs::read(path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage(format!(
                "Failed to read blob {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Check whether a blob exists on disk
    pub async fn exists(&self, path: &Path) -> bool {
        fs::metadata(path).await.is_ok()
    }
}

/// Location of the derived thumbnail for `original` at `width` pixels:
/// the original path suffixed with `_<width>`.
pub fn thumbnail_path(original: &Path, width: u32) -> PathBuf {
    let mut name = original.as_os_str().to_os_string();
    name.push(format!("_{}", width));
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_write_new_and_read_round_trip() {
        let dir = tempdir().unwrap();
        let storage = DiskStorage::new(dir.path());

        let data = b"hello blob".to_vec();
        let path = storage.write_new(&data).await.unwrap();

        assert!(path.starts_with(dir.path()));
        assert_eq!(storage.read(&path).await.unwrap(), Some(data));
    }

    #[tokio::test]
    async fn test_write_new_creates_missing_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("nested").join("store");
        let storage = DiskStorage::new(&root);

        let path = storage.write_new(b"payload").await.unwrap();
        assert!(storage.exists(&path).await);
        assert!(root.exists());
    }

    #[tokio::test]
    async fn test_read_missing_blob_is_none() {
        let dir = tempdir().unwrap();
        let storage = DiskStorage::new(dir.path());

        let missing = dir.path().join("nope");
        assert_eq!(storage.read(&missing).await.unwrap(), None);
        assert!(!storage.exists(&missing).await);
    }

    #[tokio::test]
    async fn test_write_at_overwrites() {
        let dir = tempdir().unwrap();
        let storage = DiskStorage::new(dir.path());

        let path = storage.write_new(b"first").await.unwrap();
        storage.write_at(&path, b"second").await.unwrap();

        assert_eq!(storage.read(&path).await.unwrap(), Some(b"second".to_vec()));
    }

    #[test]
    fn test_thumbnail_path_suffix() {
        let path = thumbnail_path(Path::new("/tmp/files_manager/abc"), 500);
        assert_eq!(path, PathBuf::from("/tmp/files_manager/abc_500"));
    }
}
