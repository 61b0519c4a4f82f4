//! Local directory storage, the backend of last resort.

use super::{StorageBackend, StorageError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// Copies staged files into a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the storage directory (and parents). Succeeds if it already exists.
    async fn ensure_dir(&self) -> Result<(), StorageError> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(0o755);

        builder.create(&self.dir).await.map_err(|source| StorageError::CreateDir {
            path: self.dir.clone(),
            source,
        })
    }
}

#[async_trait]
impl StorageBackend for LocalStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn write(&self, source: &Path, name: &str) -> Result<String, StorageError> {
        self.ensure_dir().await?;

        let dest_path = self.dir.join(name);

        let mut src = fs::File::open(source).await.map_err(|e| StorageError::OpenSource {
            path: source.to_path_buf(),
            source: e,
        })?;

        let mut dest = fs::File::create(&dest_path)
            .await
            .map_err(|e| StorageError::CreateDestination {
                path: dest_path.clone(),
                source: e,
            })?;

        let copy_err = |e: std::io::Error| StorageError::Copy {
            path: dest_path.clone(),
            source: e,
        };
        tokio::io::copy(&mut src, &mut dest).await.map_err(copy_err)?;
        // tokio files buffer writes in the background; flush before reporting success
        dest.sync_all().await.map_err(copy_err)?;

        info!(
            file = %name,
            dir = %self.dir().display(),
            "File saved to local storage directory"
        );

        Ok(dest_path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn staged(dir: &Path, bytes: &[u8]) -> PathBuf {
        let path = dir.join("staged.wav");
        fs::write(&path, bytes).await.unwrap();
        path
    }

    #[actix_web::test]
    async fn test_creates_nested_directory_and_copies() {
        let tmp = tempfile::tempdir().unwrap();
        let source = staged(tmp.path(), b"RIFFdata").await;
        let store = LocalStore::new(tmp.path().join("a").join("b"));

        let location = store.write(&source, "01_01_2024_00_00_00.wav").await.unwrap();

        let stored = tmp.path().join("a/b/01_01_2024_00_00_00.wav");
        assert_eq!(location, stored.display().to_string());
        assert_eq!(fs::read(&stored).await.unwrap(), b"RIFFdata");
    }

    #[actix_web::test]
    async fn test_existing_directory_and_file_are_overwritten() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalStore::new(tmp.path().join("out"));
        fs::create_dir_all(store.dir()).await.unwrap();
        fs::write(store.dir().join("same.wav"), b"old contents, longer").await.unwrap();

        let source = staged(tmp.path(), b"new").await;
        store.write(&source, "same.wav").await.unwrap();

        assert_eq!(fs::read(store.dir().join("same.wav")).await.unwrap(), b"new");
    }

    #[actix_web::test]
    async fn test_missing_source_is_open_error() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalStore::new(tmp.path().join("out"));

        let err = store
            .write(&tmp.path().join("missing.wav"), "x.wav")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::OpenSource { .. }));
    }

    #[actix_web::test]
    async fn test_directory_blocked_by_file_is_create_dir_error() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        fs::write(&blocker, b"not a directory").await.unwrap();
        let source = staged(tmp.path(), b"abc").await;

        let store = LocalStore::new(blocker.join("nested"));
        let err = store.write(&source, "x.wav").await.unwrap_err();
        assert!(matches!(err, StorageError::CreateDir { .. }));
    }

    #[actix_web::test]
    async fn test_destination_that_is_a_directory_is_create_error() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalStore::new(tmp.path().join("out"));
        fs::create_dir_all(store.dir().join("taken.wav")).await.unwrap();
        let source = staged(tmp.path(), b"abc").await;

        let err = store.write(&source, "taken.wav").await.unwrap_err();
        assert!(matches!(err, StorageError::CreateDestination { .. }));
    }
}
