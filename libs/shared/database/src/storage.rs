use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Raw byte storage addressed by relative keys such as `uploads/abc.png`.
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Returns `Ok(false)` when nothing was stored under the key.
    async fn delete(&self, key: &str) -> Result<bool, StorageError>;

    async fn exists(&self, key: &str) -> Result<bool, StorageError>;
}

/// Builds `{prefix}/{owner}_{millis}_{object_id}_{name}` with the file name
/// reduced to a safe character set. `object_id` keeps keys distinct when the
/// same owner stores the same name twice within one millisecond.
pub fn storage_key(prefix: &str, owner: Uuid, object_id: Uuid, file_name: &str) -> String {
    let sanitized: String = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let sanitized = sanitized.trim_start_matches('.');
    let name = if sanitized.is_empty() { "upload" } else { sanitized };

    format!(
        "{}/{}_{}_{}_{}",
        prefix,
        owner,
        Utc::now().timestamp_millis(),
        object_id,
        name
    )
}

/// Filesystem storage under an injected root directory.
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let is_plain = !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));

        if !is_plain {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        debug!("Stored {} bytes at {}", bytes.len(), path.display());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(key.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.resolve(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_put_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path());

        storage.put("uploads/scan.png", b"xray").await.unwrap();
        assert!(storage.exists("uploads/scan.png").await.unwrap());
        assert_eq!(storage.get("uploads/scan.png").await.unwrap(), b"xray");

        assert!(storage.delete("uploads/scan.png").await.unwrap());
        assert!(!storage.delete("uploads/scan.png").await.unwrap());
        assert!(!storage.exists("uploads/scan.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path());

        assert_matches!(storage.get("reports/none.pdf").await, Err(StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_keys_cannot_escape_root() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path());

        assert_matches!(storage.put("../outside.txt", b"x").await, Err(StorageError::InvalidKey(_)));
        assert_matches!(storage.exists("/etc/passwd").await, Err(StorageError::InvalidKey(_)));
        assert_matches!(storage.delete("").await, Err(StorageError::InvalidKey(_)));
    }

    #[test]
    fn test_storage_key_sanitizes_file_name() {
        let owner = Uuid::new_v4();
        let image_id = Uuid::new_v4();
        let key = storage_key("uploads", owner, image_id, "../../chest x-ray.png");

        assert!(key.starts_with(&format!("uploads/{}_", owner)));
        assert!(key.ends_with(&format!("_{}_chest_x-ray.png", image_id)));
        assert!(!key.contains(".."));
    }

    #[test]
    fn test_storage_key_falls_back_for_empty_name() {
        let key = storage_key("reports", Uuid::new_v4(), Uuid::new_v4(), "");
        assert!(key.ends_with("_upload"));
    }

    #[test]
    fn test_storage_key_distinct_for_same_owner_and_name() {
        let owner = Uuid::new_v4();
        let first = storage_key("uploads", owner, Uuid::new_v4(), "chest.png");
        let second = storage_key("uploads", owner, Uuid::new_v4(), "chest.png");

        assert_ne!(first, second);
    }
}
