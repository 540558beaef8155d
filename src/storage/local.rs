//! Local filesystem storage implementation.
//!
//! Keeps every key in one JSON object file under the storage directory.
//! Writes go through a temp file and a rename so a crash never leaves a
//! half-written map behind.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::storage::KeyValueStore;

const STORE_FILE: &str = "local_storage.json";

type ItemMap = BTreeMap<String, String>;

/// Local filesystem key/value backend.
pub struct LocalStorage {
    root_dir: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn path(&self) -> PathBuf {
        self.root_dir.join(STORE_FILE)
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        let path = self.path();
        tokio::fs::create_dir_all(&self.root_dir).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Read the item map; a missing file is an empty map.
    async fn read_items(&self) -> Result<ItemMap> {
        match tokio::fs::read(self.path()).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ItemMap::new()),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn write_items(&self, items: &ItemMap) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(items)?;
        self.write_bytes(&bytes).await
    }
}

#[async_trait]
impl KeyValueStore for LocalStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_items().await?.remove(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut items = self.read_items().await?;
        items.insert(key.to_string(), value.to_string());
        self.write_items(&items).await
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut items = self.read_items().await?;
        if items.remove(key).is_some() {
            self.write_items(&items).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_set_get_remove() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage.set_item("isAuthenticated", "true").await.unwrap();
        assert_eq!(
            storage.get_item("isAuthenticated").await.unwrap(),
            Some("true".to_string())
        );

        storage.remove_item("isAuthenticated").await.unwrap();
        assert_eq!(storage.get_item("isAuthenticated").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_read_nonexistent() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("nested"));

        assert!(storage.get_item("nope").await.unwrap().is_none());
        storage.remove_item("nope").await.unwrap();
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        LocalStorage::new(tmp.path())
            .set_item("theme", "dark")
            .await
            .unwrap();

        let reopened = LocalStorage::new(tmp.path());
        assert_eq!(
            reopened.get_item("theme").await.unwrap(),
            Some("dark".to_string())
        );
        assert!(!tmp.path().join("local_storage.tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(STORE_FILE), b"{not json").unwrap();

        let storage = LocalStorage::new(tmp.path());
        assert!(matches!(
            storage.get_item("isAuthenticated").await,
            Err(AppError::Json(_))
        ));
    }
}
