//! On-device key-value storage backends.
//!
//! `FsKvStore` keeps one file per key under a data directory and is the
//! durable store the application runs against. `MemoryKvStore` has the same
//! semantics without touching disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use core_types::{KvStore, StoreError};
use parking_lot::Mutex;

/// File-per-key store rooted at a data directory. Writes go through a
/// sibling temp file and a rename so a key is never observed half-written.
#[derive(Debug, Clone)]
pub struct FsKvStore {
    root: PathBuf,
}

impl FsKvStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.root.join(format!("{key}.kv")))
    }
}

#[async_trait]
impl KvStore for FsKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.entry_path(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.entry_path(key)?;
        tokio::fs::create_dir_all(&self.root).await?;

        let tmp = self.root.join(format!("{key}.kv.tmp"));
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.entry_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

/// Ephemeral store with identical contract, for tests and previews.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        Ok(self.values.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        self.values.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        self.values.lock().remove(key);
        Ok(())
    }
}

// Keys double as file names, so the charset stays conservative.
fn validate_key(key: &str) -> Result<(), StoreError> {
    let acceptable = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if acceptable {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[tokio::test]
    async fn fs_store_round_trips_a_value() {
        let dir = tempdir().expect("tempdir");
        let store = FsKvStore::new(dir.path());

        store.set("NOTES", "[]").await.expect("set");
        let value = store.get("NOTES").await.expect("get");
        assert_eq!(value.as_deref(), Some("[]"));

        store.remove("NOTES").await.expect("remove");
        assert_eq!(store.get("NOTES").await.expect("re-get"), None);
    }

    #[tokio::test]
    async fn fs_store_reads_absent_key_as_none() {
        let dir = tempdir().expect("tempdir");
        let store = FsKvStore::new(dir.path());
        assert_eq!(store.get("missing").await.expect("get"), None);
        store.remove("missing").await.expect("remove is a no-op");
    }

    #[tokio::test]
    async fn fs_store_survives_reopen() {
        let dir = tempdir().expect("tempdir");
        {
            let store = FsKvStore::new(dir.path());
            store.set("themePreference", "dark").await.expect("set");
        }
        let reopened = FsKvStore::new(dir.path());
        let value = reopened.get("themePreference").await.expect("get");
        assert_eq!(value.as_deref(), Some("dark"));
    }

    #[tokio::test]
    async fn fs_store_rejects_path_like_keys() {
        let dir = tempdir().expect("tempdir");
        let store = FsKvStore::new(dir.path());
        let err = store.get("../escape").await.expect_err("must reject");
        assert!(matches!(err, StoreError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn memory_store_matches_contract() {
        let store = MemoryKvStore::new();
        assert_eq!(store.get("userToken").await.expect("get"), None);
        store.set("userToken", "abc").await.expect("set");
        assert_eq!(
            store.get("userToken").await.expect("re-get").as_deref(),
            Some("abc")
        );
        store.remove("userToken").await.expect("remove");
        assert_eq!(store.get("userToken").await.expect("final get"), None);
    }
}
