//! Inbound message store: where raw emails live between receipt and reply.
//!
//! The agent never speaks a mail protocol itself; some upstream receiver
//! (MTA rule, gateway, sync job) deposits each raw message under
//! `emails/<message_id>` and the agent fetches it by id.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::StoreError;

/// Subdirectory raw messages are stored under, keyed by message id.
const EMAILS_PREFIX: &str = "emails";

/// Read access to stored raw emails.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Fetch the raw bytes of a stored message.
    async fn fetch(&self, message_id: &str) -> Result<Vec<u8>, StoreError>;

    /// List ids of all currently stored messages.
    async fn list(&self) -> Result<Vec<String>, StoreError>;

    /// Remove a message after its reply attempt completed.
    async fn remove(&self, message_id: &str) -> Result<(), StoreError>;
}

/// Filesystem-backed message store rooted at a spool directory.
pub struct SpoolStore {
    root: PathBuf,
}

impl SpoolStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the `emails/` subdirectory if missing.
    pub async fn ensure_dirs(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(self.root.join(EMAILS_PREFIX)).await
    }

    fn path_for(&self, message_id: &str) -> Result<PathBuf, StoreError> {
        // Message ids become file names; reject anything that would
        // escape the spool directory.
        if message_id.is_empty() || message_id.contains('/') || message_id.contains("..") {
            return Err(StoreError::ReadFailed {
                message_id: message_id.to_string(),
                reason: "invalid message id".into(),
            });
        }
        Ok(self.root.join(EMAILS_PREFIX).join(message_id))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl MessageStore for SpoolStore {
    async fn fetch(&self, message_id: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.path_for(message_id)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound {
                message_id: message_id.to_string(),
            }),
            Err(e) => Err(StoreError::ReadFailed {
                message_id: message_id.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        let dir = self.root.join(EMAILS_PREFIX);
        let mut entries = tokio::fs::read_dir(&dir).await.map_err(|e| {
            StoreError::ReadFailed {
                message_id: String::new(),
                reason: format!("cannot read {}: {e}", dir.display()),
            }
        })?;

        let mut ids = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            if entry.file_type().await.is_ok_and(|t| t.is_file())
                && let Some(name) = entry.file_name().to_str()
            {
                ids.push(name.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn remove(&self, message_id: &str) -> Result<(), StoreError> {
        let path = self.path_for(message_id)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| StoreError::ReadFailed {
                message_id: message_id.to_string(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn spool_with(files: &[(&str, &str)]) -> (tempfile::TempDir, SpoolStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SpoolStore::new(dir.path());
        store.ensure_dirs().await.unwrap();
        for (name, content) in files {
            tokio::fs::write(dir.path().join(EMAILS_PREFIX).join(name), content)
                .await
                .unwrap();
        }
        (dir, store)
    }

    #[tokio::test]
    async fn fetch_returns_stored_bytes() {
        let (_dir, store) = spool_with(&[("m1", "raw email bytes")]).await;
        let bytes = store.fetch("m1").await.unwrap();
        assert_eq!(bytes, b"raw email bytes");
    }

    #[tokio::test]
    async fn fetch_missing_is_not_found() {
        let (_dir, store) = spool_with(&[]).await;
        let err = store.fetch("nope").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn fetch_rejects_path_escapes() {
        let (_dir, store) = spool_with(&[]).await;
        assert!(store.fetch("../secret").await.is_err());
        assert!(store.fetch("a/b").await.is_err());
        assert!(store.fetch("").await.is_err());
    }

    #[tokio::test]
    async fn list_returns_sorted_ids() {
        let (_dir, store) = spool_with(&[("b", "x"), ("a", "y")]).await;
        assert_eq!(store.list().await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn remove_deletes_message() {
        let (_dir, store) = spool_with(&[("m1", "x")]).await;
        store.remove("m1").await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }
}
