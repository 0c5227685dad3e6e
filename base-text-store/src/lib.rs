//! Filesystem blob store for edition base texts.
//!
//! One UTF-8 blob per manifestation at
//! `<root>/base_texts/{expression_id}/{manifestation_id}.txt`. Writes go
//! through a temp file and an atomic rename, so readers never observe a
//! partially written blob. `rollback` removes a blob whose accompanying
//! graph transaction failed.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info, warn};

pub mod errors;

pub use errors::BaseTextError;
use errors::Result;

const BASE_TEXT_DIR: &str = "base_texts";

#[derive(Clone)]
pub struct BaseTextStore {
    root: PathBuf,
}

impl BaseTextStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Stores (or overwrites) the base text for a manifestation.
    ///
    /// # Errors
    /// Returns `BaseTextError::Io` on filesystem failures and
    /// `BaseTextError::InvalidKey` when an id is not a plain path segment.
    pub async fn store(&self, expression_id: &str, manifestation_id: &str, text: &str) -> Result<()> {
        let path = self.blob_path(expression_id, manifestation_id)?;
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_else(|| self.root.clone());
        fs::create_dir_all(&dir).await?;

        let tmp = dir.join(format!(".{manifestation_id}.tmp"));
        fs::write(&tmp, text.as_bytes()).await?;
        fs::rename(&tmp, &path).await?;

        info!(path = %path.display(), bytes = text.len(), "base text stored");
        Ok(())
    }

    /// Reads the whole base text.
    ///
    /// # Errors
    /// `BaseTextError::NotFound` when no blob exists for the pair.
    pub async fn retrieve(&self, expression_id: &str, manifestation_id: &str) -> Result<String> {
        let path = self.blob_path(expression_id, manifestation_id)?;
        match fs::read_to_string(&path).await {
            Ok(text) => Ok(text),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(BaseTextError::NotFound(manifestation_id.to_owned()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Reads the byte slice `[start, end)` of the base text.
    ///
    /// # Errors
    /// `BaseTextError::InvalidSpan` when the range exceeds the text or cuts
    /// through a multi-byte character.
    pub async fn retrieve_slice(
        &self,
        expression_id: &str,
        manifestation_id: &str,
        start: i64,
        end: i64,
    ) -> Result<String> {
        let text = self.retrieve(expression_id, manifestation_id).await?;
        slice_bytes(&text, start, end).map(str::to_owned)
    }

    /// Removes the blob after a failed graph write so storage does not keep
    /// content the graph never saw.
    pub async fn rollback(&self, expression_id: &str, manifestation_id: &str) -> Result<()> {
        let path = self.blob_path(expression_id, manifestation_id)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                warn!(path = %path.display(), "base text rolled back");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "nothing to roll back");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn blob_path(&self, expression_id: &str, manifestation_id: &str) -> Result<PathBuf> {
        for id in [expression_id, manifestation_id] {
            if id.is_empty() || !id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_') {
                return Err(BaseTextError::InvalidKey(id.to_owned()));
            }
        }
        Ok(self
            .root
            .join(BASE_TEXT_DIR)
            .join(expression_id)
            .join(format!("{manifestation_id}.txt")))
    }
}

/// Byte-offset slice of a UTF-8 string.
fn slice_bytes(text: &str, start: i64, end: i64) -> Result<&str> {
    let invalid = || BaseTextError::InvalidSpan { start, end };
    if start < 0 || end < start {
        return Err(invalid());
    }
    let (start, end) = (start as usize, end as usize);
    if end > text.len() {
        return Err(invalid());
    }
    text.get(start..end).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, BaseTextStore) {
        let dir = TempDir::new().unwrap();
        let store = BaseTextStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn store_then_retrieve_round_trips() {
        let (_dir, store) = store();
        store.store("E1", "M1", "0123456789").await.unwrap();
        assert_eq!(store.retrieve("E1", "M1").await.unwrap(), "0123456789");
    }

    #[tokio::test]
    async fn retrieve_slice_matches_byte_range() {
        let (_dir, store) = store();
        store.store("E1", "M1", "0123456789").await.unwrap();
        assert_eq!(store.retrieve_slice("E1", "M1", 2, 5).await.unwrap(), "234");
    }

    #[tokio::test]
    async fn store_overwrites_previous_content() {
        let (_dir, store) = store();
        store.store("E1", "M1", "old").await.unwrap();
        store.store("E1", "M1", "new").await.unwrap();
        assert_eq!(store.retrieve("E1", "M1").await.unwrap(), "new");
    }

    #[tokio::test]
    async fn missing_blob_is_not_found() {
        let (_dir, store) = store();
        assert!(matches!(
            store.retrieve("E1", "M1").await,
            Err(BaseTextError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn rollback_removes_blob_and_is_idempotent() {
        let (_dir, store) = store();
        store.store("E1", "M1", "text").await.unwrap();
        store.rollback("E1", "M1").await.unwrap();
        assert!(store.retrieve("E1", "M1").await.is_err());
        store.rollback("E1", "M1").await.unwrap();
    }

    #[tokio::test]
    async fn path_traversal_keys_are_rejected() {
        let (_dir, store) = store();
        assert!(matches!(
            store.store("../evil", "M1", "x").await,
            Err(BaseTextError::InvalidKey(_))
        ));
    }

    #[test]
    fn slice_rejects_split_characters_and_overruns() {
        assert!(slice_bytes("བོད", 0, 1).is_err());
        assert!(slice_bytes("abc", 1, 9).is_err());
        assert!(slice_bytes("abc", -1, 2).is_err());
        assert_eq!(slice_bytes("abc", 0, 3).unwrap(), "abc");
        assert_eq!(slice_bytes("abc", 3, 3).unwrap(), "");
    }
}
