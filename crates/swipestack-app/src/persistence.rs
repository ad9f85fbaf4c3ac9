//! Tombstone persistence bridges.
//!
//! Persistence is opt-in: the listener only saves and restores undo history
//! when a [`TombstonePersistence`] handle is injected. Both provided bridges
//! store a versioned JSON document per key and require the card type to be
//! serializable.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use swipestack_core::{CardItem, PersistenceError, Tombstone};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Current on-disk document version.
pub const DOCUMENT_VERSION: u32 = 1;

/// Keyed storage for undo history.
#[async_trait]
pub trait TombstonePersistence<T: CardItem>: Send + Sync {
    /// Store `tombstones` (oldest first) under `key`, replacing what was there.
    async fn save(&self, key: &str, tombstones: &[Tombstone<T>]) -> Result<(), PersistenceError>;

    /// Load tombstones stored under `key`. A missing key yields an empty list.
    async fn load(&self, key: &str) -> Result<Vec<Tombstone<T>>, PersistenceError>;

    /// Forget anything stored under `key`. Clearing a missing key succeeds.
    async fn clear(&self, key: &str) -> Result<(), PersistenceError>;
}

#[derive(Serialize)]
struct DocumentRef<'a, T: CardItem + Serialize>
where
    T::Id: Serialize,
{
    version: u32,
    tombstones: &'a [Tombstone<T>],
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned, T::Id: DeserializeOwned"))]
struct Document<T: CardItem> {
    version: u32,
    tombstones: Vec<Tombstone<T>>,
}

/// Encode tombstones as a versioned JSON document.
pub fn encode_tombstones<T>(tombstones: &[Tombstone<T>]) -> Result<Vec<u8>, PersistenceError>
where
    T: CardItem + Serialize,
    T::Id: Serialize,
{
    serde_json::to_vec(&DocumentRef {
        version: DOCUMENT_VERSION,
        tombstones,
    })
    .map_err(|e| PersistenceError::serialization(e.to_string()))
}

/// Decode a document produced by [`encode_tombstones`].
pub fn decode_tombstones<T>(bytes: &[u8]) -> Result<Vec<Tombstone<T>>, PersistenceError>
where
    T: CardItem + DeserializeOwned,
    T::Id: DeserializeOwned,
{
    let document: Document<T> = serde_json::from_slice(bytes)
        .map_err(|e| PersistenceError::serialization(e.to_string()))?;
    if document.version != DOCUMENT_VERSION {
        return Err(PersistenceError::serialization(format!(
            "unsupported tombstone document version {}",
            document.version
        )));
    }
    Ok(document.tombstones)
}

// ─── In-memory bridge ────────────────────────────────────

/// In-process store. Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    documents: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryPersistence {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether anything is stored under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.documents.lock().contains_key(key)
    }

    /// Raw document stored under `key`.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.documents.lock().get(key).cloned()
    }
}

#[async_trait]
impl<T> TombstonePersistence<T> for MemoryPersistence
where
    T: CardItem + Serialize + DeserializeOwned,
    T::Id: Serialize + DeserializeOwned,
{
    async fn save(&self, key: &str, tombstones: &[Tombstone<T>]) -> Result<(), PersistenceError> {
        let bytes = encode_tombstones(tombstones)?;
        self.documents.lock().insert(key.to_string(), bytes);
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Vec<Tombstone<T>>, PersistenceError> {
        match self.raw(key) {
            Some(bytes) => decode_tombstones(&bytes),
            None => Ok(Vec::new()),
        }
    }

    async fn clear(&self, key: &str) -> Result<(), PersistenceError> {
        self.documents.lock().remove(key);
        Ok(())
    }
}

// ─── JSON file bridge ────────────────────────────────────

/// One JSON document per key inside a directory.
///
/// Writes go to a temporary file that is then renamed over the target.
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    dir: PathBuf,
}

impl JsonFilePersistence {
    /// Store documents under `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the documents.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path used for `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file}.json"))
    }

    async fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir).await.map_err(|e| {
            PersistenceError::storage(format!("Failed to create directory: {e}"))
        })?;

        let temp_path = path.with_extension("json.tmp");
        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| PersistenceError::storage(format!("Failed to create temp file: {e}")))?;
        file.write_all(data)
            .await
            .map_err(|e| PersistenceError::storage(format!("Failed to write data: {e}")))?;
        file.sync_all()
            .await
            .map_err(|e| PersistenceError::storage(format!("Failed to sync: {e}")))?;

        fs::rename(&temp_path, path)
            .await
            .map_err(|e| PersistenceError::storage(format!("Failed to rename temp file: {e}")))
    }
}

#[async_trait]
impl<T> TombstonePersistence<T> for JsonFilePersistence
where
    T: CardItem + Serialize + DeserializeOwned,
    T::Id: Serialize + DeserializeOwned,
{
    async fn save(&self, key: &str, tombstones: &[Tombstone<T>]) -> Result<(), PersistenceError> {
        let bytes = encode_tombstones(tombstones)?;
        let path = self.path_for(key);
        self.write_atomic(&path, &bytes).await?;
        tracing::debug!(key, path = %path.display(), count = tombstones.len(), "saved tombstones");
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Vec<Tombstone<T>>, PersistenceError> {
        match fs::read(self.path_for(key)).await {
            Ok(bytes) => decode_tombstones(&bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(PersistenceError::storage(format!(
                "Failed to read tombstones: {e}"
            ))),
        }
    }

    async fn clear(&self, key: &str) -> Result<(), PersistenceError> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PersistenceError::storage(format!(
                "Failed to remove tombstones: {e}"
            ))),
        }
    }
}
