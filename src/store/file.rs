//! File-backed character collection.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::domain::Character;
use crate::store::{CharacterCollection, CollectionError};

/// A concurrent collection persisted to a JSON file.
///
/// Records live in memory keyed by name. An insert only becomes visible
/// once the file holding it has been written. Without a path the
/// collection is memory-only.
pub struct FileCollection {
    name: String,
    records: Arc<DashMap<String, Character>>,
    path: Option<PathBuf>,
    /// Held from the duplicate check until the record is committed.
    write_lock: Arc<Mutex<()>>,
}

impl FileCollection {
    /// Create an empty collection.
    pub fn new(name: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self {
            name: name.into(),
            records: Arc::new(DashMap::new()),
            path,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Open a collection, loading existing records when the file exists.
    pub fn open(name: impl Into<String>, path: &Path) -> Result<Self, CollectionError> {
        let collection = Self::new(name, Some(path.to_path_buf()));
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        if path.exists() {
            let content = std::fs::read(path)?;
            let records: Vec<Character> = serde_json::from_slice(&content)?;
            for record in records {
                collection.records.insert(record.name.clone(), record);
            }
            tracing::info!(
                collection = %collection.name,
                path = %path.display(),
                records = collection.records.len(),
                "Loaded characters from store file"
            );
        }
        Ok(collection)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Serialize the current records plus `pending`, ordered by id then name.
    fn snapshot_with(&self, pending: &Character) -> Result<Vec<u8>, CollectionError> {
        let mut snapshot: Vec<Character> = self
            .records
            .iter()
            .map(|r| r.value().clone())
            .chain(std::iter::once(pending.clone()))
            .collect();
        snapshot.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.name.cmp(&b.name)));
        Ok(serde_json::to_vec_pretty(&snapshot)?)
    }

    fn check_duplicate(&self, character: &Character) -> Result<(), CollectionError> {
        if self.records.contains_key(&character.name) {
            return Err(CollectionError::DuplicateKey(format!("name {}", character.name)));
        }
        if character.id != 0 && self.records.iter().any(|r| r.value().id == character.id) {
            return Err(CollectionError::DuplicateKey(format!("id {}", character.id)));
        }
        Ok(())
    }
}

/// Replace `path` with `bytes` through a sibling temp file, so readers see
/// either the old document or the new one.
async fn write_atomically(path: &Path, bytes: Vec<u8>) -> Result<(), CollectionError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    if let Err(e) = tokio::fs::write(&tmp, bytes).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

#[async_trait]
impl CharacterCollection for FileCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find_one(&self, name: &str) -> Result<Character, CollectionError> {
        self.records
            .get(name)
            .map(|r| r.value().clone())
            .ok_or(CollectionError::NotFound)
    }

    async fn insert_one(&self, character: &Character) -> Result<(), CollectionError> {
        let guard = self.write_lock.clone().lock_owned().await;
        self.check_duplicate(character)?;

        let Some(path) = self.path.clone() else {
            self.records.insert(character.name.clone(), character.clone());
            return Ok(());
        };

        let bytes = self.snapshot_with(character)?;
        let records = self.records.clone();
        let character = character.clone();

        // The commit runs detached so a caller that gives up cannot leave
        // the file and the map disagreeing.
        let commit = tokio::spawn(async move {
            let _guard = guard;
            write_atomically(&path, bytes).await?;
            records.insert(character.name.clone(), character);
            Ok::<(), CollectionError>(())
        });

        commit
            .await
            .map_err(|e| CollectionError::Unavailable(format!("store commit aborted: {e}")))?
    }
}
