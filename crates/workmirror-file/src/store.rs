//! One JSON document per external id, grouped by collection.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use workmirror_core::error::StoreError;
use workmirror_core::{
    Collection, Error, ExternalId, MirrorDocument, MirrorStore, Result, UpsertOutcome,
};

fn map_io(err: std::io::Error) -> StoreError {
    StoreError::Io {
        message: err.to_string(),
    }
}

/// Filesystem-backed mirror store.
///
/// Layout: `<root>/collections/<collection>/<external_id>.json`. Writes go
/// through a temp file and a rename under a per-collection exclusive lock,
/// so every upsert is atomic per key, across tasks and processes.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a new file store at the given root directory.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Get the root directory path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, collection: &Collection) -> PathBuf {
        self.root.join("collections").join(collection.as_str())
    }

    fn document_path(&self, collection: &Collection, id: ExternalId) -> PathBuf {
        self.collection_dir(collection).join(format!("{}.json", id))
    }

    /// Take the collection's write lock, creating the directory if needed.
    ///
    /// The lock is released when the returned file is dropped.
    fn lock(&self, collection: &Collection) -> Result<File> {
        let dir = self.collection_dir(collection);
        fs::create_dir_all(&dir).map_err(map_io)?;

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(dir.join(".lock"))
            .map_err(map_io)?;

        lock_file.lock_exclusive().map_err(map_io)?;
        Ok(lock_file)
    }

    fn read_fields(
        &self,
        collection: &Collection,
        id: ExternalId,
    ) -> Result<Option<Map<String, Value>>> {
        let path = self.document_path(collection, id);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(map_io(e).into()),
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(fields)) => Ok(Some(fields)),
            Ok(_) => Err(corrupt(collection, id, "document is not a JSON object").into()),
            Err(e) => Err(corrupt(collection, id, e.to_string()).into()),
        }
    }

    fn write_fields(
        &self,
        collection: &Collection,
        id: ExternalId,
        fields: &Map<String, Value>,
    ) -> Result<()> {
        let path = self.document_path(collection, id);
        let content = serde_json::to_string_pretty(fields)
            .map_err(|e| corrupt(collection, id, e.to_string()))?;

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content).map_err(map_io)?;
        fs::rename(&temp_path, &path).map_err(map_io)?;
        Ok(())
    }

    fn decode(
        collection: &Collection,
        id: ExternalId,
        fields: Map<String, Value>,
    ) -> Result<MirrorDocument> {
        serde_json::from_value(Value::Object(fields))
            .map_err(|e| corrupt(collection, id, e.to_string()).into())
    }
}

fn corrupt(collection: &Collection, id: ExternalId, message: impl Into<String>) -> StoreError {
    StoreError::Corrupt {
        collection: collection.to_string(),
        id: id.to_string(),
        message: message.into(),
    }
}

#[async_trait]
impl MirrorStore for FileStore {
    #[instrument(skip(self, fields), fields(%collection, %id))]
    async fn upsert(
        &self,
        collection: &Collection,
        id: ExternalId,
        fields: Map<String, Value>,
    ) -> Result<UpsertOutcome> {
        let lock = self.lock(collection)?;

        let (mut document, outcome) = match self.read_fields(collection, id) {
            Ok(Some(existing)) => (existing, UpsertOutcome::Updated),
            Ok(None) => (Map::new(), UpsertOutcome::Inserted),
            Err(Error::Store(e @ StoreError::Corrupt { .. })) => {
                warn!(error = %e, "overwriting unreadable document");
                (Map::new(), UpsertOutcome::Updated)
            }
            Err(e) => return Err(e),
        };
        document.extend(fields);
        self.write_fields(collection, id, &document)?;

        lock.unlock().map_err(map_io)?;
        debug!(?outcome, "stored document");
        Ok(outcome)
    }

    async fn get(
        &self,
        collection: &Collection,
        id: ExternalId,
    ) -> Result<Option<MirrorDocument>> {
        self.read_fields(collection, id)?
            .map(|fields| Self::decode(collection, id, fields))
            .transpose()
    }

    #[instrument(skip(self))]
    async fn list(&self, collection: &Collection) -> Result<Vec<MirrorDocument>> {
        let dir = self.collection_dir(collection);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(map_io(e).into()),
        };

        let mut ids: Vec<ExternalId> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|p| p.file_stem()?.to_str()?.parse().ok())
            .collect();
        ids.sort();

        let mut documents = Vec::with_capacity(ids.len());
        for id in ids {
            match self.get(collection, id).await {
                Ok(Some(doc)) => documents.push(doc),
                Ok(None) => {}
                Err(e) => warn!(%id, error = %e, "skipping unreadable document"),
            }
        }

        Ok(documents)
    }
}
