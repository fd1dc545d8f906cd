//! In-memory document and asset store with JSON snapshots.
//!
//! Backs the CLI and the integration tests. Documents live in nested
//! maps (`collection -> id -> fields`); the whole document set can be
//! loaded from and saved to a JSON file, so a CLI invocation is one
//! load-mutate-save cycle.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use atenea_console::collab::{AssetStore, Document, DocumentStore, FieldFilter};
use atenea_console::error::{ConsoleError, ResourceKind, Result};

#[derive(Default)]
struct Inner {
    collections: HashMap<String, BTreeMap<String, Value>>,
    assets: HashMap<String, Vec<u8>>,
}

/// An in-memory [`DocumentStore`] and [`AssetStore`].
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| ConsoleError::network("memory store", "lock poisoned"))
    }

    /// Inserts or replaces a document.
    pub fn insert(&self, collection: &str, id: &str, fields: Value) -> Result<()> {
        let mut inner = self.lock()?;
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
        Ok(())
    }

    /// Serializes all collections as one JSON object.
    pub fn snapshot(&self) -> Result<Value> {
        let inner = self.lock()?;
        let mut root = Map::new();
        for (collection, docs) in &inner.collections {
            let entries: Map<String, Value> =
                docs.iter().map(|(id, v)| (id.clone(), v.clone())).collect();
            root.insert(collection.clone(), Value::Object(entries));
        }
        Ok(Value::Object(root))
    }

    /// Replaces all collections from a snapshot produced by
    /// [`Self::snapshot`].
    ///
    /// # Errors
    ///
    /// `Decode` when the snapshot is not a two-level JSON object.
    pub fn load_snapshot(&self, snapshot: &Value) -> Result<()> {
        let Some(root) = snapshot.as_object() else {
            return Err(ConsoleError::decode("snapshot", "expected a JSON object"));
        };

        let mut collections = HashMap::new();
        for (collection, docs) in root {
            let Some(docs) = docs.as_object() else {
                return Err(ConsoleError::decode(
                    "snapshot",
                    format!("collection '{collection}' is not an object"),
                ));
            };
            let entries: BTreeMap<String, Value> =
                docs.iter().map(|(id, v)| (id.clone(), v.clone())).collect();
            collections.insert(collection.clone(), entries);
        }

        self.lock()?.collections = collections;
        Ok(())
    }

    /// Loads a snapshot file. A missing file leaves the store empty.
    pub fn load_from_file(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            debug!(path = %path.display(), "no snapshot file, starting empty");
            return Ok(());
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConsoleError::network("snapshot load", e.to_string()))?;
        let snapshot: Value = serde_json::from_str(&raw)
            .map_err(|e| ConsoleError::decode("snapshot", e))?;
        self.load_snapshot(&snapshot)
    }

    /// Writes the current document set to a snapshot file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let snapshot = self.snapshot()?;
        let rendered = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| ConsoleError::decode("snapshot", e))?;
        std::fs::write(path, rendered)
            .map_err(|e| ConsoleError::network("snapshot save", e.to_string()))?;
        debug!(path = %path.display(), "snapshot saved");
        Ok(())
    }

    /// Returns a stored asset's bytes, for tests and inspection.
    pub fn asset(&self, path: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.lock()?.assets.get(path).cloned())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let inner = self.lock()?;
        Ok(inner
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn update(&self, collection: &str, id: &str, fields: Value) -> Result<()> {
        let mut inner = self.lock()?;
        let Some(existing) = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
        else {
            return Err(ConsoleError::not_found(ResourceKind::Document, id));
        };

        let Some(patch) = fields.as_object() else {
            return Err(ConsoleError::decode("update", "fields must be an object"));
        };
        let Some(target) = existing.as_object_mut() else {
            return Err(ConsoleError::decode("update", "document is not an object"));
        };
        // Top-level merge: named fields are replaced, the rest untouched.
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn query(&self, collection: &str, filters: &[FieldFilter]) -> Result<Vec<Document>> {
        let inner = self.lock()?;
        let Some(docs) = inner.collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(docs
            .iter()
            .filter(|(_, fields)| {
                filters
                    .iter()
                    .all(|f| fields.get(f.field) == Some(&f.value))
            })
            .map(|(id, fields)| Document {
                id: id.clone(),
                fields: fields.clone(),
            })
            .collect())
    }
}

#[async_trait]
impl AssetStore for MemoryStore {
    async fn put(&self, path: &str, bytes: Vec<u8>) -> Result<String> {
        self.lock()?.assets.insert(path.to_string(), bytes);
        Ok(format!("memstore://{path}"))
    }
}
