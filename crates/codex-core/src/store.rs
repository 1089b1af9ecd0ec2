//! Override store: sled-backed collections written by the admin surface.
//! One record per collection under its storage key; value is a JSON array of entities.

use crate::collection::CollectionKey;
use crate::entity::{entities_from_values, Entity};
use crate::error::CodexResult;
use serde_json::Value;
use std::path::Path;

const OVERRIDE_TREE: &str = "overrides";

/// Persisted overrides. The resolver only reads; `replace`/`clear` exist for the
/// administrative surface and for seeding.
pub struct OverrideStore {
    tree: sled::Tree,
}

impl OverrideStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> CodexResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(&db)
    }

    /// In-memory store that disappears on drop.
    pub fn temporary() -> CodexResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(&db)
    }

    fn from_db(db: &sled::Db) -> CodexResult<Self> {
        Ok(Self {
            tree: db.open_tree(OVERRIDE_TREE)?,
        })
    }

    /// Entities stored for `key`. Missing, unreadable, or non-array records read as empty.
    pub fn read(&self, key: CollectionKey) -> Vec<Entity> {
        let raw = match self.tree.get(key.storage_key().as_bytes()) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(target: "codex::store", collection = %key, error = %e, "Override store read failed");
                return Vec::new();
            }
        };
        match serde_json::from_slice::<Value>(&raw) {
            Ok(Value::Array(items)) => entities_from_values(items),
            Ok(_) => {
                tracing::warn!(target: "codex::store", collection = %key, "Override record is not an array; ignoring");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(target: "codex::store", collection = %key, error = %e, "Override record is not valid JSON; ignoring");
                Vec::new()
            }
        }
    }

    pub fn has_data(&self, key: CollectionKey) -> bool {
        !self.read(key).is_empty()
    }

    /// Overwrite the record for `key`.
    pub fn replace(&self, key: CollectionKey, entities: &[Entity]) -> CodexResult<()> {
        let bytes = serde_json::to_vec(entities)?;
        self.tree.insert(key.storage_key().as_bytes(), bytes)?;
        self.tree.flush()?;
        Ok(())
    }

    /// Write raw bytes for `key`, bypassing validation. Used to import records verbatim.
    pub fn replace_raw(&self, key: CollectionKey, bytes: &[u8]) -> CodexResult<()> {
        self.tree.insert(key.storage_key().as_bytes(), bytes)?;
        self.tree.flush()?;
        Ok(())
    }

    pub fn clear(&self, key: CollectionKey) -> CodexResult<()> {
        self.tree.remove(key.storage_key().as_bytes())?;
        Ok(())
    }

    pub fn flush(&self) -> CodexResult<()> {
        self.tree.flush()?;
        Ok(())
    }
}
