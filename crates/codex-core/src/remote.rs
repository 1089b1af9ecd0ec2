//! Remote documents: the static JSON baseline for each collection.
//! `HttpRemote` fetches over reqwest; `FileRemote` reads the same layout from disk.

use crate::collection::CollectionKey;
use crate::error::{CodexError, CodexResult};
use crate::ship::normalize_ships;
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

/// Source of the static document for a collection. The fetch is the only
/// suspension point of a resolution.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Human-readable location of the document for `key` (URL or path).
    fn location(&self, key: CollectionKey) -> String;

    /// Fetch and decode the whole document for `key`.
    async fn fetch(&self, key: CollectionKey) -> CodexResult<Value>;
}

/// Fetches `{base_url}/{endpoint}` with a plain GET.
pub struct HttpRemote {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRemote {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> CodexResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CodexError::Config(format!("http client: {}", e)))?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }
}

#[async_trait]
impl RemoteSource for HttpRemote {
    fn location(&self, key: CollectionKey) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key.endpoint())
    }

    async fn fetch(&self, key: CollectionKey) -> CodexResult<Value> {
        let url = self.location(key);
        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CodexError::unavailable(key, e))?;

        let status = res.status();
        if !status.is_success() {
            return Err(CodexError::unavailable(key, format!("HTTP {} from {}", status, url)));
        }

        res.json::<Value>()
            .await
            .map_err(|e| CodexError::unavailable(key, format!("decode {}: {}", url, e)))
    }
}

/// Reads `{root}/{endpoint}` from the local filesystem.
pub struct FileRemote {
    root: PathBuf,
}

impl FileRemote {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl RemoteSource for FileRemote {
    fn location(&self, key: CollectionKey) -> String {
        self.root.join(key.endpoint()).display().to_string()
    }

    async fn fetch(&self, key: CollectionKey) -> CodexResult<Value> {
        let path = self.root.join(key.endpoint());
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| CodexError::unavailable(key, format!("{}: {}", path.display(), e)))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| CodexError::unavailable(key, format!("decode {}: {}", path.display(), e)))
    }
}

/// Item array of a remote document.
///
/// Ships under a `ships` field are normalized; a bare top-level array is taken as-is;
/// otherwise the collection's field is used, defaulting to empty.
pub fn items_from_document(key: CollectionKey, doc: Value) -> Vec<Value> {
    match doc {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove(key.items_field()) {
            Some(Value::Array(items)) if key == CollectionKey::Ships => normalize_ships(items),
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}
