#![allow(dead_code)]

use async_trait::async_trait;
use codex_core::{
    CodexError, CodexResult, CollectionKey, Entity, OverrideStore, RemoteSource, ResolutionCache,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory remote that counts fetches and can be switched offline.
#[derive(Default)]
pub struct StaticRemote {
    docs: Mutex<HashMap<CollectionKey, Value>>,
    offline: AtomicBool,
    fetches: AtomicUsize,
}

impl StaticRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_doc(self: Arc<Self>, key: CollectionKey, doc: Value) -> Arc<Self> {
        self.set_doc(key, doc);
        self
    }

    pub fn set_doc(&self, key: CollectionKey, doc: Value) {
        self.docs.lock().unwrap().insert(key, doc);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteSource for StaticRemote {
    fn location(&self, key: CollectionKey) -> String {
        format!("memory://{}", key.endpoint())
    }

    async fn fetch(&self, key: CollectionKey) -> CodexResult<Value> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(CodexError::DataUnavailable {
                collection: key.to_string(),
                reason: "offline".to_string(),
            });
        }
        self.docs
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or_else(|| CodexError::DataUnavailable {
                collection: key.to_string(),
                reason: "HTTP 404 Not Found".to_string(),
            })
    }
}

pub fn entity(v: Value) -> Entity {
    Entity::from_value(v).expect("fixture must be an object")
}

pub fn cache_with(store: Arc<OverrideStore>, remote: Arc<StaticRemote>) -> Arc<ResolutionCache> {
    Arc::new(ResolutionCache::with_ttl(store, remote, Duration::from_secs(300)))
}

/// Legacy-shaped ship document as served by the static site.
pub fn ships_doc() -> Value {
    json!({
        "ships": [
            {
                "id": 1,
                "name": "Starling",
                "type": "fighter",
                "system": "sol",
                "level": 5,
                "hull": 80,
                "speed": 120,
                "weaponSlots": 2,
                "shieldSlots": 1,
                "credits": 5000,
                "tier": 1,
                "class": "Light",
                "featured": true,
                "description": "Nimble interceptor"
            },
            {
                "id": 2,
                "name": "Bulwark",
                "type": "tank",
                "system": "vega",
                "level": 20,
                "hull": 400,
                "speed": 100,
                "weaponSlots": 4,
                "shieldSlots": 4,
                "credits": 40001,
                "tier": 3,
                "class": "Heavy",
                "isHybrid": true,
                "description": "Slow but stubborn"
            },
            {
                "id": 3,
                "name": "Corsair",
                "type": "raider",
                "system": "sol",
                "level": 12,
                "hull": 150,
                "speed": 110,
                "credits": 12000,
                "tier": 2,
                "popular": true
            }
        ],
        "shipTypes": ["fighter", "tank", "raider"]
    })
}

pub fn planets_doc() -> Value {
    json!({
        "planets": [
            {"id": "terra", "name": "Terra", "system": "sol", "level": 1, "type": "rocky"},
            {"id": "kepler", "name": "Kepler Prime", "system": "vega", "level": 30, "type": "gas"},
            {"id": "ruin", "name": "Ruin", "system": "vega", "level": "unknown", "type": "rocky"}
        ]
    })
}
