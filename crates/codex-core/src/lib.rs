//! Galaxy Codex: core library.
//! Tiered resolution of game entity collections (cache → override store → remote
//! document) and a read-only query facade over them.

pub mod cache;
pub mod collection;
pub mod config;
pub mod context;
pub mod entity;
pub mod error;
pub mod pricing;
pub mod query;
pub mod remote;
pub mod ship;
pub mod store;

pub use cache::{CacheEntryInfo, DataSource, RefreshOutcome, ResolutionCache, ResolvedFrom, DEFAULT_AUTO_INVALIDATE, DEFAULT_TTL};
pub use collection::CollectionKey;
pub use config::CodexConfig;
pub use context::CodexContext;
pub use entity::{Entity, EntityId};
pub use error::{CodexError, CodexResult};
pub use pricing::UpgradeCost;
pub use query::{AttributeComparison, CollectionStats, ComparisonReport, QueryFacade, SearchFilters, Winner};
pub use remote::{FileRemote, HttpRemote, RemoteSource};
pub use ship::{normalize_ship, LegacyShip, NormalizedShip, ShipRecord};
pub use store::OverrideStore;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
