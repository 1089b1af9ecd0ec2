//! Process-wide codex context, built once at start-up and passed to callers.

use crate::cache::ResolutionCache;
use crate::config::CodexConfig;
use crate::error::CodexResult;
use crate::query::QueryFacade;
use crate::remote::{FileRemote, HttpRemote, RemoteSource};
use crate::store::OverrideStore;
use std::sync::Arc;

/// Owns the override store, the resolution cache and the query facade.
/// Everything is ready once construction returns.
pub struct CodexContext {
    pub config: CodexConfig,
    pub store: Arc<OverrideStore>,
    pub cache: Arc<ResolutionCache>,
    pub query: QueryFacade,
}

impl CodexContext {
    /// Opens the override store and picks the remote source from `config`.
    pub fn open(config: CodexConfig) -> CodexResult<Self> {
        let store = Arc::new(OverrideStore::open(&config.storage_path)?);
        let remote: Arc<dyn RemoteSource> = match config.remote_base_url.as_deref() {
            Some(url) if !url.trim().is_empty() => Arc::new(HttpRemote::new(url.trim(), config.request_timeout())?),
            _ => Arc::new(FileRemote::new(&config.fixtures_dir)),
        };
        Ok(Self::with_parts(config, store, remote))
    }

    /// Assemble from prebuilt parts (custom remotes, temporary stores).
    pub fn with_parts(config: CodexConfig, store: Arc<OverrideStore>, remote: Arc<dyn RemoteSource>) -> Self {
        let cache = Arc::new(ResolutionCache::with_ttl(Arc::clone(&store), remote, config.cache_ttl()));
        let query = QueryFacade::new(Arc::clone(&cache));
        tracing::info!(
            target: "codex::context",
            storage = %config.storage_path.display(),
            ttl_secs = config.cache_ttl_secs,
            "Codex context ready"
        );
        Self {
            config,
            store,
            cache,
            query,
        }
    }

    /// Start the background invalidation task if enabled in the config.
    pub fn spawn_background_tasks(&self) -> Option<tokio::task::JoinHandle<()>> {
        self.config
            .auto_invalidate()
            .map(|period| self.cache.spawn_auto_invalidate(period))
    }
}
