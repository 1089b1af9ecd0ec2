//! Codex configuration: defaults, then an optional TOML file, then `CODEX__*` env vars.
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | storage_path | ./data/codex | sled directory of the override store |
//! | remote_base_url | (unset) | base URL of the static documents; unset => read `fixtures_dir` |
//! | fixtures_dir | ./public | root of `data/*.json` when no base URL is configured |
//! | cache_ttl_secs | 300 | lifetime of a resolved collection |
//! | auto_invalidate_secs | 600 | period of the background invalidation (0 disables) |
//! | request_timeout_secs | 10 | HTTP timeout for remote fetches |
//! | port | 8010 | gateway listen port |

use crate::error::CodexResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_PATH_ENV: &str = "CODEX_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/codex";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodexConfig {
    pub storage_path: PathBuf,
    #[serde(default)]
    pub remote_base_url: Option<String>,
    pub fixtures_dir: PathBuf,
    pub cache_ttl_secs: u64,
    pub auto_invalidate_secs: u64,
    pub request_timeout_secs: u64,
    pub port: u16,
}

impl Default for CodexConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("./data/codex"),
            remote_base_url: None,
            fixtures_dir: PathBuf::from("./public"),
            cache_ttl_secs: 300,
            auto_invalidate_secs: 600,
            request_timeout_secs: 10,
            port: 8010,
        }
    }
}

impl CodexConfig {
    /// Load from `CODEX_CONFIG` (or `config/codex.toml`) and the environment.
    pub fn load() -> CodexResult<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path))
    }

    /// Load with an explicit file path; a missing file is skipped.
    pub fn load_from(path: &Path) -> CodexResult<Self> {
        let defaults = Self::default();
        let builder = config::Config::builder()
            .set_default("storage_path", defaults.storage_path.display().to_string())?
            .set_default("fixtures_dir", defaults.fixtures_dir.display().to_string())?
            .set_default("cache_ttl_secs", defaults.cache_ttl_secs as i64)?
            .set_default("auto_invalidate_secs", defaults.auto_invalidate_secs as i64)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs as i64)?
            .set_default("port", i64::from(defaults.port))?;

        let builder = builder.add_source(config::File::from(path).required(false));

        let built = builder
            .add_source(config::Environment::with_prefix("CODEX").separator("__"))
            .build()?;

        Ok(built.try_deserialize()?)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// `None` when background invalidation is disabled.
    pub fn auto_invalidate(&self) -> Option<Duration> {
        (self.auto_invalidate_secs > 0).then(|| Duration::from_secs(self.auto_invalidate_secs))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
