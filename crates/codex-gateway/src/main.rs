//! Galaxy Codex gateway: JSON read API over the tiered collection cache.

mod routes;

use codex_core::{CodexConfig, CodexContext};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[codex-gateway] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match CodexConfig::load() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    let port = config.port;

    let ctx = match CodexContext::open(config) {
        Ok(ctx) => Arc::new(ctx),
        Err(e) => {
            tracing::error!("Failed to open codex context: {}", e);
            std::process::exit(1);
        }
    };
    let background = ctx.spawn_background_tasks();

    let app = routes::router(Arc::clone(&ctx));
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Codex gateway listening on {}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown requested (Ctrl+C received)");
        }
    }

    if let Some(handle) = background {
        handle.abort();
    }
    if let Err(e) = ctx.store.flush() {
        tracing::warn!("Override store flush on shutdown failed: {}", e);
    }
}
