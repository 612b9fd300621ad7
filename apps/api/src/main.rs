mod candidates;
mod config;
mod embedding;
mod errors;
mod explain;
mod feedback;
mod llm_client;
mod matching;
mod models;
mod offers;
mod roles;
mod routes;
mod state;
mod store;
mod vector;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::embedding::HashEmbedder;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{postgres, MemStore, PgStore, Store};
use crate::vector::MemVectorStore;

/// Tracing targets carry the crate's module path (`rolematch_api::...`),
/// so the package name's hyphen must become an underscore or the default
/// directive matches nothing and the service logs silently.
fn default_log_directive(level: &str) -> String {
    format!("{}={level}", env!("CARGO_PKG_NAME").replace('-', "_"))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_log_directive(&config.rust_log))),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting RoleMatch API v{}", env!("CARGO_PKG_VERSION"));

    // Pick the store backend: Postgres when DATABASE_URL is set, else
    // the in-memory store for local runs with no infrastructure.
    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let pool = postgres::create_pool(url).await?;
            let pg = PgStore::new(pool);
            pg.init_schema().await?;
            info!("Postgres store initialized");
            Arc::new(pg)
        }
        None => {
            info!("DATABASE_URL not set, using in-memory store");
            Arc::new(MemStore::new())
        }
    };

    let vectors = Arc::new(MemVectorStore::new());
    let embedder = Arc::new(HashEmbedder::new());

    // Initialize LLM client
    let oracle = Arc::new(LlmClient::new(config.anthropic_api_key.clone()));
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Build app state
    let state = AppState {
        store,
        vectors,
        oracle,
        embedder,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_log_directive_uses_the_module_path_target() {
        assert_eq!(default_log_directive("info"), "rolematch_api=info");
        assert_eq!(default_log_directive("debug"), "rolematch_api=debug");
    }
}
