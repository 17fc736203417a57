//! MCP server initialization for stdio and streamable HTTP transports.
//!
//! Provides [`serve_stdio`] and [`serve_http`] entry points that wire up the
//! database, embedding provider, and MCP tool handler into a running server.

use crate::background::store;
use crate::config::LoreConfig;
use crate::db;
use crate::embedding;
use crate::tools::LoreTools;
use anyhow::Result;
use rmcp::ServiceExt;
use std::sync::{Arc, Mutex};

/// Shared setup: open DB, create embedding provider, check stored vectors
/// against the configured model.
fn setup_shared_state(
    config: LoreConfig,
) -> Result<(
    Arc<Mutex<rusqlite::Connection>>,
    Arc<dyn embedding::EmbeddingProvider>,
    Arc<LoreConfig>,
)> {
    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path)?;
    tracing::info!(db = %db_path.display(), "database ready");

    match store::stale_embeddings(&conn, &config.embedding.model) {
        Ok(stale) => {
            for (book, count) in stale {
                tracing::warn!(
                    book = %book,
                    stale = count,
                    configured = %config.embedding.model,
                    "stored vectors come from another embedding model; run `loreseek re-embed` for this book"
                );
            }
        }
        Err(e) => tracing::warn!(error = %e, "could not check stored embedding models"),
    }

    let db = Arc::new(Mutex::new(conn));

    let provider = embedding::create_provider(&config.embedding)?;
    let embedding: Arc<dyn embedding::EmbeddingProvider> = Arc::from(provider);
    tracing::info!(model = %config.embedding.model, "embedding provider ready");

    Ok((db, embedding, Arc::new(config)))
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: LoreConfig) -> Result<()> {
    tracing::info!("starting loreseek MCP server on stdio");

    let (db, embedding, config) = setup_shared_state(config)?;

    let tools = LoreTools::new(db, embedding, config);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}

/// Start the MCP server over streamable HTTP transport.
pub async fn serve_http(config: LoreConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    tracing::info!(addr = %bind_addr, "starting loreseek MCP server on HTTP");

    let (db, embedding, config) = setup_shared_state(config)?;

    let service = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || Ok(LoreTools::new(db.clone(), embedding.clone(), config.clone())),
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );

    let router = axum::Router::new().nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "MCP server listening at http://{bind_addr}/mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}
