pub mod background_stats;
pub mod forget_background;
pub mod search_background;
pub mod store_background;

use background_stats::BackgroundStatsParams;
use forget_background::ForgetBackgroundParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use rusqlite::Connection;
use search_background::SearchBackgroundParams;
use std::sync::{Arc, Mutex};
use store_background::StoreBackgroundParams;

use crate::background::search;
use crate::background::store::NewItem;
use crate::background::types::BackgroundKind;
use crate::config::LoreConfig;
use crate::embedding::EmbeddingProvider;

/// The loreseek MCP tool handler. Holds shared state (db connection, embedding
/// provider, config) and exposes all MCP tools via the `#[tool_router]` macro.
#[derive(Clone)]
pub struct LoreTools {
    tool_router: ToolRouter<Self>,
    db: Arc<Mutex<Connection>>,
    embedding: Arc<dyn EmbeddingProvider>,
    config: Arc<LoreConfig>,
}

#[tool_router]
impl LoreTools {
    pub fn new(
        db: Arc<Mutex<Connection>>,
        embedding: Arc<dyn EmbeddingProvider>,
        config: Arc<LoreConfig>,
    ) -> Self {
        Self {
            tool_router: Self::tool_router(),
            db,
            embedding,
            config,
        }
    }

    fn book(&self, requested: Option<String>) -> String {
        requested.unwrap_or_else(|| self.config.storage.default_book.clone())
    }

    /// Find the background most relevant to a passage, formatted for a prompt.
    #[tool(description = "Search a book's worldview notes, character sheets, and previous chapters for background relevant to the query. Returns a ready-to-inject context block, or status no_match/failed when nothing should be injected.")]
    async fn search_background(
        &self,
        Parameters(params): Parameters<SearchBackgroundParams>,
    ) -> Result<String, String> {
        let book = self.book(params.book);
        tracing::info!(book = %book, query_len = params.query.chars().count(), "search_background called");

        let lookup = search::search_background(
            Arc::clone(&self.db),
            Arc::clone(&self.embedding),
            book,
            params.query,
        )
        .await;

        serde_json::to_string(&lookup.summary()).map_err(|e| format!("serialization failed: {e}"))
    }

    /// Embed and store a background item.
    #[tool(description = "Store a background item for a book. Types: worldview (setting/world rules), character (name + description), chapter (previous chapter text).")]
    async fn store_background(
        &self,
        Parameters(params): Parameters<StoreBackgroundParams>,
    ) -> Result<String, String> {
        let kind: BackgroundKind = params.r#type.parse().map_err(|e: String| e)?;
        let book = self.book(params.book);
        let item = NewItem {
            kind,
            content: params.content.unwrap_or_default(),
            name: params.name,
            description: params.description,
            created_at: None,
        };

        tracing::info!(book = %book, kind = %kind, "store_background called");

        let embedding_provider = Arc::clone(&self.embedding);
        let model = self.embedding.model().to_string();
        let text = item.as_item().embedding_text();
        if text.is_empty() {
            return Err("nothing to embed: content (or name and description) required".into());
        }
        let embedding = tokio::task::spawn_blocking(move || embedding_provider.embed(&text))
            .await
            .map_err(|e| format!("embedding task failed: {e}"))?
            .map_err(|e| format!("embedding failed: {e}"))?;

        let db = Arc::clone(&self.db);
        let result = tokio::task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
            let vector = (embedding.as_slice(), model.as_str());
            crate::background::store::store_item(&conn, &book, &item, Some(vector))
        })
        .await
        .map_err(|e| format!("db task failed: {e}"))?
        .map_err(|e| format!("store failed: {e}"))?;

        tracing::info!(id = %result.id, "background item stored");

        serde_json::to_string(&result).map_err(|e| format!("serialization failed: {e}"))
    }

    /// Delete a background item by ID.
    #[tool(description = "Delete a background item by ID.")]
    async fn forget_background(
        &self,
        Parameters(params): Parameters<ForgetBackgroundParams>,
    ) -> Result<String, String> {
        tracing::info!(id = %params.id, "forget_background called");

        let db = Arc::clone(&self.db);
        let id = params.id.clone();
        let deleted = tokio::task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
            crate::background::store::delete_item(&conn, &id)
        })
        .await
        .map_err(|e| format!("db task failed: {e}"))?
        .map_err(|e| format!("delete failed: {e}"))?;

        if !deleted {
            return Err(format!("background item not found: {}", params.id));
        }
        Ok(serde_json::json!({ "id": params.id, "deleted": true }).to_string())
    }

    /// Get statistics about stored background.
    #[tool(description = "Get background store statistics: counts by type, embedded items, and books.")]
    async fn background_stats(
        &self,
        Parameters(params): Parameters<BackgroundStatsParams>,
    ) -> Result<String, String> {
        let db = Arc::clone(&self.db);
        let response = tokio::task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
            crate::background::stats::background_stats(&conn, params.book.as_deref())
        })
        .await
        .map_err(|e| format!("db task failed: {e}"))?
        .map_err(|e| format!("stats failed: {e}"))?;

        serde_json::to_string(&response).map_err(|e| format!("serialization failed: {e}"))
    }
}

#[tool_handler]
impl ServerHandler for LoreTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "loreseek stores a novel's background knowledge. Call search_background with \
                 the passage being written and inject the returned context into your prompt; \
                 use store_background to add worldview notes, characters, and chapters."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
