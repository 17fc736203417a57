pub mod add;
pub mod clear;
pub mod export;
pub mod import;
pub mod list;
pub mod re_embed;
pub mod remove;
pub mod search;
pub mod stats;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::config::LoreConfig;
use crate::embedding::{self, EmbeddingProvider};

/// Build the configured embedding provider behind an `Arc` for `spawn_blocking`.
fn provider(config: &LoreConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let provider = embedding::create_provider(&config.embedding)
        .context("failed to create embedding provider")?;
    Ok(Arc::from(provider))
}

/// Embed one text off the async executor.
async fn embed(provider: &Arc<dyn EmbeddingProvider>, text: &str) -> Result<Vec<f32>> {
    let provider = Arc::clone(provider);
    let text = text.to_string();
    tokio::task::spawn_blocking(move || provider.embed(&text)).await?
}

/// Write a default config file unless one already exists.
pub fn config_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        println!("Config already exists at {} (use --force to overwrite)", path.display());
        return Ok(());
    }
    LoreConfig::default().save_to(path)?;
    println!("Wrote default config to {}", path.display());
    println!("Set embedding.api_key (or LORESEEK_API_KEY) before adding background.");
    Ok(())
}
