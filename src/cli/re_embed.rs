//! CLI `re-embed` command: regenerate a book's embeddings with the current model.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;

use crate::background::store;
use crate::config::LoreConfig;
use crate::db;

/// Re-embed every item in `book` with the configured model.
pub async fn re_embed(config: &LoreConfig, book: &str) -> Result<()> {
    let conn = db::open_database(config.resolved_db_path()).context("failed to open database")?;
    let provider = super::provider(config)?;

    let items = store::list_items(&conn, book)?;
    let total = items.len();
    if total == 0 {
        println!("No background in '{book}' to re-embed.");
        return Ok(());
    }

    println!("Re-embedding {total} items with model '{}'...", config.embedding.model);

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {bar:40.cyan/blue} {pos}/{len} ({eta})")
            .context("invalid progress template")?
            .progress_chars("##-"),
    );

    const BATCH_SIZE: usize = 32;
    for chunk in items.chunks(BATCH_SIZE) {
        let texts: Vec<String> = chunk.iter().map(|item| item.embedding_text()).collect();
        let batch_provider = Arc::clone(&provider);

        let embeddings = tokio::task::spawn_blocking(move || {
            let text_refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
            batch_provider.embed_batch(&text_refs)
        })
        .await?
        .context("embedding batch failed")?;

        for (item, emb) in chunk.iter().zip(embeddings.iter()) {
            store::set_embedding(&conn, &item.id, emb, provider.model())?;
        }

        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();

    println!("Re-embedded {total} items with model '{}'.", config.embedding.model);
    let stale = store::stale_embeddings(&conn, provider.model())?;
    if !stale.is_empty() {
        let books: Vec<&str> = stale.keys().map(String::as_str).collect();
        println!("Other books still hold vectors from another model: {}", books.join(", "));
    }
    Ok(())
}
