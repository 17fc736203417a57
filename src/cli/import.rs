use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

use crate::background::store::{self, NewItem};
use crate::config::LoreConfig;

/// Import format: matches export output. `book` in the file is ignored in
/// favour of the target book given on the command line.
#[derive(Debug, Deserialize)]
struct ImportData {
    items: Vec<NewItem>,
}

const BATCH_SIZE: usize = 32;

/// Import items from a JSON file into `book`, embedding each one.
///
/// Creation times in the file are kept so recency weighting survives a move
/// between databases. Items that fail validation are skipped with a warning
/// before anything is sent to the embedding provider.
pub async fn import(config: &LoreConfig, book: &str, file: &Path) -> Result<()> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read import file: {}", file.display()))?;

    let data: ImportData =
        serde_json::from_str(&json).context("failed to parse import JSON")?;

    let conn = crate::db::open_database(config.resolved_db_path())?;
    let provider = super::provider(config)?;

    println!("Importing {} items into '{book}'...", data.items.len());

    let mut imported = 0u64;
    let mut skipped = 0u64;

    let mut valid = Vec::with_capacity(data.items.len());
    for item in data.items {
        match item.validate() {
            Ok(()) => valid.push(item),
            Err(e) => {
                tracing::warn!(error = %e, kind = %item.kind, "skipping import item");
                skipped += 1;
            }
        }
    }

    for chunk in valid.chunks(BATCH_SIZE) {
        let texts: Vec<String> = chunk.iter().map(|i| i.as_item().embedding_text()).collect();
        let batch_provider = Arc::clone(&provider);
        let embeddings = tokio::task::spawn_blocking(move || {
            let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
            batch_provider.embed_batch(&refs)
        })
        .await?
        .context("embedding batch failed")?;

        for (item, embedding) in chunk.iter().zip(embeddings.iter()) {
            let vector = (embedding.as_slice(), provider.model());
            store::store_item(&conn, book, item, Some(vector))?;
            imported += 1;
        }
    }

    println!("Import complete:");
    println!("  Items imported: {imported}");
    if skipped > 0 {
        println!("  Items skipped:  {skipped} (invalid)");
    }

    Ok(())
}
