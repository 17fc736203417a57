use anyhow::Result;
use serde::Serialize;

use crate::background::types::BackgroundItem;
use crate::config::LoreConfig;

/// Export format: one book's items, without vectors.
#[derive(Debug, Serialize)]
struct ExportData {
    book: String,
    items: Vec<BackgroundItem>,
}

/// Export all items of a book as JSON to stdout.
///
/// Embeddings are dropped; `import` re-embeds with whatever model is configured.
pub fn export(config: &LoreConfig, book: &str) -> Result<()> {
    let conn = crate::db::open_database(config.resolved_db_path())?;

    let items: Vec<BackgroundItem> = crate::background::store::list_items(&conn, book)?
        .into_iter()
        .map(|item| BackgroundItem {
            embedding: None,
            ..item
        })
        .collect();

    let data = ExportData {
        book: book.to_string(),
        items,
    };

    let json = serde_json::to_string_pretty(&data)?;
    println!("{json}");

    eprintln!("Exported {} items from '{}'.", data.items.len(), data.book);
    Ok(())
}
