use anyhow::Result;

use crate::background::store::{self, NewItem};
use crate::config::LoreConfig;

/// Embed and store one background item.
pub async fn add(config: &LoreConfig, book: &str, item: NewItem) -> Result<()> {
    let conn = crate::db::open_database(config.resolved_db_path())?;
    let provider = super::provider(config)?;

    let text = item.as_item().embedding_text();
    anyhow::ensure!(!text.is_empty(), "nothing to embed: provide content, or --name and --description");
    let embedding = super::embed(&provider, &text).await?;

    let vector = (embedding.as_slice(), provider.model());
    let stored = store::store_item(&conn, book, &item, Some(vector))?;
    println!("Stored {} {} in book '{}'", stored.kind, stored.id, stored.book);
    Ok(())
}
