use anyhow::Result;
use std::sync::{Arc, Mutex};

use crate::background::search::{search_background, BackgroundLookup};
use crate::config::LoreConfig;

/// Run a background lookup from the terminal and print the context block.
pub async fn search(config: &LoreConfig, book: &str, query: &str, verbose: bool) -> Result<()> {
    let conn = crate::db::open_database(config.resolved_db_path())?;
    let provider = super::provider(config)?;

    let lookup = search_background(
        Arc::new(Mutex::new(conn)),
        provider,
        book.to_string(),
        query.to_string(),
    )
    .await;

    match lookup {
        BackgroundLookup::Found { context, items } => {
            if verbose {
                for (i, s) in items.iter().enumerate() {
                    eprintln!(
                        "  {}. [{}] {} (similarity: {:.4}, score: {:.4})",
                        i + 1,
                        s.item.kind,
                        s.item.id,
                        s.similarity,
                        s.score,
                    );
                }
                eprintln!();
            }
            println!("{context}");
        }
        BackgroundLookup::NoMatch => println!("No relevant background found."),
        BackgroundLookup::Failed { reason } => {
            println!("Background lookup failed: {reason}");
        }
    }

    Ok(())
}
