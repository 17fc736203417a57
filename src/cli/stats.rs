use anyhow::Result;

use crate::background::types::BackgroundKind;
use crate::config::LoreConfig;

/// Display background statistics in the terminal.
pub fn stats(config: &LoreConfig, book: Option<&str>) -> Result<()> {
    let conn = crate::db::open_database(config.resolved_db_path())?;
    let response = crate::background::stats::background_stats(&conn, book)?;

    println!("Background Statistics");
    println!("{}", "=".repeat(40));
    if let Some(book) = book {
        println!("  Book:                {book}");
    }
    println!("  Total items:         {}", response.total_items);
    println!("  Embedded:            {}", response.embedded_items);
    println!();

    println!("By Type:");
    for kind in BackgroundKind::ALL {
        let count = response.by_type.get(kind.as_str()).copied().unwrap_or(0);
        println!("  {:<12} {}", kind.as_str(), count);
    }

    if !response.books.is_empty() {
        println!();
        println!("By Book:");
        for (name, count) in &response.books {
            println!("  {:<20} {}", name, count);
        }
    }
    println!();

    if let Some(ref oldest) = response.oldest_item {
        println!("Oldest item:           {oldest}");
    }
    if let Some(ref newest) = response.newest_item {
        println!("Newest item:           {newest}");
    }

    Ok(())
}
