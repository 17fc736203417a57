//! CLI `clear` command: delete a whole book after user confirmation.

use anyhow::{bail, Result};
use std::io::Write;

use crate::config::LoreConfig;

/// Delete every item in `book` after the user types the book name back.
pub fn clear(config: &LoreConfig, book: &str) -> Result<()> {
    let db_path = config.resolved_db_path();

    println!("WARNING: This will permanently delete ALL background for book '{book}'.");
    println!("Database: {}", db_path.display());
    print!("\nType the book name to confirm: ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    if input.trim() != book {
        bail!("clear cancelled");
    }

    let conn = crate::db::open_database(&db_path)?;
    let removed = crate::background::store::delete_book(&conn, book)?;

    println!("Deleted {removed} item(s) from '{book}'.");
    Ok(())
}
