use anyhow::Result;

use crate::background::store;
use crate::config::LoreConfig;

/// Print every item in a book with a short preview.
pub fn list(config: &LoreConfig, book: &str) -> Result<()> {
    let conn = crate::db::open_database(config.resolved_db_path())?;
    let items = store::list_items(&conn, book)?;

    if items.is_empty() {
        println!("No background stored for book '{book}'.");
        return Ok(());
    }

    println!("{} item(s) in book '{book}'\n", items.len());
    for item in &items {
        let title = item.name.as_deref().unwrap_or("");
        let created = item
            .created_at
            .map(|ts| ts.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".into());
        let marker = if item.embedding.is_some() { "" } else { " (not embedded)" };
        println!("  [{}] {} {} {}{}", item.kind, item.id, created, title, marker);
        println!("     {}", preview(&item.embedding_text(), 60));
    }
    Ok(())
}

/// First `max_chars` characters, with "..." if cut.
fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_cuts_on_char_boundaries() {
        assert_eq!(preview("short", 60), "short");
        assert_eq!(preview("天地玄黄宇宙洪荒", 4), "天地玄黄...");
        assert_eq!(preview("abcd", 4), "abcd");
    }
}
