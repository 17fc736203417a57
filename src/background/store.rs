//! Item store: write, read, and delete paths for background items.
//!
//! The store scopes every collection by book. The ranker never filters by book
//! itself: [`list_items`] hands it exactly one book's items.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::types::{BackgroundItem, BackgroundKind};
use super::{bytes_to_embedding, embedding_to_bytes};

/// Input to [`store_item`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewItem {
    #[serde(rename = "type")]
    pub kind: BackgroundKind,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Keep an existing creation time (imports). `None` stamps the current time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl NewItem {
    pub fn new(kind: BackgroundKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            name: None,
            description: None,
            created_at: None,
        }
    }

    pub fn character(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: BackgroundKind::Character,
            content: String::new(),
            name: Some(name.into()),
            description: Some(description.into()),
            created_at: None,
        }
    }

    /// View as a [`BackgroundItem`] (no id, no embedding) for embedding-text purposes.
    pub fn as_item(&self) -> BackgroundItem {
        BackgroundItem {
            id: String::new(),
            kind: self.kind,
            content: self.content.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            embedding: None,
            created_at: self.created_at,
        }
    }

    /// Reject items that would have nothing to embed or display.
    pub fn validate(&self) -> Result<()> {
        let has_sheet = self.name.as_deref().is_some_and(|n| !n.is_empty())
            && self.description.as_deref().is_some_and(|d| !d.is_empty());
        match self.kind {
            BackgroundKind::Character if self.content.is_empty() && !has_sheet => {
                bail!("character needs content, or both name and description")
            }
            BackgroundKind::Worldview | BackgroundKind::Chapter if self.content.is_empty() => {
                bail!("{} content must not be empty", self.kind)
            }
            _ => Ok(()),
        }
    }
}

/// Result returned from a store operation.
#[derive(Debug, Serialize)]
pub struct StoredItem {
    pub id: String,
    pub book: String,
    #[serde(rename = "type")]
    pub kind: BackgroundKind,
    /// `false` when the item was stored without a vector and will not rank.
    pub embedded: bool,
}

const ITEM_COLUMNS: &str = "id, type, content, name, description, embedding, created_at";

/// Insert one item into `book`.
///
/// `embedding` is the vector paired with the name of the model that produced
/// it, so later model changes can be detected per item.
pub fn store_item(
    conn: &Connection,
    book: &str,
    item: &NewItem,
    embedding: Option<(&[f32], &str)>,
) -> Result<StoredItem> {
    item.validate()?;
    if book.is_empty() {
        bail!("book must not be empty");
    }

    let id = uuid::Uuid::now_v7().to_string();
    let now = Utc::now();
    let created_at = item.created_at.unwrap_or(now).to_rfc3339();
    let blob = embedding.map(|(vector, _)| embedding_to_bytes(vector));
    let model = embedding.map(|(_, model)| model);

    conn.execute(
        "INSERT INTO background_items \
         (id, book, type, content, name, description, embedding, embedding_model, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            id,
            book,
            item.kind.as_str(),
            item.content,
            item.name,
            item.description,
            blob,
            model,
            created_at,
            now.to_rfc3339(),
        ],
    )?;

    tracing::debug!(%id, book, kind = %item.kind, embedded = embedding.is_some(), "background item stored");

    Ok(StoredItem {
        id,
        book: book.to_string(),
        kind: item.kind,
        embedded: embedding.is_some(),
    })
}

/// The full, unordered collection for one book.
pub fn list_items(conn: &Connection, book: &str) -> Result<Vec<BackgroundItem>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS} FROM background_items WHERE book = ?1 ORDER BY rowid"
    ))?;
    let items = stmt
        .query_map(params![book], row_to_item)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(items)
}

/// Fetch a single item by ID.
pub fn get_item(conn: &Connection, id: &str) -> Result<Option<BackgroundItem>> {
    let item = conn
        .query_row(
            &format!("SELECT {ITEM_COLUMNS} FROM background_items WHERE id = ?1"),
            params![id],
            row_to_item,
        )
        .optional()?;
    Ok(item)
}

/// Replace an item's embedding and its model. Fails if the item does not exist.
pub fn set_embedding(conn: &Connection, id: &str, embedding: &[f32], model: &str) -> Result<()> {
    let rows = conn.execute(
        "UPDATE background_items SET embedding = ?1, embedding_model = ?2, updated_at = ?3 \
         WHERE id = ?4",
        params![embedding_to_bytes(embedding), model, Utc::now().to_rfc3339(), id],
    )?;
    if rows == 0 {
        bail!("background item not found: {id}");
    }
    Ok(())
}

/// Per book, the number of stored vectors not produced by `model`.
///
/// Vectors with no recorded model count as stale. Books whose vectors all
/// match are absent from the map.
pub fn stale_embeddings(conn: &Connection, model: &str) -> Result<BTreeMap<String, u64>> {
    let mut stmt = conn.prepare(
        "SELECT book, COUNT(*) FROM background_items \
         WHERE embedding IS NOT NULL AND (embedding_model IS NULL OR embedding_model != ?1) \
         GROUP BY book",
    )?;
    let rows = stmt
        .query_map(params![model], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows.into_iter().map(|(book, n)| (book, n as u64)).collect())
}

/// Delete one item. Returns `false` if nothing matched.
pub fn delete_item(conn: &Connection, id: &str) -> Result<bool> {
    let rows = conn.execute("DELETE FROM background_items WHERE id = ?1", params![id])?;
    Ok(rows > 0)
}

/// Delete every item in a book. Returns the number removed.
pub fn delete_book(conn: &Connection, book: &str) -> Result<usize> {
    let rows = conn.execute("DELETE FROM background_items WHERE book = ?1", params![book])?;
    tracing::info!(book, removed = rows, "book cleared");
    Ok(rows)
}

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<BackgroundItem> {
    let kind_str: String = row.get(1)?;
    let kind = kind_str.parse::<BackgroundKind>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, e.into())
    })?;
    let blob: Option<Vec<u8>> = row.get(5)?;
    let created_at: Option<String> = row.get(6)?;

    Ok(BackgroundItem {
        id: row.get(0)?,
        kind,
        content: row.get(2)?,
        name: row.get(3)?,
        description: row.get(4)?,
        embedding: blob.as_deref().and_then(bytes_to_embedding),
        created_at: created_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|ts| ts.with_timezone(&Utc)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn stores_and_lists_items_per_book() {
        let conn = db::open_memory_database().unwrap();
        let a = store_item(
            &conn,
            "book-a",
            &NewItem::new(BackgroundKind::Worldview, "灵气复苏的时代"),
            Some((&[1.0, 0.0][..], "m")),
        )
        .unwrap();
        store_item(
            &conn,
            "book-b",
            &NewItem::new(BackgroundKind::Chapter, "另一本书"),
            None,
        )
        .unwrap();

        assert!(a.embedded);
        let items = list_items(&conn, "book-a").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, a.id);
        assert_eq!(items[0].kind, BackgroundKind::Worldview);
        assert_eq!(items[0].embedding.as_deref(), Some(&[1.0f32, 0.0][..]));
        assert!(items[0].created_at.is_some());
    }

    #[test]
    fn item_without_embedding_reads_back_as_none() {
        let conn = db::open_memory_database().unwrap();
        let stored = store_item(
            &conn,
            "b",
            &NewItem::character("林远", "沉默的剑客"),
            None,
        )
        .unwrap();

        let item = get_item(&conn, &stored.id).unwrap().unwrap();
        assert!(item.embedding.is_none());
        assert_eq!(item.name.as_deref(), Some("林远"));
        assert_eq!(item.content, "");
    }

    #[test]
    fn preserves_supplied_creation_time() {
        let conn = db::open_memory_database().unwrap();
        let ts = DateTime::parse_from_rfc3339("2025-06-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut new = NewItem::new(BackgroundKind::Chapter, "第一章");
        new.created_at = Some(ts);

        let stored = store_item(&conn, "b", &new, None).unwrap();
        let item = get_item(&conn, &stored.id).unwrap().unwrap();
        assert_eq!(item.created_at, Some(ts));
    }

    #[test]
    fn rejects_empty_content() {
        let conn = db::open_memory_database().unwrap();
        assert!(store_item(&conn, "b", &NewItem::new(BackgroundKind::Worldview, ""), None).is_err());
        assert!(store_item(&conn, "b", &NewItem::new(BackgroundKind::Character, ""), None).is_err());
        assert!(store_item(&conn, "", &NewItem::new(BackgroundKind::Chapter, "x"), None).is_err());
    }

    #[test]
    fn set_embedding_and_delete() {
        let conn = db::open_memory_database().unwrap();
        let stored = store_item(
            &conn,
            "b",
            &NewItem::new(BackgroundKind::Worldview, "x"),
            None,
        )
        .unwrap();

        set_embedding(&conn, &stored.id, &[0.5, 0.5], "m").unwrap();
        let item = get_item(&conn, &stored.id).unwrap().unwrap();
        assert_eq!(item.embedding, Some(vec![0.5, 0.5]));

        assert!(set_embedding(&conn, "missing", &[1.0], "m").is_err());
        assert!(delete_item(&conn, &stored.id).unwrap());
        assert!(!delete_item(&conn, &stored.id).unwrap());
    }

    #[test]
    fn delete_book_only_touches_that_book() {
        let conn = db::open_memory_database().unwrap();
        for book in ["a", "a", "b"] {
            store_item(&conn, book, &NewItem::new(BackgroundKind::Chapter, "x"), None).unwrap();
        }
        assert_eq!(delete_book(&conn, "a").unwrap(), 2);
        assert_eq!(list_items(&conn, "b").unwrap().len(), 1);
    }

    #[test]
    fn corrupt_blob_is_treated_as_missing_embedding() {
        let conn = db::open_memory_database().unwrap();
        let stored = store_item(
            &conn,
            "b",
            &NewItem::new(BackgroundKind::Worldview, "x"),
            Some((&[1.0][..], "m")),
        )
        .unwrap();
        conn.execute(
            "UPDATE background_items SET embedding = X'010203' WHERE id = ?1",
            params![stored.id],
        )
        .unwrap();

        let item = get_item(&conn, &stored.id).unwrap().unwrap();
        assert!(item.embedding.is_none());
    }

    #[test]
    fn fresh_store_records_the_model_that_embedded_each_item() {
        let conn = db::open_memory_database().unwrap();
        store_item(
            &conn,
            "b",
            &NewItem::new(BackgroundKind::Worldview, "x"),
            Some((&[1.0][..], "text-embedding-3-small")),
        )
        .unwrap();
        store_item(&conn, "b", &NewItem::new(BackgroundKind::Chapter, "y"), None).unwrap();

        assert!(stale_embeddings(&conn, "text-embedding-3-small").unwrap().is_empty());
        assert_eq!(stale_embeddings(&conn, "BAAI/bge-m3").unwrap()["b"], 1);
    }

    #[test]
    fn re_embedding_one_book_leaves_other_books_stale() {
        let conn = db::open_memory_database().unwrap();
        let a = store_item(
            &conn,
            "a",
            &NewItem::new(BackgroundKind::Worldview, "x"),
            Some((&[1.0][..], "old")),
        )
        .unwrap();
        store_item(
            &conn,
            "b",
            &NewItem::new(BackgroundKind::Worldview, "y"),
            Some((&[1.0][..], "old")),
        )
        .unwrap();

        set_embedding(&conn, &a.id, &[0.5], "new").unwrap();

        let stale = stale_embeddings(&conn, "new").unwrap();
        assert!(!stale.contains_key("a"));
        assert_eq!(stale["b"], 1);
    }

    #[test]
    fn vectors_without_a_recorded_model_count_as_stale() {
        let conn = db::open_memory_database().unwrap();
        let stored = store_item(
            &conn,
            "b",
            &NewItem::new(BackgroundKind::Chapter, "x"),
            Some((&[1.0][..], "m")),
        )
        .unwrap();
        conn.execute(
            "UPDATE background_items SET embedding_model = NULL WHERE id = ?1",
            params![stored.id],
        )
        .unwrap();

        assert_eq!(stale_embeddings(&conn, "m").unwrap()["b"], 1);
    }
}
