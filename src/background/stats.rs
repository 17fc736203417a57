use anyhow::Result;
use rusqlite::{params, Connection};
use serde::Serialize;
use std::collections::BTreeMap;

use super::types::BackgroundKind;

/// Response from [`background_stats`].
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_items: u64,
    /// Items with an embedding; only these can be ranked.
    pub embedded_items: u64,
    pub by_type: BTreeMap<String, u64>,
    /// Item counts per book. Only populated when no book filter is given.
    pub books: BTreeMap<String, u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_item: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_item: Option<String>,
}

/// Compute store statistics, optionally restricted to one book.
pub fn background_stats(conn: &Connection, book: Option<&str>) -> Result<StatsResponse> {
    let (where_clause, and_clause) = match book {
        Some(_) => ("WHERE book = ?1", "AND book = ?1"),
        None => ("", ""),
    };
    let bind: Vec<&dyn rusqlite::ToSql> = match &book {
        Some(b) => vec![b as &dyn rusqlite::ToSql],
        None => vec![],
    };

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM background_items {where_clause}"),
        bind.as_slice(),
        |row| row.get(0),
    )?;
    let embedded: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM background_items WHERE embedding IS NOT NULL {and_clause}"),
        bind.as_slice(),
        |row| row.get(0),
    )?;

    let mut by_type: BTreeMap<String, u64> = BackgroundKind::ALL
        .iter()
        .map(|k| (k.as_str().to_string(), 0))
        .collect();
    let mut stmt = conn.prepare(&format!(
        "SELECT type, COUNT(*) FROM background_items {where_clause} GROUP BY type"
    ))?;
    let rows = stmt
        .query_map(bind.as_slice(), |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    for (t, count) in rows {
        by_type.insert(t, count as u64);
    }

    let mut books = BTreeMap::new();
    if book.is_none() {
        let mut stmt =
            conn.prepare("SELECT book, COUNT(*) FROM background_items GROUP BY book")?;
        let rows = stmt
            .query_map(params![], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        for (b, count) in rows {
            books.insert(b, count as u64);
        }
    }

    let (oldest, newest): (Option<String>, Option<String>) = conn.query_row(
        &format!("SELECT MIN(created_at), MAX(created_at) FROM background_items {where_clause}"),
        bind.as_slice(),
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    Ok(StatsResponse {
        total_items: total as u64,
        embedded_items: embedded as u64,
        by_type,
        books,
        oldest_item: oldest,
        newest_item: newest,
    })
}
