//! Retrieval boundary: embed the query, read the book, rank, format.
//!
//! Nothing here propagates an error. Failures in the embedding provider or the
//! store are logged and reported as [`BackgroundLookup::Failed`], which callers
//! treat exactly like [`BackgroundLookup::NoMatch`]: the prompt goes out
//! without background context.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use serde::Serialize;

use super::ranking;
use super::store;
use super::types::{BackgroundKind, ScoredItem};
use crate::embedding::EmbeddingProvider;

/// Outcome of one background lookup.
#[derive(Debug, Clone)]
pub enum BackgroundLookup {
    /// At least one item cleared the threshold.
    Found {
        context: String,
        items: Vec<ScoredItem>,
    },
    /// Retrieval worked but nothing was relevant enough.
    NoMatch,
    /// The query could not be embedded or the store could not be read.
    Failed { reason: String },
}

impl BackgroundLookup {
    /// Collapse to the text a prompt assembler should splice in, if any.
    pub fn into_context(self) -> Option<String> {
        match self {
            Self::Found { context, .. } => Some(context),
            Self::NoMatch | Self::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// JSON-friendly view without embeddings.
    pub fn summary(&self) -> LookupSummary {
        match self {
            Self::Found { context, items } => LookupSummary {
                status: "found",
                context: Some(context.clone()),
                items: items.iter().map(RankedEntry::from).collect(),
                reason: None,
            },
            Self::NoMatch => LookupSummary {
                status: "no_match",
                context: None,
                items: Vec::new(),
                reason: None,
            },
            Self::Failed { reason } => LookupSummary {
                status: "failed",
                context: None,
                items: Vec::new(),
                reason: Some(reason.clone()),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LookupSummary {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub items: Vec<RankedEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RankedEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BackgroundKind,
    pub similarity: f64,
    pub score: f64,
}

impl From<&ScoredItem> for RankedEntry {
    fn from(s: &ScoredItem) -> Self {
        Self {
            id: s.item.id.clone(),
            kind: s.item.kind,
            similarity: s.similarity,
            score: s.score,
        }
    }
}

/// Synchronous lookup. Performs a blocking embedding request; do not call on
/// an async executor thread.
pub fn search_relevant_background(
    conn: &Connection,
    provider: &dyn EmbeddingProvider,
    book: &str,
    query_text: &str,
) -> BackgroundLookup {
    let query_embedding = match provider.embed(query_text) {
        Ok(v) => v,
        Err(e) => return failed("embedding the query", e),
    };
    let items = match store::list_items(conn, book) {
        Ok(items) => items,
        Err(e) => return failed("reading the item store", e),
    };
    finish(book, query_text, &query_embedding, &items)
}

/// Async lookup for servers: embedding and store reads run on the blocking pool.
pub async fn search_background(
    db: Arc<Mutex<Connection>>,
    provider: Arc<dyn EmbeddingProvider>,
    book: String,
    query_text: String,
) -> BackgroundLookup {
    let text = query_text.clone();
    let query_embedding = match tokio::task::spawn_blocking(move || provider.embed(&text)).await {
        Ok(Ok(v)) => v,
        Ok(Err(e)) => return failed("embedding the query", e),
        Err(e) => return failed("embedding the query", e.into()),
    };

    let book_for_read = book.clone();
    let items = tokio::task::spawn_blocking(move || {
        let conn = db
            .lock()
            .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
        store::list_items(&conn, &book_for_read)
    })
    .await;
    let items = match items {
        Ok(Ok(items)) => items,
        Ok(Err(e)) => return failed("reading the item store", e),
        Err(e) => return failed("reading the item store", e.into()),
    };

    finish(&book, &query_text, &query_embedding, &items)
}

fn finish(
    book: &str,
    query_text: &str,
    query_embedding: &[f32],
    items: &[super::types::BackgroundItem],
) -> BackgroundLookup {
    let selected = ranking::rank(query_text, query_embedding, items);
    tracing::info!(
        book,
        query_len = query_text.chars().count(),
        candidates = items.len(),
        selected = selected.len(),
        "background lookup"
    );
    match ranking::format_context(&selected) {
        Some(context) => BackgroundLookup::Found {
            context,
            items: selected,
        },
        None => BackgroundLookup::NoMatch,
    }
}

fn failed(stage: &str, error: anyhow::Error) -> BackgroundLookup {
    tracing::warn!(error = %error, "background lookup failed while {stage}");
    BackgroundLookup::Failed {
        reason: format!("{stage}: {error:#}"),
    }
}
