#![allow(dead_code)]

use std::collections::HashMap;

use loreseek::background::store::{self, NewItem};
use loreseek::db;
use loreseek::embedding::EmbeddingProvider;
use rusqlite::Connection;

pub const DIM: usize = 8;

/// Model name the stub provider reports and [`insert`] records.
pub const STUB_MODEL: &str = "stub";

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    db::open_memory_database().unwrap()
}

/// Unit vector along `axis`.
pub fn axis(axis: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; DIM];
    v[axis % DIM] = 1.0;
    v
}

/// Unit vector whose cosine with `axis(0)` is `sim`, leaning towards `axis(1)`.
pub fn at_similarity(sim: f32) -> Vec<f32> {
    let mut v = vec![0.0f32; DIM];
    v[0] = sim;
    v[1] = (1.0 - sim * sim).max(0.0).sqrt();
    v
}

/// Deterministic provider: known texts map to fixed vectors, anything else fails.
pub struct StubProvider {
    vectors: HashMap<String, Vec<f32>>,
}

impl StubProvider {
    pub fn new() -> Self {
        Self {
            vectors: HashMap::new(),
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }
}

impl EmbeddingProvider for StubProvider {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.vectors
            .get(text)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("stub has no vector for {text:?}"))
    }

    fn model(&self) -> &str {
        STUB_MODEL
    }
}

/// Store an item with an explicit vector from [`STUB_MODEL`]. Returns its ID.
pub fn insert(conn: &Connection, book: &str, item: NewItem, embedding: Option<&[f32]>) -> String {
    store::store_item(conn, book, &item, embedding.map(|v| (v, STUB_MODEL)))
        .unwrap()
        .id
}
