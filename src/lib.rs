//! Background retrieval for fiction writing.
//!
//! loreseek stores a book's background knowledge (worldview notes, character
//! sheets, and the text of earlier chapters), embeds it through an
//! OpenAI-compatible embedding endpoint, and picks the few items most relevant
//! to whatever the writer is working on so they can be spliced into a
//! language-model prompt.
//!
//! | Type | Weight | Max per lookup | Prompt label |
//! |------|--------|----------------|--------------|
//! | **Worldview** | 1.2 | 2 | `【世界观】` |
//! | **Character** | 1.1 | 2 | `【人物设定】` |
//! | **Chapter** | 1.0 | 1 | `【前情回顾】` |
//!
//! # Architecture
//!
//! - **Storage**: SQLite, one row per item, scoped by book, vectors as f32 blobs
//! - **Embeddings**: remote HTTP provider (`/v1/embeddings` request shape)
//! - **Ranking**: cosine similarity × recency bonus × type weight, adaptive
//!   threshold, per-type quotas, at most five items
//! - **Transport**: CLI, or MCP over stdio / streamable HTTP
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: SQLite database initialization, schema, and migrations
//! - [`embedding`]: Text-to-vector embedding providers
//! - [`background`]: Item types, store, similarity, ranking, and lookup

pub mod background;
pub mod config;
pub mod db;
pub mod embedding;
